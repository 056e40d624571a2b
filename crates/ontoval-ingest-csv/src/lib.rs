//! Tabular ingestion for Ontoval.
//!
//! Reads a CSV (or TSV) file into a [`Dataset`]: the first record is the
//! header, every following record is a data row. Cells are kept verbatim;
//! trimming is the resolver's business, not the loader's.

pub mod dataset;

pub use dataset::{ColumnNotFound, Dataset, DatasetError, Header, Row};

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Field delimiter for a tabular file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Tab,
}

impl Delimiter {
    /// `.tsv` / `.tab` are tab-separated; everything else is treated as CSV.
    pub fn for_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "tsv" | "tab" => Delimiter::Tab,
            _ => Delimiter::Comma,
        }
    }

    fn byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Tab => b'\t',
        }
    }
}

pub fn load_dataset(path: &Path) -> Result<Dataset, DatasetError> {
    let file = File::open(path)?;
    let dataset = load_dataset_from_reader(file, Delimiter::for_path(path))?;
    tracing::debug!(
        path = %path.display(),
        columns = dataset.header().len(),
        rows = dataset.len(),
        "loaded dataset"
    );
    Ok(dataset)
}

pub fn load_dataset_from_reader<R: Read>(
    reader: R,
    delimiter: Delimiter,
) -> Result<Dataset, DatasetError> {
    // `flexible` so ragged rows surface as `RowWidthMismatch` with our row
    // numbering instead of the csv crate's record positions.
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter.byte())
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(DatasetError::EmptyInput);
    }
    let header = Header::new(headers.iter())?;

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Dataset::new(header, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn first_line_is_header_and_rows_keep_order() {
        let text = "id,is_a\nDog,Animal\nDog,Plant\nUnicorn,Animal\n";
        let ds = load_dataset_from_reader(text.as_bytes(), Delimiter::Comma).unwrap();

        assert_eq!(ds.header().columns(), ["id", "is_a"]);
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.rows()[1].cell("is_a").unwrap(), "Plant");
        assert_eq!(ds.rows()[2].cell("id").unwrap(), "Unicorn");
    }

    #[test]
    fn header_only_input_is_an_empty_dataset() {
        let ds = load_dataset_from_reader("id,is_a\n".as_bytes(), Delimiter::Comma).unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.header().len(), 2);
    }

    #[test]
    fn empty_input_has_no_header() {
        let err = load_dataset_from_reader("".as_bytes(), Delimiter::Comma).unwrap_err();
        assert!(matches!(err, DatasetError::EmptyInput));
    }

    #[test]
    fn quoted_cells_keep_commas_and_whitespace() {
        let text = "id,is_a\n\"Dog, domestic\",\" Animal \"\n";
        let ds = load_dataset_from_reader(text.as_bytes(), Delimiter::Comma).unwrap();
        assert_eq!(ds.rows()[0].cell("id").unwrap(), "Dog, domestic");
        assert_eq!(ds.rows()[0].cell("is_a").unwrap(), " Animal ");
    }

    #[test]
    fn ragged_csv_is_rejected() {
        let text = "a,b\n1,2\n3\n";
        let err = load_dataset_from_reader(text.as_bytes(), Delimiter::Comma).unwrap_err();
        assert!(matches!(err, DatasetError::RowWidthMismatch { row: 2, .. }));
    }

    #[test]
    fn tsv_files_are_tab_separated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.tsv");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "label\tparent").unwrap();
        writeln!(f, "Dog, domestic\tAnimal").unwrap();
        drop(f);

        let ds = load_dataset(&path).unwrap();
        assert_eq!(ds.rows()[0].cell("label").unwrap(), "Dog, domestic");
        assert_eq!(ds.rows()[0].cell("parent").unwrap(), "Animal");
    }
}
