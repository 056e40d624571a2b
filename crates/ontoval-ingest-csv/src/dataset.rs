//! Row model: a shared header plus ordered rows of string cells.
//!
//! A `Dataset` is immutable once built. Every row holds exactly as many cells
//! as the header has columns, and column lookup is an exact, case-sensitive
//! match on the header captured at load time.

use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("column `{column}` not found in header (available: {})", .available.join(", "))]
pub struct ColumnNotFound {
    pub column: String,
    pub available: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("input has no header row")]
    EmptyInput,
    #[error("duplicate column `{0}` in header")]
    DuplicateColumn(String),
    #[error("row {row}: expected {expected} cells, found {found}")]
    RowWidthMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Ordered, unique column names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    columns: Vec<String>,
    index: HashMap<String, usize>,
}

impl Header {
    pub fn new<I, S>(columns: I) -> Result<Self, DatasetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(DatasetError::DuplicateColumn(name.clone()));
            }
        }
        Ok(Self { columns, index })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, column: &str) -> Result<usize, ColumnNotFound> {
        self.index
            .get(column)
            .copied()
            .ok_or_else(|| ColumnNotFound {
                column: column.to_string(),
                available: self.columns.clone(),
            })
    }
}

/// One data record. `number` is the 1-based data-row number (the header is
/// not counted).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    number: usize,
    cells: Vec<String>,
    header: Arc<Header>,
}

impl Row {
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    pub fn cell(&self, column: &str) -> Result<&str, ColumnNotFound> {
        let idx = self.header.position(column)?;
        Ok(self.cells[idx].as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    header: Arc<Header>,
    rows: Vec<Row>,
}

impl Dataset {
    /// Build a dataset, rejecting any row whose width differs from the header.
    pub fn new<R, C>(header: Header, rows: R) -> Result<Self, DatasetError>
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = String>,
    {
        let header = Arc::new(header);
        let mut out = Vec::new();
        for (i, cells) in rows.into_iter().enumerate() {
            let cells: Vec<String> = cells.into_iter().collect();
            let number = i + 1;
            if cells.len() != header.len() {
                return Err(DatasetError::RowWidthMismatch {
                    row: number,
                    expected: header.len(),
                    found: cells.len(),
                });
            }
            out.push(Row {
                number,
                cells,
                header: Arc::clone(&header),
            });
        }
        Ok(Self { header, rows: out })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn cell_lookup_is_exact_and_case_sensitive() {
        let header = Header::new(["id", "is_a"]).unwrap();
        let ds = Dataset::new(header, vec![cells(&["Dog", "Animal"])]).unwrap();
        let row = &ds.rows()[0];

        assert_eq!(row.cell("id").unwrap(), "Dog");
        assert_eq!(row.cell("is_a").unwrap(), "Animal");

        let err = row.cell("ID").unwrap_err();
        assert_eq!(err.column, "ID");
        assert_eq!(err.available, vec!["id".to_string(), "is_a".to_string()]);
    }

    #[test]
    fn duplicate_header_columns_are_rejected() {
        let err = Header::new(["a", "b", "a"]).unwrap_err();
        assert!(matches!(err, DatasetError::DuplicateColumn(c) if c == "a"));
    }

    #[test]
    fn ragged_rows_are_rejected_with_row_number() {
        let header = Header::new(["a", "b"]).unwrap();
        let err = Dataset::new(
            header,
            vec![cells(&["1", "2"]), cells(&["3"])],
        )
        .unwrap_err();
        match err {
            DatasetError::RowWidthMismatch {
                row,
                expected,
                found,
            } => {
                assert_eq!((row, expected, found), (2, 2, 1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rows_are_numbered_in_order() {
        let header = Header::new(["a"]).unwrap();
        let ds = Dataset::new(header, vec![cells(&["x"]), cells(&["y"]), cells(&["z"])]).unwrap();
        let numbers: Vec<usize> = ds.rows().iter().map(Row::number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }
}
