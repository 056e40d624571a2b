//! Ontology ancestry validation for tabular data.
//!
//! For every row of a [`Dataset`], the cell in the *value* column must name
//! an entity classified under the entity named in the *ancestor* column:
//!
//! 1. both cells are resolved to ontology entities ([`resolve`]),
//! 2. the [`SubsumptionOracle`] is asked whether value ⊑ ancestor,
//! 3. each row gets a [`RowVerdict`]; the dataset is valid iff every row is.
//!
//! Every row is evaluated (no fail-fast) and reported in dataset order.
//! Configuration problems (a missing column) and oracle failures abort the
//! run; unresolvable cells are row verdicts.

pub mod entity;
pub mod oracle;
pub mod report;
pub mod resolve;
pub mod validator;

pub use entity::{Entity, EntityKind};
pub use oracle::{OracleError, SubsumptionOracle, ToldHierarchyOracle};
pub use report::{
    render_report_json, render_report_text, verdict_line, ReportSummary, ValidationReport,
};
pub use resolve::{CachingResolver, EntityResolver, Resolve, ResolutionError};
pub use validator::{CellSide, RowResult, RowValidator, RowVerdict};

use ontoval_ingest_csv::{ColumnNotFound, Dataset};
use ontoval_ingest_rdfowl::Ontology;
use rayon::prelude::*;

#[derive(Debug, thiserror::Error)]
pub enum ValidateError {
    #[error(transparent)]
    ColumnNotFound(#[from] ColumnNotFound),
    #[error("row {row}: subsumption query failed: {source}")]
    Oracle {
        row: usize,
        #[source]
        source: OracleError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Validate rows on the rayon pool. Report order is unaffected.
    pub parallel: bool,
    /// Memoise cell resolutions across rows.
    pub cache_resolutions: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            parallel: false,
            cache_resolutions: true,
        }
    }
}

/// Validate `dataset` against the told hierarchy of `ontology`.
pub fn run(
    dataset: &Dataset,
    ontology: &Ontology,
    value_column: &str,
    ancestor_column: &str,
) -> Result<ValidationReport, ValidateError> {
    let oracle = ToldHierarchyOracle::new(ontology);
    run_with_oracle(
        dataset,
        ontology,
        &oracle,
        value_column,
        ancestor_column,
        ValidateOptions::default(),
    )
}

pub fn run_with_oracle(
    dataset: &Dataset,
    ontology: &Ontology,
    oracle: &dyn SubsumptionOracle,
    value_column: &str,
    ancestor_column: &str,
    options: ValidateOptions,
) -> Result<ValidationReport, ValidateError> {
    // Checked against the header so a bad column fails even with zero rows.
    dataset.header().position(value_column)?;
    dataset.header().position(ancestor_column)?;

    let plain;
    let caching;
    let resolver: &dyn Resolve = if options.cache_resolutions {
        caching = CachingResolver::new(EntityResolver::new(ontology));
        &caching
    } else {
        plain = EntityResolver::new(ontology);
        &plain
    };

    let validator = RowValidator::new(resolver, oracle, value_column, ancestor_column);
    let rows: Vec<RowResult> = if options.parallel {
        dataset
            .rows()
            .par_iter()
            .map(|row| validator.validate(row))
            .collect::<Result<_, _>>()?
    } else {
        dataset
            .rows()
            .iter()
            .map(|row| validator.validate(row))
            .collect::<Result<_, _>>()?
    };

    let report = ValidationReport::new(oracle.name(), value_column, ancestor_column, rows);
    tracing::info!(
        oracle = oracle.name(),
        rows = report.summary.rows,
        invalid = report.summary.invalid,
        unresolvable = report.summary.unresolvable,
        valid = report.valid,
        "validation finished"
    );
    Ok(report)
}
