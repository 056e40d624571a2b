//! Validation report and its renderings.

use serde::Serialize;

use crate::validator::{RowResult, RowVerdict};

pub const REPORT_VERSION: &str = "ontoval_validation_report_v1";

pub const VALID_VERDICT_LINE: &str = "The input was valid!";
pub const INVALID_VERDICT_LINE: &str = "Argh! The input was not valid!";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub rows: usize,
    pub valid: usize,
    pub invalid: usize,
    pub unresolvable: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub version: String,
    pub oracle: String,
    pub value_column: String,
    pub ancestor_column: String,
    pub summary: ReportSummary,
    /// Every row, in dataset order.
    pub rows: Vec<RowResult>,
    /// True iff every row is `Valid`.
    pub valid: bool,
}

impl ValidationReport {
    pub fn new(
        oracle: &str,
        value_column: &str,
        ancestor_column: &str,
        rows: Vec<RowResult>,
    ) -> Self {
        let mut summary = ReportSummary {
            rows: rows.len(),
            ..ReportSummary::default()
        };
        for r in &rows {
            match r.verdict {
                RowVerdict::Valid => summary.valid += 1,
                RowVerdict::Invalid => summary.invalid += 1,
                RowVerdict::Unresolvable { .. } => summary.unresolvable += 1,
            }
        }
        let valid = summary.valid == summary.rows;

        Self {
            version: REPORT_VERSION.to_string(),
            oracle: oracle.to_string(),
            value_column: value_column.to_string(),
            ancestor_column: ancestor_column.to_string(),
            summary,
            rows,
            valid,
        }
    }

    /// Rows that are not `Valid`, in dataset order.
    pub fn failures(&self) -> impl Iterator<Item = &RowResult> {
        self.rows.iter().filter(|r| !r.verdict.is_valid())
    }
}

pub fn verdict_line(valid: bool) -> &'static str {
    if valid {
        VALID_VERDICT_LINE
    } else {
        INVALID_VERDICT_LINE
    }
}

/// One line per failing row, then a summary line.
pub fn render_report_text(report: &ValidationReport) -> String {
    let mut out = String::new();
    for r in report.failures() {
        out.push_str(&format!(
            "row {}: {}: {}\n",
            r.row,
            r.verdict.as_str(),
            r.message
        ));
    }
    let s = &report.summary;
    out.push_str(&format!(
        "checked {} rows ({} against {}): valid={} invalid={} unresolvable={}\n",
        s.rows, report.value_column, report.ancestor_column, s.valid, s.invalid, s.unresolvable
    ));
    out
}

pub fn render_report_json(report: &ValidationReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}
