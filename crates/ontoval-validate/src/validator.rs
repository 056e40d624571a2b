//! Per-row validation: resolve both cells, then ask the oracle.

use ontoval_ingest_csv::Row;
use serde::Serialize;
use std::fmt;

use crate::entity::Entity;
use crate::oracle::SubsumptionOracle;
use crate::resolve::{Resolve, ResolutionError};
use crate::ValidateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellSide {
    Value,
    Ancestor,
}

impl fmt::Display for CellSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellSide::Value => f.write_str("value"),
            CellSide::Ancestor => f.write_str("ancestor"),
        }
    }
}

/// `Unresolvable` only when a cell failed to resolve; `Valid`/`Invalid`
/// only when both resolved and the oracle answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum RowVerdict {
    Valid,
    Invalid,
    Unresolvable {
        side: CellSide,
        error: ResolutionError,
    },
}

impl RowVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, RowVerdict::Valid)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RowVerdict::Valid => "valid",
            RowVerdict::Invalid => "invalid",
            RowVerdict::Unresolvable { .. } => "unresolvable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowResult {
    /// 1-based data-row number.
    pub row: usize,
    pub value: String,
    pub ancestor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_iri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ancestor_iri: Option<String>,
    #[serde(flatten)]
    pub verdict: RowVerdict,
    pub message: String,
}

pub struct RowValidator<'a> {
    resolver: &'a dyn Resolve,
    oracle: &'a dyn SubsumptionOracle,
    value_column: &'a str,
    ancestor_column: &'a str,
}

impl<'a> RowValidator<'a> {
    pub fn new(
        resolver: &'a dyn Resolve,
        oracle: &'a dyn SubsumptionOracle,
        value_column: &'a str,
        ancestor_column: &'a str,
    ) -> Self {
        Self {
            resolver,
            oracle,
            value_column,
            ancestor_column,
        }
    }

    /// Missing columns and oracle failures are errors; unresolvable cells
    /// are a verdict.
    pub fn validate(&self, row: &Row) -> Result<RowResult, ValidateError> {
        let value = row.cell(self.value_column)?;
        let ancestor = row.cell(self.ancestor_column)?;

        let mut result = RowResult {
            row: row.number(),
            value: value.to_string(),
            ancestor: ancestor.to_string(),
            value_iri: None,
            ancestor_iri: None,
            verdict: RowVerdict::Valid,
            message: String::new(),
        };

        let value_entity = match self.resolver.resolve(value) {
            Ok(entity) => entity,
            Err(error) => return Ok(unresolvable(result, CellSide::Value, error)),
        };
        result.value_iri = Some(value_entity.iri.clone());

        let ancestor_entity = match self.resolver.resolve(ancestor) {
            Ok(entity) => entity,
            Err(error) => return Ok(unresolvable(result, CellSide::Ancestor, error)),
        };
        result.ancestor_iri = Some(ancestor_entity.iri.clone());

        let subsumed = self
            .oracle
            .is_subsumed_by(&value_entity, &ancestor_entity)
            .map_err(|source| ValidateError::Oracle {
                row: row.number(),
                source,
            })?;

        if subsumed {
            result.message = single_line(&format!(
                "'{}' {} is a descendant of '{}' {}",
                result.value.trim(),
                value_entity,
                result.ancestor.trim(),
                ancestor_entity
            ));
        } else {
            result.verdict = RowVerdict::Invalid;
            result.message = describe_invalid(&result, &value_entity, &ancestor_entity);
        }

        tracing::debug!(
            row = result.row,
            verdict = result.verdict.as_str(),
            value = %value_entity,
            ancestor = %ancestor_entity,
            "validated row"
        );
        Ok(result)
    }
}

fn describe_invalid(result: &RowResult, value: &Entity, ancestor: &Entity) -> String {
    single_line(&format!(
        "'{}' {} is not a descendant of '{}' {}",
        result.value.trim(),
        value,
        result.ancestor.trim(),
        ancestor
    ))
}

/// Messages are one report line each: control characters in cell text
/// (a quoted CSV cell may span lines) are written as escapes.
fn single_line(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    for c in message.chars() {
        if c.is_control() {
            out.extend(c.escape_default());
        } else {
            out.push(c);
        }
    }
    out
}

fn unresolvable(mut result: RowResult, side: CellSide, error: ResolutionError) -> RowResult {
    let text = match side {
        CellSide::Value => &result.value,
        CellSide::Ancestor => &result.ancestor,
    };
    result.message = single_line(&format!(
        "could not resolve {side} '{}': {error}",
        text.trim()
    ));
    tracing::debug!(
        row = result.row,
        side = %side,
        error = %error,
        "unresolvable cell"
    );
    result.verdict = RowVerdict::Unresolvable { side, error };
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{OracleError, ToldHierarchyOracle};
    use crate::resolve::EntityResolver;
    use ontoval_ingest_csv::{Dataset, Header};
    use ontoval_ingest_rdfowl::Ontology;

    const EX: &str = "http://example.org/";

    fn ex(local: &str) -> String {
        format!("{EX}{local}")
    }

    fn pets() -> Ontology {
        Ontology::builder()
            .subclass_of(&ex("Dog"), &ex("Animal"))
            .class(&ex("Plant"))
            .label(&ex("Dog"), "Dog")
            .label(&ex("Animal"), "Animal")
            .label(&ex("Plant"), "Plant")
            .class(&ex("Seal"))
            .class(&ex("SealStamp"))
            .label(&ex("Seal"), "seal")
            .label(&ex("SealStamp"), "seal")
            .build()
    }

    fn dataset(rows: &[[&str; 2]]) -> Dataset {
        let header = Header::new(["id", "is_a"]).unwrap();
        Dataset::new(
            header,
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect::<Vec<_>>()),
        )
        .unwrap()
    }

    fn validate_one(row: [&str; 2]) -> Result<RowResult, ValidateError> {
        let ontology = pets();
        let resolver = EntityResolver::new(&ontology);
        let oracle = ToldHierarchyOracle::new(&ontology);
        let validator = RowValidator::new(&resolver, &oracle, "id", "is_a");
        let ds = dataset(&[row]);
        validator.validate(&ds.rows()[0])
    }

    #[test]
    fn descendant_is_valid() {
        let result = validate_one(["Dog", "Animal"]).unwrap();
        assert_eq!(result.verdict, RowVerdict::Valid);
        assert_eq!(result.value_iri.as_deref(), Some(ex("Dog").as_str()));
        assert_eq!(result.ancestor_iri.as_deref(), Some(ex("Animal").as_str()));
    }

    #[test]
    fn self_is_valid() {
        let result = validate_one([" Dog", "Dog "]).unwrap();
        assert!(result.verdict.is_valid());
    }

    #[test]
    fn non_descendant_is_invalid_and_names_both_sides() {
        let result = validate_one(["Dog", "Plant"]).unwrap();
        assert_eq!(result.verdict, RowVerdict::Invalid);
        assert!(result.message.contains("'Dog'"));
        assert!(result.message.contains("'Plant'"));
        assert!(result.message.contains("is not a descendant of"));
    }

    #[test]
    fn unknown_value_is_unresolvable() {
        let result = validate_one(["Unicorn", "Animal"]).unwrap();
        assert_eq!(
            result.verdict,
            RowVerdict::Unresolvable {
                side: CellSide::Value,
                error: ResolutionError::NotFound {
                    text: "Unicorn".to_string()
                },
            }
        );
        assert!(result.message.contains("value 'Unicorn'"));
        assert_eq!(result.value_iri, None);
    }

    #[test]
    fn unknown_ancestor_is_unresolvable() {
        let result = validate_one(["Dog", ""]).unwrap();
        assert_eq!(
            result.verdict,
            RowVerdict::Unresolvable {
                side: CellSide::Ancestor,
                error: ResolutionError::Empty,
            }
        );
        assert!(result.value_iri.is_some());
    }

    #[test]
    fn ambiguous_ancestor_is_unresolvable_and_names_the_side() {
        let result = validate_one(["Dog", "seal"]).unwrap();
        assert_eq!(
            result.verdict,
            RowVerdict::Unresolvable {
                side: CellSide::Ancestor,
                error: ResolutionError::AmbiguousEntity {
                    text: "seal".to_string(),
                    candidates: vec![ex("Seal"), ex("SealStamp")],
                },
            }
        );
        assert!(result.message.starts_with("could not resolve ancestor 'seal'"));
        assert!(result.message.contains("is ambiguous"));
        assert!(result.message.contains(&ex("SealStamp")));
    }

    #[test]
    fn multi_line_cells_give_single_line_messages() {
        let result = validate_one(["Uni\ncorn", "Animal"]).unwrap();
        assert!(matches!(result.verdict, RowVerdict::Unresolvable { .. }));
        assert_eq!(result.value, "Uni\ncorn");
        assert!(!result.message.contains('\n'), "{}", result.message);
        assert!(result.message.contains("Uni\\ncorn"));

        let result = validate_one(["Dog", "Pla\tnt"]).unwrap();
        assert!(!result.message.contains('\t'));
    }

    #[test]
    fn missing_column_is_fatal() {
        let ontology = pets();
        let resolver = EntityResolver::new(&ontology);
        let oracle = ToldHierarchyOracle::new(&ontology);
        let validator = RowValidator::new(&resolver, &oracle, "id", "parent");
        let ds = dataset(&[["Dog", "Animal"]]);
        let err = validator.validate(&ds.rows()[0]).unwrap_err();
        assert!(matches!(err, ValidateError::ColumnNotFound(c) if c.column == "parent"));
    }

    struct BrokenOracle;

    impl SubsumptionOracle for BrokenOracle {
        fn name(&self) -> &str {
            "broken"
        }

        fn is_subsumed_by(&self, _sub: &Entity, _sup: &Entity) -> Result<bool, OracleError> {
            Err(OracleError::Failed {
                oracle: "broken".to_string(),
                message: "reasoner crashed".to_string(),
            })
        }
    }

    #[test]
    fn oracle_failure_is_not_an_invalid_row() {
        let ontology = pets();
        let resolver = EntityResolver::new(&ontology);
        let validator = RowValidator::new(&resolver, &BrokenOracle, "id", "is_a");
        let ds = dataset(&[["Dog", "Animal"]]);
        let err = validator.validate(&ds.rows()[0]).unwrap_err();
        assert!(matches!(err, ValidateError::Oracle { row: 1, .. }));
    }
}
