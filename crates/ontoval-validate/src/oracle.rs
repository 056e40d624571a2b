//! Subsumption queries over a classified ontology.
//!
//! Validation only needs one question answered: is `sub` classified under
//! `sup`? [`SubsumptionOracle`] is that contract. [`ToldHierarchyOracle`]
//! answers it from the told class hierarchy (named `SubClassOf` and
//! `EquivalentClasses` axioms plus class assertions); a full DL reasoner can
//! be plugged in behind the same trait.

use ontoval_ingest_rdfowl::owl::OWL_THING_IRI;
use ontoval_ingest_rdfowl::{Ontology, OwlAxiom};
use std::collections::{HashMap, HashSet};

use crate::entity::{Entity, EntityKind};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("{0} is not part of the classified ontology")]
    UnknownEntity(Entity),
    #[error("{oracle} failed: {message}")]
    Failed { oracle: String, message: String },
}

/// Read-only subsumption queries. Implementations must tolerate concurrent
/// calls from several rows.
pub trait SubsumptionOracle: Sync {
    fn name(&self) -> &str;

    /// Whether `sub` is (reflexively, transitively) subsumed by `sup`.
    fn is_subsumed_by(&self, sub: &Entity, sup: &Entity) -> Result<bool, OracleError>;
}

pub struct ToldHierarchyOracle {
    /// Reflexive-transitive superclasses of every class, `owl:Thing` included.
    supers_of: HashMap<String, HashSet<String>>,
    types_of: HashMap<String, Vec<String>>,
}

impl ToldHierarchyOracle {
    pub fn new(ontology: &Ontology) -> Self {
        let mut direct_supers: HashMap<&str, Vec<&str>> = HashMap::new();
        for axiom in ontology.axioms() {
            match axiom {
                OwlAxiom::SubClassOf { sub, super_class } => {
                    direct_supers
                        .entry(sub.as_str())
                        .or_default()
                        .push(super_class.as_str());
                }
                OwlAxiom::EquivalentClasses { first, second } => {
                    direct_supers
                        .entry(first.as_str())
                        .or_default()
                        .push(second.as_str());
                    direct_supers
                        .entry(second.as_str())
                        .or_default()
                        .push(first.as_str());
                }
                OwlAxiom::ClassAssertion { .. } => {}
            }
        }

        let mut supers_of: HashMap<String, HashSet<String>> = HashMap::new();
        for class in ontology.classes() {
            let mut supers = HashSet::new();
            supers.insert(class.iri.clone());
            supers.insert(OWL_THING_IRI.to_string());
            let mut stack: Vec<&str> = direct_supers
                .get(class.iri.as_str())
                .cloned()
                .unwrap_or_default();
            while let Some(sup) = stack.pop() {
                if supers.insert(sup.to_string()) {
                    if let Some(next) = direct_supers.get(sup) {
                        stack.extend(next.iter().copied());
                    }
                }
            }
            supers_of.insert(class.iri.clone(), supers);
        }

        let types_of = ontology
            .individuals()
            .map(|ind| (ind.iri.clone(), ind.types.clone()))
            .collect();

        tracing::debug!(
            classes = supers_of.len(),
            individuals = ontology.individuals().count(),
            "classified told hierarchy"
        );

        Self {
            supers_of,
            types_of,
        }
    }

    fn ensure_known(&self, entity: &Entity) -> Result<(), OracleError> {
        let known = match entity.kind {
            EntityKind::Class => self.supers_of.contains_key(&entity.iri),
            EntityKind::Individual => self.types_of.contains_key(&entity.iri),
        };
        if known {
            Ok(())
        } else {
            Err(OracleError::UnknownEntity(entity.clone()))
        }
    }

    fn class_is_subsumed_by(&self, sub: &str, sup: &str) -> bool {
        self.supers_of
            .get(sub)
            .map(|s| s.contains(sup))
            .unwrap_or(sub == sup)
    }
}

impl SubsumptionOracle for ToldHierarchyOracle {
    fn name(&self) -> &str {
        "told-hierarchy"
    }

    fn is_subsumed_by(&self, sub: &Entity, sup: &Entity) -> Result<bool, OracleError> {
        self.ensure_known(sub)?;
        self.ensure_known(sup)?;

        if sub == sup {
            return Ok(true);
        }

        Ok(match (sub.kind, sup.kind) {
            (_, EntityKind::Individual) => false,
            (EntityKind::Class, EntityKind::Class) => self.class_is_subsumed_by(&sub.iri, &sup.iri),
            (EntityKind::Individual, EntityKind::Class) => {
                sup.iri == OWL_THING_IRI
                    || self.types_of.get(&sub.iri).is_some_and(|types| {
                        types
                            .iter()
                            .any(|ty| self.class_is_subsumed_by(ty, &sup.iri))
                    })
            }
        })
    }
}
