//! OWL ontology model.
//!
//! This is the named-entity view of an ontology that row validation needs:
//! classes, named individuals, their display labels and the told axioms
//! between them (`SubClassOf`, `EquivalentClasses`, `ClassAssertion`).
//! Anonymous class expressions are not represented, except that the named
//! conjuncts of an `owl:intersectionOf` become told superclasses of the
//! class defined by it.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::rdf::{RdfNode, RdfObject, RdfStatement};

pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const OWL_NS: &str = "http://www.w3.org/2002/07/owl#";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";
pub const SKOS_NS: &str = "http://www.w3.org/2004/02/skos/core#";
pub const OBO_NS: &str = "http://purl.obolibrary.org/obo/";

pub const RDF_TYPE_IRI: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDFS_SUBCLASS_OF_IRI: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
pub const RDFS_LABEL_IRI: &str = "http://www.w3.org/2000/01/rdf-schema#label";
pub const RDFS_CLASS_IRI: &str = "http://www.w3.org/2000/01/rdf-schema#Class";
pub const SKOS_PREF_LABEL_IRI: &str = "http://www.w3.org/2004/02/skos/core#prefLabel";
pub const OWL_CLASS_IRI: &str = "http://www.w3.org/2002/07/owl#Class";
pub const OWL_THING_IRI: &str = "http://www.w3.org/2002/07/owl#Thing";
pub const OWL_NAMED_INDIVIDUAL_IRI: &str = "http://www.w3.org/2002/07/owl#NamedIndividual";
pub const OWL_ONTOLOGY_IRI: &str = "http://www.w3.org/2002/07/owl#Ontology";
pub const OWL_EQUIVALENT_CLASS_IRI: &str = "http://www.w3.org/2002/07/owl#equivalentClass";
pub const OWL_INTERSECTION_OF_IRI: &str = "http://www.w3.org/2002/07/owl#intersectionOf";
pub const RDF_FIRST_IRI: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
pub const RDF_REST_IRI: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";

#[derive(Debug, thiserror::Error)]
pub enum OwlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwlClass {
    pub iri: String,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwlIndividual {
    pub iri: String,
    pub labels: Vec<String>,
    pub types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwlAxiom {
    SubClassOf { sub: String, super_class: String },
    EquivalentClasses { first: String, second: String },
    ClassAssertion { individual: String, class: String },
}

/// A loaded ontology. Immutable once built; validation only borrows it.
#[derive(Debug, Clone, Default)]
pub struct Ontology {
    pub iri: Option<String>,
    classes: BTreeMap<String, OwlClass>,
    individuals: BTreeMap<String, OwlIndividual>,
    axioms: Vec<OwlAxiom>,
    prefixes: BTreeMap<String, String>,
}

impl Ontology {
    pub fn builder() -> OntologyBuilder {
        OntologyBuilder::default()
    }

    pub fn classes(&self) -> impl Iterator<Item = &OwlClass> {
        self.classes.values()
    }

    pub fn individuals(&self) -> impl Iterator<Item = &OwlIndividual> {
        self.individuals.values()
    }

    pub fn axioms(&self) -> &[OwlAxiom] {
        &self.axioms
    }

    pub fn class(&self, iri: &str) -> Option<&OwlClass> {
        self.classes.get(iri)
    }

    pub fn individual(&self, iri: &str) -> Option<&OwlIndividual> {
        self.individuals.get(iri)
    }

    pub fn prefixes(&self) -> &BTreeMap<String, String> {
        &self.prefixes
    }

    /// Adds or replaces a CURIE prefix.
    pub fn with_prefix(mut self, prefix: &str, namespace: &str) -> Self {
        self.prefixes
            .insert(prefix.to_string(), namespace.to_string());
        self
    }

    /// Expand `prefix:local` through the prefix map.
    pub fn expand_curie(&self, curie: &str) -> Option<String> {
        let (prefix, local) = curie.split_once(':')?;
        self.prefixes
            .get(prefix)
            .map(|namespace| format!("{namespace}{local}"))
    }
}

fn default_prefixes() -> BTreeMap<String, String> {
    [
        ("rdf", RDF_NS),
        ("rdfs", RDFS_NS),
        ("owl", OWL_NS),
        ("xsd", XSD_NS),
        ("skos", SKOS_NS),
        ("obo", OBO_NS),
    ]
    .into_iter()
    .map(|(p, ns)| (p.to_string(), ns.to_string()))
    .collect()
}

fn is_vocabulary_iri(iri: &str) -> bool {
    [RDF_NS, RDFS_NS, OWL_NS, XSD_NS]
        .iter()
        .any(|ns| iri.starts_with(ns))
}

/// Collects declarations and axioms, then resolves them into an [`Ontology`].
///
/// Labels and type assertions may arrive before the declaration of their
/// subject, so they are buffered and attached in [`OntologyBuilder::build`].
#[derive(Debug, Default)]
pub struct OntologyBuilder {
    iri: Option<String>,
    classes: BTreeSet<String>,
    individuals: BTreeSet<String>,
    labels: BTreeMap<String, Vec<String>>,
    axioms: Vec<OwlAxiom>,
    prefixes: BTreeMap<String, String>,
}

impl OntologyBuilder {
    pub fn iri(mut self, iri: &str) -> Self {
        self.iri = Some(iri.to_string());
        self
    }

    pub fn prefix(mut self, prefix: &str, namespace: &str) -> Self {
        self.prefixes
            .insert(prefix.to_string(), namespace.to_string());
        self
    }

    pub fn class(mut self, iri: &str) -> Self {
        self.declare_class(iri);
        self
    }

    pub fn individual(mut self, iri: &str) -> Self {
        self.declare_individual(iri);
        self
    }

    pub fn label(mut self, iri: &str, label: &str) -> Self {
        self.add_label(iri, label);
        self
    }

    pub fn subclass_of(mut self, sub: &str, super_class: &str) -> Self {
        self.add_subclass_of(sub, super_class);
        self
    }

    pub fn equivalent(mut self, first: &str, second: &str) -> Self {
        self.add_equivalent(first, second);
        self
    }

    pub fn instance_of(mut self, individual: &str, class: &str) -> Self {
        self.add_class_assertion(individual, class);
        self
    }

    fn declare_class(&mut self, iri: &str) {
        self.classes.insert(iri.to_string());
    }

    fn declare_individual(&mut self, iri: &str) {
        self.individuals.insert(iri.to_string());
    }

    fn add_label(&mut self, iri: &str, label: &str) {
        let labels = self.labels.entry(iri.to_string()).or_default();
        if !labels.iter().any(|l| l == label) {
            labels.push(label.to_string());
        }
    }

    fn add_subclass_of(&mut self, sub: &str, super_class: &str) {
        self.declare_class(sub);
        self.declare_class(super_class);
        self.axioms.push(OwlAxiom::SubClassOf {
            sub: sub.to_string(),
            super_class: super_class.to_string(),
        });
    }

    fn add_equivalent(&mut self, first: &str, second: &str) {
        self.declare_class(first);
        self.declare_class(second);
        self.axioms.push(OwlAxiom::EquivalentClasses {
            first: first.to_string(),
            second: second.to_string(),
        });
    }

    fn add_class_assertion(&mut self, individual: &str, class: &str) {
        self.declare_individual(individual);
        self.declare_class(class);
        self.axioms.push(OwlAxiom::ClassAssertion {
            individual: individual.to_string(),
            class: class.to_string(),
        });
    }

    pub(crate) fn add_statements(mut self, statements: &[RdfStatement]) -> Self {
        let anonymous = AnonymousExpressions::collect(statements);
        let mut skipped_anonymous = 0usize;

        for stmt in statements {
            let RdfNode::Iri(subject) = &stmt.subject else {
                if !is_list_structure(&stmt.predicate_iri) {
                    skipped_anonymous += 1;
                }
                continue;
            };

            match (stmt.predicate_iri.as_str(), &stmt.object) {
                (RDF_TYPE_IRI, RdfObject::Node(RdfNode::Iri(ty))) => match ty.as_str() {
                    OWL_CLASS_IRI | RDFS_CLASS_IRI => self.declare_class(subject),
                    OWL_NAMED_INDIVIDUAL_IRI => self.declare_individual(subject),
                    OWL_ONTOLOGY_IRI => {
                        if self.iri.is_none() {
                            self.iri = Some(subject.clone());
                        }
                    }
                    other if is_vocabulary_iri(other) => {}
                    other => self.add_class_assertion(subject, other),
                },
                (RDFS_SUBCLASS_OF_IRI, RdfObject::Node(RdfNode::Iri(sup))) => {
                    self.add_subclass_of(subject, sup)
                }
                (OWL_EQUIVALENT_CLASS_IRI, RdfObject::Node(RdfNode::Iri(other))) => {
                    self.add_equivalent(subject, other)
                }
                (
                    RDFS_SUBCLASS_OF_IRI | OWL_EQUIVALENT_CLASS_IRI,
                    RdfObject::Node(RdfNode::BlankNode(expr)),
                ) => {
                    self.declare_class(subject);
                    // C ⊑ (A ⊓ B) and C ≡ (A ⊓ B) both give C ⊑ A and C ⊑ B.
                    let conjuncts = anonymous.named_conjuncts(expr);
                    if conjuncts.is_empty() {
                        skipped_anonymous += 1;
                    }
                    for conjunct in conjuncts {
                        self.add_subclass_of(subject, conjunct);
                    }
                }
                (RDFS_LABEL_IRI | SKOS_PREF_LABEL_IRI, RdfObject::Literal(lit)) => {
                    self.add_label(subject, &lit.lexical)
                }
                _ => {}
            }
        }

        if skipped_anonymous > 0 {
            tracing::debug!(
                skipped = skipped_anonymous,
                "skipped statements about anonymous class expressions"
            );
        }
        self
    }

    pub fn build(self) -> Ontology {
        let mut prefixes = default_prefixes();
        prefixes.extend(self.prefixes);

        let mut classes: BTreeMap<String, OwlClass> = BTreeMap::new();
        classes.insert(
            OWL_THING_IRI.to_string(),
            OwlClass {
                iri: OWL_THING_IRI.to_string(),
                labels: Vec::new(),
            },
        );
        for iri in &self.classes {
            classes.insert(
                iri.clone(),
                OwlClass {
                    iri: iri.clone(),
                    labels: Vec::new(),
                },
            );
        }

        // A punned IRI (declared both ways) is treated as a class.
        let mut individuals: BTreeMap<String, OwlIndividual> = self
            .individuals
            .iter()
            .filter(|iri| !classes.contains_key(*iri))
            .map(|iri| {
                (
                    iri.clone(),
                    OwlIndividual {
                        iri: iri.clone(),
                        labels: Vec::new(),
                        types: Vec::new(),
                    },
                )
            })
            .collect();

        for axiom in &self.axioms {
            if let OwlAxiom::ClassAssertion { individual, class } = axiom {
                if let Some(ind) = individuals.get_mut(individual) {
                    if !ind.types.contains(class) {
                        ind.types.push(class.clone());
                    }
                }
            }
        }

        for (iri, labels) in self.labels {
            if let Some(class) = classes.get_mut(&iri) {
                class.labels = labels;
            } else if let Some(ind) = individuals.get_mut(&iri) {
                ind.labels = labels;
            }
        }

        Ontology {
            iri: self.iri,
            classes,
            individuals,
            axioms: self.axioms,
            prefixes,
        }
    }
}

fn is_list_structure(predicate: &str) -> bool {
    matches!(
        predicate,
        OWL_INTERSECTION_OF_IRI | RDF_FIRST_IRI | RDF_REST_IRI | RDF_TYPE_IRI
    )
}

/// Blank-node structure needed to read `owl:intersectionOf` lists.
#[derive(Default)]
struct AnonymousExpressions<'a> {
    intersection_of: HashMap<&'a str, &'a str>,
    first: HashMap<&'a str, &'a RdfObject>,
    rest: HashMap<&'a str, &'a RdfObject>,
}

impl<'a> AnonymousExpressions<'a> {
    fn collect(statements: &'a [RdfStatement]) -> Self {
        let mut out = Self::default();
        for stmt in statements {
            let RdfNode::BlankNode(subject) = &stmt.subject else {
                continue;
            };
            match stmt.predicate_iri.as_str() {
                OWL_INTERSECTION_OF_IRI => {
                    if let RdfObject::Node(RdfNode::BlankNode(list)) = &stmt.object {
                        out.intersection_of.insert(subject, list);
                    }
                }
                RDF_FIRST_IRI => {
                    out.first.insert(subject, &stmt.object);
                }
                RDF_REST_IRI => {
                    out.rest.insert(subject, &stmt.object);
                }
                _ => {}
            }
        }
        out
    }

    /// Named members of the intersection `expr`, if it is one. Nested
    /// expressions inside the list are ignored.
    fn named_conjuncts(&self, expr: &str) -> Vec<&str> {
        let mut out = Vec::new();
        let Some(mut cell) = self.intersection_of.get(expr).copied() else {
            return out;
        };
        let mut seen: HashSet<&str> = HashSet::new();
        while seen.insert(cell) {
            if let Some(RdfObject::Node(RdfNode::Iri(member))) = self.first.get(cell) {
                out.push(member.as_str());
            }
            match self.rest.get(cell) {
                Some(RdfObject::Node(RdfNode::BlankNode(next))) => cell = next.as_str(),
                _ => break,
            }
        }
        out
    }
}
