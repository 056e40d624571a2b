//! Cell text → ontology entity.
//!
//! A cell may name an entity by identifier (full IRI, `<IRI>`, CURIE) or by
//! display label. Both interpretations are tried; if they disagree, or a
//! label is shared by several entities, the cell is ambiguous. No precedence
//! rule picks a winner.

use dashmap::DashMap;
use ontoval_ingest_rdfowl::owl::OBO_NS;
use ontoval_ingest_rdfowl::Ontology;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::entity::Entity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionError {
    #[error("cell is empty")]
    Empty,
    #[error("`{text}` was not found in the ontology")]
    NotFound { text: String },
    #[error("`{text}` is ambiguous (matches {})", .candidates.join(", "))]
    AmbiguousEntity {
        text: String,
        candidates: Vec<String>,
    },
}

pub trait Resolve: Sync {
    fn resolve(&self, text: &str) -> Result<Entity, ResolutionError>;
}

pub struct EntityResolver<'a> {
    ontology: &'a Ontology,
    by_label: HashMap<&'a str, Vec<Entity>>,
}

impl<'a> EntityResolver<'a> {
    pub fn new(ontology: &'a Ontology) -> Self {
        let mut by_label: HashMap<&'a str, Vec<Entity>> = HashMap::new();
        for class in ontology.classes() {
            for label in &class.labels {
                by_label
                    .entry(label.as_str())
                    .or_default()
                    .push(Entity::class(class.iri.as_str()));
            }
        }
        for ind in ontology.individuals() {
            for label in &ind.labels {
                by_label
                    .entry(label.as_str())
                    .or_default()
                    .push(Entity::individual(ind.iri.as_str()));
            }
        }
        Self { ontology, by_label }
    }

    fn entity_for_iri(&self, iri: &str) -> Option<Entity> {
        if self.ontology.class(iri).is_some() {
            Some(Entity::class(iri))
        } else if self.ontology.individual(iri).is_some() {
            Some(Entity::individual(iri))
        } else {
            None
        }
    }

    /// Every entity the text names when read as an identifier. An
    /// angle-bracketed IRI is explicit; a bare string may be a full IRI, a
    /// CURIE and an OBO CURIE at once, and each reading counts.
    fn identifier_candidates(&self, text: &str) -> Vec<Entity> {
        if let Some(iri) = text.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
            return self.entity_for_iri(iri).into_iter().collect();
        }
        [
            Some(text.to_string()),
            self.ontology.expand_curie(text),
            obo_curie_iri(text),
        ]
        .into_iter()
        .flatten()
        .filter_map(|iri| self.entity_for_iri(&iri))
        .collect()
    }
}

impl Resolve for EntityResolver<'_> {
    fn resolve(&self, text: &str) -> Result<Entity, ResolutionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ResolutionError::Empty);
        }

        let mut candidates: BTreeMap<String, Entity> = BTreeMap::new();
        for entity in self.identifier_candidates(text) {
            candidates.insert(entity.iri.clone(), entity);
        }
        for entity in self.by_label.get(text).into_iter().flatten() {
            candidates.insert(entity.iri.clone(), entity.clone());
        }

        let mut candidates = candidates.into_values();
        match (candidates.next(), candidates.next()) {
            (None, _) => Err(ResolutionError::NotFound {
                text: text.to_string(),
            }),
            (Some(entity), None) => Ok(entity),
            (Some(first), Some(second)) => {
                let mut iris = vec![first.iri, second.iri];
                iris.extend(candidates.map(|e| e.iri));
                Err(ResolutionError::AmbiguousEntity {
                    text: text.to_string(),
                    candidates: iris,
                })
            }
        }
    }
}

/// `GO:0008150` → `http://purl.obolibrary.org/obo/GO_0008150`.
fn obo_curie_iri(text: &str) -> Option<String> {
    let (prefix, local) = text.split_once(':')?;
    let prefix_ok = prefix
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    let local_ok =
        !local.is_empty() && local.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    (prefix_ok && local_ok).then(|| format!("{OBO_NS}{prefix}_{local}"))
}

/// Memoises resolutions per trimmed cell text for the duration of one run.
pub struct CachingResolver<'a> {
    inner: EntityResolver<'a>,
    cache: DashMap<String, Result<Entity, ResolutionError>>,
}

impl<'a> CachingResolver<'a> {
    pub fn new(inner: EntityResolver<'a>) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

impl Resolve for CachingResolver<'_> {
    fn resolve(&self, text: &str) -> Result<Entity, ResolutionError> {
        let key = text.trim();
        if let Some(hit) = self.cache.get(key) {
            return hit.clone();
        }
        let resolved = self.inner.resolve(key);
        self.cache.insert(key.to_string(), resolved.clone());
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ontoval_ingest_rdfowl::owl::OWL_THING_IRI;

    const EX: &str = "http://example.org/";

    fn ex(local: &str) -> String {
        format!("{EX}{local}")
    }

    fn pets() -> Ontology {
        Ontology::builder()
            .prefix("ex", EX)
            .subclass_of(&ex("Dog"), &ex("Animal"))
            .label(&ex("Dog"), "Dog")
            .label(&ex("Animal"), "Animal")
            .label(&ex("Animal"), "creature")
            .instance_of(&ex("fido"), &ex("Dog"))
            .label(&ex("fido"), "Fido")
            // `Bark` is the label of one entity and the local name of another.
            .class(&ex("Bark"))
            .class(&ex("TreeBark"))
            .label(&ex("TreeBark"), "ex:Bark")
            // Two classes sharing a label.
            .class(&ex("Seal"))
            .class(&ex("SealStamp"))
            .label(&ex("Seal"), "seal")
            .label(&ex("SealStamp"), "seal")
            .class(&format!("{OBO_NS}GO_0008150"))
            .build()
    }

    #[test]
    fn resolves_labels_iris_and_curies_to_the_same_entity() {
        let ontology = pets();
        let resolver = EntityResolver::new(&ontology);
        let dog = Entity::class(ex("Dog"));

        assert_eq!(resolver.resolve("Dog").unwrap(), dog);
        assert_eq!(resolver.resolve("  Dog\t").unwrap(), dog);
        assert_eq!(resolver.resolve(&ex("Dog")).unwrap(), dog);
        assert_eq!(resolver.resolve(&format!("<{}>", ex("Dog"))).unwrap(), dog);
        assert_eq!(resolver.resolve("ex:Dog").unwrap(), dog);
        assert_eq!(resolver.resolve("creature").unwrap(), Entity::class(ex("Animal")));
        assert_eq!(resolver.resolve("owl:Thing").unwrap(), Entity::class(OWL_THING_IRI));
    }

    #[test]
    fn resolves_individuals_and_obo_curies() {
        let ontology = pets();
        let resolver = EntityResolver::new(&ontology);
        assert_eq!(
            resolver.resolve("Fido").unwrap(),
            Entity::individual(ex("fido"))
        );
        assert_eq!(
            resolver.resolve("GO:0008150").unwrap(),
            Entity::class(format!("{OBO_NS}GO_0008150"))
        );
    }

    #[test]
    fn labels_are_case_sensitive() {
        let ontology = pets();
        let resolver = EntityResolver::new(&ontology);
        assert_eq!(
            resolver.resolve("dog").unwrap_err(),
            ResolutionError::NotFound {
                text: "dog".to_string()
            }
        );
    }

    #[test]
    fn empty_and_unknown_cells_fail() {
        let ontology = pets();
        let resolver = EntityResolver::new(&ontology);
        assert_eq!(resolver.resolve("   ").unwrap_err(), ResolutionError::Empty);
        assert!(matches!(
            resolver.resolve("Unicorn"),
            Err(ResolutionError::NotFound { text }) if text == "Unicorn"
        ));
    }

    #[test]
    fn identifier_and_label_disagreeing_is_ambiguous() {
        let ontology = pets();
        let resolver = EntityResolver::new(&ontology);
        let err = resolver.resolve("ex:Bark").unwrap_err();
        assert_eq!(
            err,
            ResolutionError::AmbiguousEntity {
                text: "ex:Bark".to_string(),
                candidates: vec![ex("Bark"), ex("TreeBark")],
            }
        );
    }

    #[test]
    fn curie_and_obo_readings_disagreeing_is_ambiguous() {
        let go_ns = "http://example.org/go/";
        let ontology = Ontology::builder()
            .prefix("GO", go_ns)
            .class(&format!("{go_ns}0008150"))
            .class(&format!("{OBO_NS}GO_0008150"))
            .build();
        let resolver = EntityResolver::new(&ontology);
        assert_eq!(
            resolver.resolve("GO:0008150").unwrap_err(),
            ResolutionError::AmbiguousEntity {
                text: "GO:0008150".to_string(),
                candidates: vec![format!("{go_ns}0008150"), format!("{OBO_NS}GO_0008150")],
            }
        );
    }

    #[test]
    fn shared_label_is_ambiguous() {
        let ontology = pets();
        let resolver = EntityResolver::new(&ontology);
        assert!(matches!(
            resolver.resolve("seal"),
            Err(ResolutionError::AmbiguousEntity { candidates, .. }) if candidates.len() == 2
        ));
    }

    #[test]
    fn caching_resolver_matches_plain_resolver() {
        let ontology = pets();
        let plain = EntityResolver::new(&ontology);
        let cached = CachingResolver::new(EntityResolver::new(&ontology));

        for text in ["Dog", " Dog ", "Unicorn", "seal", "ex:Bark", "Dog"] {
            assert_eq!(cached.resolve(text), plain.resolve(text));
        }
        // "Dog" and " Dog " share one trimmed key.
        assert_eq!(cached.cached_len(), 4);
    }
}
