use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Class,
    Individual,
}

/// A named ontology entity a cell resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    pub iri: String,
    pub kind: EntityKind,
}

impl Entity {
    pub fn class(iri: impl Into<String>) -> Self {
        Self {
            iri: iri.into(),
            kind: EntityKind::Class,
        }
    }

    pub fn individual(iri: impl Into<String>) -> Self {
        Self {
            iri: iri.into(),
            kind: EntityKind::Individual,
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.iri)
    }
}
