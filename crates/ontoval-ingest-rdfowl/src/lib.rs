//! RDF/OWL ontology loading for Ontoval.
//!
//! Uses **Sophia** to parse the common RDF serializations:
//! - N-Triples (`.nt`)
//! - Turtle (`.ttl`)
//! - N-Quads (`.nq`)
//! - TriG (`.trig`)
//! - RDF/XML (`.rdf`, `.owl`, `.xml`)
//!
//! and folds the statements into an [`Ontology`]: named classes and
//! individuals, their labels, and the told class axioms. Reasoning over the
//! result happens elsewhere; this crate only loads.

pub mod owl;
mod rdf;

pub use owl::{Ontology, OntologyBuilder, OwlAxiom, OwlClass, OwlError, OwlIndividual};
pub use rdf::RdfFormat;

use std::path::Path;

pub fn load_ontology(path: &Path) -> Result<Ontology, OwlError> {
    let format = RdfFormat::for_path(path)?;
    let bytes = std::fs::read(path)?;
    let ontology = parse_ontology(&bytes, format)?;
    tracing::debug!(
        path = %path.display(),
        format = format.as_str(),
        classes = ontology.classes().count(),
        individuals = ontology.individuals().count(),
        axioms = ontology.axioms().len(),
        "loaded ontology"
    );
    Ok(ontology)
}

pub fn parse_ontology(bytes: &[u8], format: RdfFormat) -> Result<Ontology, OwlError> {
    let statements = rdf::parse_rdf_statements(bytes, format)?;
    let mut builder = Ontology::builder();
    for (prefix, namespace) in rdf::declared_prefixes(bytes, format) {
        builder = builder.prefix(&prefix, &namespace);
    }
    Ok(builder.add_statements(&statements).build())
}
