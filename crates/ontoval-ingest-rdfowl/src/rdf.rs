//! RDF statement parsing (Sophia) into a small owned term model.
//!
//! Only what ontology loading needs is kept: subject, predicate IRI and
//! object. Named graphs in N-Quads/TriG are flattened into one default graph.

use sophia::api::prelude::*;
use std::path::Path;

use crate::owl::OwlError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum RdfNode {
    Iri(String),
    BlankNode(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct RdfLiteral {
    pub(crate) lexical: String,
    pub(crate) datatype: Option<String>,
    pub(crate) language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum RdfObject {
    Node(RdfNode),
    Literal(RdfLiteral),
}

#[derive(Debug, Clone)]
pub(crate) struct RdfStatement {
    pub(crate) subject: RdfNode,
    pub(crate) predicate_iri: String,
    pub(crate) object: RdfObject,
}

/// Serialization of an ontology document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdfFormat {
    NTriples,
    Turtle,
    NQuads,
    TriG,
    RdfXml,
}

impl RdfFormat {
    pub fn for_path(path: &Path) -> Result<Self, OwlError> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "nt" | "ntriples" => Ok(RdfFormat::NTriples),
            "ttl" | "turtle" => Ok(RdfFormat::Turtle),
            "nq" | "nquads" => Ok(RdfFormat::NQuads),
            "trig" => Ok(RdfFormat::TriG),
            "rdf" | "owl" | "xml" => Ok(RdfFormat::RdfXml),
            other => Err(OwlError::UnsupportedFormat(format!(".{other}"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RdfFormat::NTriples => "ntriples",
            RdfFormat::Turtle => "turtle",
            RdfFormat::NQuads => "nquads",
            RdfFormat::TriG => "trig",
            RdfFormat::RdfXml => "rdfxml",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
struct RdfSinkError {
    message: String,
}

impl From<OwlError> for RdfSinkError {
    fn from(value: OwlError) -> Self {
        Self {
            message: value.to_string(),
        }
    }
}

/// Undo N-Triples string escapes, including `\uXXXX` / `\UXXXXXXXX`, so
/// labels compare equal to the text a user types in a cell.
fn unescape_rdf_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(esc) = chars.next() else {
            out.push('\\');
            break;
        };
        let simple = match esc {
            'n' => Some('\n'),
            'r' => Some('\r'),
            't' => Some('\t'),
            'b' => Some('\u{8}'),
            'f' => Some('\u{c}'),
            '"' | '\'' | '\\' => Some(esc),
            _ => None,
        };
        if let Some(ch) = simple {
            out.push(ch);
            continue;
        }
        let width = match esc {
            'u' => 4,
            'U' => 8,
            _ => {
                out.push('\\');
                out.push(esc);
                continue;
            }
        };
        let hex: String = chars.clone().take(width).collect();
        match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
            Some(ch) if hex.len() == width && hex.chars().all(|c| c.is_ascii_hexdigit()) => {
                out.push(ch);
                chars.nth(width - 1);
            }
            _ => {
                out.push('\\');
                out.push(esc);
            }
        }
    }
    out
}

/// Parse the N-Triples display form Sophia gives terms.
fn parse_term_display(term: &str) -> Result<RdfObject, OwlError> {
    let s = term.trim();

    if let Some(rest) = s.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
        return Ok(RdfObject::Node(RdfNode::Iri(rest.to_string())));
    }

    if let Some(rest) = s.strip_prefix("_:") {
        return Ok(RdfObject::Node(RdfNode::BlankNode(rest.to_string())));
    }

    if s.starts_with('"') {
        let mut end_quote = None;
        let mut escaped = false;
        for (i, ch) in s.char_indices().skip(1) {
            if escaped {
                escaped = false;
                continue;
            }
            match ch {
                '\\' => escaped = true,
                '"' => {
                    end_quote = Some(i);
                    break;
                }
                _ => {}
            }
        }
        let Some(end) = end_quote else {
            return Err(OwlError::Parse(format!(
                "invalid literal term (missing closing quote): {s}"
            )));
        };

        let lexical = unescape_rdf_string(&s[1..end]);
        let rest = s[end + 1..].trim();

        let mut language = None;
        let mut datatype = None;
        if let Some(lang) = rest.strip_prefix('@') {
            language = Some(lang.to_string());
        } else if let Some(dt) = rest.strip_prefix("^^") {
            let dt = dt.trim();
            if let Some(dt_iri) = dt.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
                datatype = Some(dt_iri.to_string());
            } else if !dt.is_empty() {
                datatype = Some(dt.to_string());
            }
        }

        return Ok(RdfObject::Literal(RdfLiteral {
            lexical,
            datatype,
            language,
        }));
    }

    Err(OwlError::Parse(format!("unsupported RDF term form: {s}")))
}

fn parse_node_term_display(term: &str) -> Result<RdfNode, OwlError> {
    match parse_term_display(term)? {
        RdfObject::Node(node) => Ok(node),
        RdfObject::Literal(_) => Err(OwlError::Parse(format!(
            "expected IRI/blank node, got literal: {term}"
        ))),
    }
}

fn statement_from_display(
    s: &str,
    p: &str,
    o: &str,
) -> Result<Option<RdfStatement>, RdfSinkError> {
    let subject = parse_node_term_display(s)?;
    let RdfNode::Iri(predicate_iri) = parse_node_term_display(p)? else {
        return Ok(None);
    };
    let object = parse_term_display(o)?;
    Ok(Some(RdfStatement {
        subject,
        predicate_iri,
        object,
    }))
}

pub(crate) fn parse_rdf_statements(
    bytes: &[u8],
    format: RdfFormat,
) -> Result<Vec<RdfStatement>, OwlError> {
    let reader = std::io::BufReader::new(std::io::Cursor::new(bytes));
    let mut out: Vec<RdfStatement> = Vec::new();

    let mut on_triple = |s: String, p: String, o: String| -> Result<(), RdfSinkError> {
        if let Some(stmt) = statement_from_display(&s, &p, &o)? {
            out.push(stmt);
        }
        Ok(())
    };

    let parsed = match format {
        RdfFormat::NTriples => sophia::turtle::parser::nt::parse_bufread(reader)
            .try_for_each_triple(|t| {
                on_triple(t.s().to_string(), t.p().to_string(), t.o().to_string())
            })
            .map_err(|e| e.to_string()),
        RdfFormat::Turtle => sophia::turtle::parser::turtle::parse_bufread(reader)
            .try_for_each_triple(|t| {
                on_triple(t.s().to_string(), t.p().to_string(), t.o().to_string())
            })
            .map_err(|e| e.to_string()),
        RdfFormat::NQuads => sophia::turtle::parser::nq::parse_bufread(reader)
            .try_for_each_quad(|q| {
                on_triple(q.s().to_string(), q.p().to_string(), q.o().to_string())
            })
            .map_err(|e| e.to_string()),
        RdfFormat::TriG => sophia::turtle::parser::trig::parse_bufread(reader)
            .try_for_each_quad(|q| {
                on_triple(q.s().to_string(), q.p().to_string(), q.o().to_string())
            })
            .map_err(|e| e.to_string()),
        RdfFormat::RdfXml => sophia::xml::parser::parse_bufread(reader)
            .try_for_each_triple(|t| {
                on_triple(t.s().to_string(), t.p().to_string(), t.o().to_string())
            })
            .map_err(|e| e.to_string()),
    };

    parsed.map_err(|e| OwlError::Parse(format!("failed to parse {}: {e}", format.as_str())))?;
    Ok(out)
}

/// `@prefix` / `PREFIX` declarations of a Turtle or TriG document. The
/// parser expands CURIEs itself and does not hand its prefix table back.
pub(crate) fn declared_prefixes(bytes: &[u8], format: RdfFormat) -> Vec<(String, String)> {
    if !matches!(format, RdfFormat::Turtle | RdfFormat::TriG) {
        return Vec::new();
    }
    let text = String::from_utf8_lossy(bytes);
    text.lines()
        .filter_map(|line| {
            let line = line.trim_start();
            let rest = line.strip_prefix("@prefix").or_else(|| {
                line.get(..6)
                    .filter(|kw| kw.eq_ignore_ascii_case("prefix"))
                    .map(|_| &line[6..])
            })?;
            let (name, iri) = rest.trim().split_once(':')?;
            let (iri, _) = iri.trim().strip_prefix('<')?.split_once('>')?;
            Some((name.trim().to_string(), iri.to_string()))
        })
        .collect()
}
