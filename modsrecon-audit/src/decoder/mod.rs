//! MODS document decoder
//!
//! Turns one MODS document into a [`MetadataRecord`]. Top-level elements are
//! routed by local name; compound elements are collapsed into one encoded
//! value; subjects are disambiguated by [`subject::SUBJECT_PRIORITY`].
//!
//! Decoding is best-effort. Shapes the routing table cannot place are
//! dropped and reported through [`DecodedRecord::warnings`] instead of
//! failing the document. Only input that is not well-formed XML fails, and
//! [`ModsDecoder::decode_lossy`] turns even that into an empty record.

mod routing;
pub mod subject;

use modsrecon_common::compound;
use modsrecon_common::{Field, MetadataRecord};
use roxmltree::{Document, Node, ParsingOptions};
use serde::Serialize;
use thiserror::Error;

pub use subject::{SubjectShape, SUBJECT_PRIORITY};

/// Relator code used when a contributor carries no role code
pub const DEFAULT_ROLE: &str = "cre";

/// Document-level decode failure
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Malformed document: {0}")]
    MalformedDocument(String),
}

/// Data-quality conditions noticed while decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeWarning {
    /// Document could not be parsed at all (lossy decode only)
    Malformed(String),
    /// No `mods` element in the document
    MissingRoot,
    /// Contributor without any name part
    EmptyContributor,
    /// Topical subject under an authority with no destination field
    UnroutedSubject { authority: String },
    /// Subject with none of the recognized inner shapes populated
    UnrecognizedSubject,
    /// Compound value could not be encoded
    EncodingFailed { field: Field, reason: String },
}

/// Decoded record plus the warnings raised while building it
#[derive(Debug, Clone, Default)]
pub struct DecodedRecord {
    pub record: MetadataRecord,
    pub warnings: Vec<DecodeWarning>,
}

impl DecodedRecord {
    pub(crate) fn push(&mut self, field: Field, value: impl Into<String>) {
        self.record.push(field, value);
    }

    pub(crate) fn push_encoded<T: Serialize>(&mut self, field: Field, value: &T) {
        match compound::encode(value) {
            Ok(encoded) => self.record.push(field, encoded),
            Err(e) => self.warn(DecodeWarning::EncodingFailed {
                field,
                reason: e.to_string(),
            }),
        }
    }

    pub(crate) fn warn(&mut self, warning: DecodeWarning) {
        tracing::debug!(?warning, "Decode warning");
        self.warnings.push(warning);
    }
}

/// MODS decoder
#[derive(Debug, Clone, Default)]
pub struct ModsDecoder;

impl ModsDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode a document, failing only when it is not well-formed XML
    pub fn decode(&self, bytes: &[u8]) -> Result<DecodedRecord, DecodeError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| DecodeError::MalformedDocument(e.to_string()))?;
        let text = text.trim_start_matches('\u{feff}');

        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let doc = Document::parse_with_options(text, options)
            .map_err(|e| DecodeError::MalformedDocument(e.to_string()))?;

        let mut out = DecodedRecord::default();
        match find_mods(&doc) {
            Some(mods) => {
                for element in mods.children().filter(Node::is_element) {
                    routing::route(element, &mut out);
                }
            }
            None => out.warn(DecodeWarning::MissingRoot),
        }

        Ok(out)
    }

    /// Decode a document, substituting an empty record for malformed input
    pub fn decode_lossy(&self, bytes: &[u8]) -> DecodedRecord {
        match self.decode(bytes) {
            Ok(decoded) => decoded,
            Err(DecodeError::MalformedDocument(reason)) => {
                tracing::warn!(%reason, "Malformed MODS document, using empty record");
                DecodedRecord {
                    record: MetadataRecord::new(),
                    warnings: vec![DecodeWarning::Malformed(reason)],
                }
            }
        }
    }
}

fn find_mods<'a, 'input>(doc: &'a Document<'input>) -> Option<Node<'a, 'input>> {
    let root = doc.root_element();
    if root.tag_name().name() == "mods" {
        return Some(root);
    }
    root.descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "mods")
}

// ---------------------------------------------------------------------------
// Node helpers shared by the routing modules
// ---------------------------------------------------------------------------

pub(crate) fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

pub(crate) fn child<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> Option<Node<'a, 'input>> {
    children(node, name).next()
}

/// Text content of an element and its descendants, trimmed
pub(crate) fn text(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Text of the first element reached by following `path` from `node`
pub(crate) fn path_text(node: Node<'_, '_>, path: &[&'static str]) -> String {
    let mut current = node;
    for name in path {
        match child(current, *name) {
            Some(next) => current = next,
            None => return String::new(),
        }
    }
    text(current)
}

pub(crate) fn attr<'a>(node: Node<'a, '_>, name: &str) -> &'a str {
    node.attribute(name).unwrap_or("")
}
