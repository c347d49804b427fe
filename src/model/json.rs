//! JSON snapshots of document trees.

use super::Document;
use crate::error::Result;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert a document to JSON.
pub fn to_json(doc: &Document, format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(doc)?,
        JsonFormat::Compact => serde_json::to_string(doc)?,
    };
    Ok(json)
}

/// Read a document from JSON and number its nodes.
pub fn from_json(json: &str) -> Result<Document> {
    let mut doc: Document = serde_json::from_str(json)?;
    doc.assign_ids();
    Ok(doc)
}
