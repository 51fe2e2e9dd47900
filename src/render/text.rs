//! Plain text rendering for document structures.

use crate::model::DocumentStructure;

/// Convert a document structure to plain text.
///
/// Paragraphs come first, one per line, followed by each table with cells
/// separated by tabs.
pub fn to_text(doc: &DocumentStructure) -> String {
    doc.plain_text().trim().to_string()
}
