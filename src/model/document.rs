//! Document-level structure.

use super::{Paragraph, Table};
use serde::{Deserialize, Serialize};

/// Navigable paragraph/table model of a document body.
///
/// Derived per request from the stored source document and never
/// persisted; indices are stable only for the lifetime of one extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentStructure {
    /// Body paragraphs in document order
    pub paragraphs: Vec<Paragraph>,

    /// Body tables in document order
    pub tables: Vec<Table>,
}

impl DocumentStructure {
    /// Create a new empty structure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a paragraph by index.
    pub fn paragraph(&self, index: usize) -> Option<&Paragraph> {
        self.paragraphs.get(index)
    }

    /// Get a table by index.
    pub fn table(&self, index: usize) -> Option<&Table> {
        self.tables.get(index)
    }

    /// Number of body paragraphs.
    pub fn total_paragraphs(&self) -> usize {
        self.paragraphs.len()
    }

    /// Number of body tables.
    pub fn total_tables(&self) -> usize {
        self.tables.len()
    }

    /// Check if the structure has no content at all.
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty() && self.tables.is_empty()
    }

    /// Plain text of all paragraphs followed by all tables.
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text.clone())
            .chain(self.tables.iter().map(|t| t.plain_text()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
