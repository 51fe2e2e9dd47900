//! Table types.

use super::Paragraph;
use serde::{Deserialize, Serialize};

/// A table of the document body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Position among the body's tables
    #[serde(rename = "table_index")]
    pub index: usize,

    /// Number of grid columns (0 when the table has no rows)
    #[serde(rename = "num_cols")]
    pub column_count: usize,

    /// Rows in the table
    pub rows: Vec<TableRow>,
}

impl Table {
    /// Create a new empty table.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            column_count: 0,
            rows: Vec::new(),
        }
    }

    /// Add a row to the table, widening the column count if needed.
    pub fn add_row(&mut self, row: TableRow) {
        self.column_count = self.column_count.max(row.cells.len());
        self.rows.push(row);
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get a cell by position.
    pub fn cell(&self, row: usize, col: usize) -> Option<&TableCell> {
        self.rows.get(row).and_then(|r| r.cells.get(col))
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get plain text representation of the table.
    pub fn plain_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.plain_text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A table row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRow {
    /// Position within the table
    #[serde(rename = "row_index")]
    pub index: usize,

    /// Cells in the row
    pub cells: Vec<TableCell>,
}

impl TableRow {
    /// Create a new row with cells.
    pub fn new(index: usize, cells: Vec<TableCell>) -> Self {
        Self { index, cells }
    }

    /// Create a row from text values, one single-run cell per value.
    pub fn from_strings<S: Into<String>>(index: usize, values: impl IntoIterator<Item = S>) -> Self {
        let cells = values
            .into_iter()
            .enumerate()
            .map(|(col, text)| TableCell::text(col, text))
            .collect();
        Self::new(index, cells)
    }

    /// Get plain text representation.
    pub fn plain_text(&self) -> String {
        self.cells
            .iter()
            .map(|c| c.plain_text())
            .collect::<Vec<_>>()
            .join("\t")
    }
}

/// A table cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableCell {
    /// Position within the row
    #[serde(rename = "col_index")]
    pub index: usize,

    /// Cell content
    pub paragraphs: Vec<Paragraph>,
}

impl TableCell {
    /// Create a cell holding one paragraph of text.
    pub fn text(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            paragraphs: vec![Paragraph::with_text(0, text)],
        }
    }

    /// Create a cell with multiple paragraphs.
    pub fn with_paragraphs(index: usize, paragraphs: Vec<Paragraph>) -> Self {
        Self { index, paragraphs }
    }

    /// Cell text: paragraph texts joined by newlines.
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Replace `target` in the first paragraph that contains it.
    pub fn substitute(&mut self, target: &str, replacement: &str) -> bool {
        self.paragraphs
            .iter_mut()
            .any(|p| p.substitute(target, replacement))
    }

    /// Check if the cell has no visible text.
    pub fn is_empty(&self) -> bool {
        self.paragraphs.iter().all(|p| p.is_empty())
    }
}
