//! Document model types.
//!
//! This module defines the navigable representation handed to callers
//! that select spans of a document: body paragraphs with their formatted
//! runs, and tables as rows of cells of paragraphs. The model is a
//! snapshot; edits to the underlying package go through [`crate::engine`].

mod document;
mod paragraph;
mod table;

pub use document::DocumentStructure;
pub use paragraph::{Alignment, Paragraph, TextRun, TextStyle};
pub use table::{Table, TableCell, TableRow};
