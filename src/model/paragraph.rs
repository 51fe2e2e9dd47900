//! Paragraph and run-level types.

use serde::{Deserialize, Serialize};

use crate::engine::{self, RunText};

/// A paragraph of the document body or of a table cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paragraph {
    /// Position within the document body (or within the cell)
    #[serde(rename = "paragraph_index")]
    pub index: usize,

    /// Cached concatenation of all run texts
    pub text: String,

    /// Runs in document order
    pub runs: Vec<TextRun>,

    /// Display name of the paragraph style
    #[serde(rename = "style")]
    pub style_name: String,

    /// Whether the style is a heading style
    pub is_heading: bool,

    /// Explicit paragraph alignment, if any
    pub alignment: Option<Alignment>,
}

impl Paragraph {
    /// Create a new empty paragraph.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            text: String::new(),
            runs: Vec::new(),
            style_name: "Normal".to_string(),
            is_heading: false,
            alignment: None,
        }
    }

    /// Create a paragraph with a single unstyled run.
    pub fn with_text(index: usize, text: impl Into<String>) -> Self {
        let mut p = Self::new(index);
        p.add_run(TextRun::new(text));
        p
    }

    /// Set the style name; heading detection follows the name.
    pub fn with_style(mut self, style_name: impl Into<String>) -> Self {
        self.style_name = style_name.into();
        self.is_heading = self.style_name.contains("Heading");
        self
    }

    /// Add a run and refresh the cached text.
    pub fn add_run(&mut self, run: TextRun) {
        self.text.push_str(&run.text);
        self.runs.push(run);
    }

    /// Concatenation of the runs' text.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Replace the first occurrence of `target` with `replacement`,
    /// preserving run formatting. Returns `false` without mutating when
    /// `target` does not occur.
    pub fn substitute(&mut self, target: &str, replacement: &str) -> bool {
        let replaced = engine::substitute(&mut self.runs, target, replacement);
        if replaced {
            self.text = self.plain_text();
        }
        replaced
    }

    /// Check if the paragraph has no visible text.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A run of text with uniform formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// The text content
    pub text: String,

    /// Formatting recorded on the source run
    #[serde(flatten)]
    pub style: TextStyle,
}

impl TextRun {
    /// Create a new run with no explicit formatting.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle::default(),
        }
    }

    /// Create a run with the given style.
    pub fn styled(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    /// Create a bold run.
    pub fn bold(text: impl Into<String>) -> Self {
        Self::styled(
            text,
            TextStyle {
                bold: true,
                ..Default::default()
            },
        )
    }

    /// Create an italic run.
    pub fn italic(text: impl Into<String>) -> Self {
        Self::styled(
            text,
            TextStyle {
                italic: true,
                ..Default::default()
            },
        )
    }

    /// Check if this run is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl RunText for TextRun {
    fn text(&self) -> String {
        self.text.clone()
    }

    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }
}

/// Run formatting properties.
///
/// Font name and size stay `None` when the source run does not set them;
/// inherited or default values are never filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Bold text
    pub bold: bool,

    /// Italic text
    pub italic: bool,

    /// Underlined text
    pub underline: bool,

    /// Font name
    pub font_name: Option<String>,

    /// Font size in points
    pub font_size: Option<f32>,
}

impl TextStyle {
    /// Check if any toggle styling is applied.
    pub fn has_styling(&self) -> bool {
        self.bold || self.italic || self.underline
    }
}

/// Paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Left (or start) alignment
    Left,
    /// Center alignment
    Center,
    /// Right (or end) alignment
    Right,
    /// Justified alignment
    Justify,
}

impl Alignment {
    /// Parse a `w:jc/@w:val` value.
    pub fn from_wordml(val: &str) -> Option<Self> {
        match val {
            "left" | "start" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            "both" | "distribute" => Some(Alignment::Justify),
            _ => None,
        }
    }
}
