//! Mapping records and the mapping registry.
//!
//! A mapping says "this literal text at this location becomes variable X".
//! Three shapes exist: a span in a body paragraph, a span in a table cell,
//! and a table row that repeats once per item of an array variable.

mod registry;
mod schema;

pub use registry::{check_against, MappingRegistry};
pub use schema::{default_payload, derive, validate_payload, SchemaField, SubField};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Declared type of a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text
    #[default]
    String,
    /// Numeric value
    Number,
    /// Date value
    Date,
    /// Monetary value
    Currency,
    /// Array of objects (loop fields only)
    Array,
}

fn default_required() -> bool {
    true
}

/// A span of a body paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphMapping {
    /// Variable name
    pub label: String,
    /// Body paragraph index
    pub paragraph_index: usize,
    /// Literal text selected in the source document
    pub original_text: String,
    /// Whether render input must provide the field
    #[serde(default = "default_required")]
    pub required: bool,
    /// Declared type
    #[serde(default)]
    pub field_type: FieldType,
}

/// A span of a table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCellMapping {
    /// Variable name
    pub label: String,
    /// Body table index
    pub table_index: usize,
    /// Row index within the table
    pub row_index: usize,
    /// Cell index within the row
    pub col_index: usize,
    /// Literal text selected in the source document
    pub original_text: String,
    /// Whether render input must provide the field
    #[serde(default = "default_required")]
    pub required: bool,
    /// Declared type
    #[serde(default)]
    pub field_type: FieldType,
}

/// A table row repeated once per array item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableLoopMapping {
    /// Name of the array variable
    pub loop_variable: String,
    /// Body table index
    pub table_index: usize,
    /// Index of the template row
    pub data_row_index: usize,
    /// Per-column sub-fields
    pub cell_labels: Vec<LoopCell>,
}

/// One column of a loop row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopCell {
    /// Cell index within the template row
    pub col_index: usize,
    /// Sub-field name
    pub label: String,
    /// Text to replace; empty means the whole cell
    #[serde(default)]
    pub original_text: String,
    /// Declared type
    #[serde(default)]
    pub field_type: FieldType,
}

/// A validated mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mapping_type", rename_all = "snake_case")]
pub enum Mapping {
    /// Span in a body paragraph
    Paragraph(ParagraphMapping),
    /// Span in a table cell
    TableCell(TableCellMapping),
    /// Repeating table row
    TableLoop(TableLoopMapping),
}

impl Mapping {
    /// Scalar label, `None` for loop mappings.
    pub fn label(&self) -> Option<&str> {
        match self {
            Mapping::Paragraph(m) => Some(&m.label),
            Mapping::TableCell(m) => Some(&m.label),
            Mapping::TableLoop(_) => None,
        }
    }

    /// Top-level payload key this mapping introduces.
    pub fn field_name(&self) -> &str {
        match self {
            Mapping::Paragraph(m) => &m.label,
            Mapping::TableCell(m) => &m.label,
            Mapping::TableLoop(m) => &m.loop_variable,
        }
    }

    /// Whether this is a paragraph or table-cell mapping.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Mapping::TableLoop(_))
    }

    /// Human-readable location, used in errors and reports.
    pub fn location(&self) -> String {
        match self {
            Mapping::Paragraph(m) => format!("paragraph {}", m.paragraph_index),
            Mapping::TableCell(m) => format!(
                "table {} row {} col {}",
                m.table_index, m.row_index, m.col_index
            ),
            Mapping::TableLoop(m) => format!("table {} row {}", m.table_index, m.data_row_index),
        }
    }

    /// Placeholder token written for a scalar mapping.
    pub fn placeholder(&self) -> Option<String> {
        self.label().map(placeholder)
    }

    /// Check the mapping's own fields.
    pub fn validate(&self) -> Result<()> {
        match self {
            Mapping::Paragraph(m) => check_scalar(&m.label, &m.original_text, m.field_type),
            Mapping::TableCell(m) => check_scalar(&m.label, &m.original_text, m.field_type),
            Mapping::TableLoop(m) => check_loop(m),
        }
    }
}

/// The `{{label}}` token for a scalar label.
pub fn placeholder(label: &str) -> String {
    format!("{{{{{}}}}}", label)
}

/// Validate a mapping in its JSON wire form.
///
/// A missing `mapping_type` means `paragraph`. Unknown variant tags,
/// missing variant fields, empty original text and malformed loop cell
/// lists are rejected with [`Error::RejectedMapping`].
pub fn validate(raw: Value) -> Result<Mapping> {
    let Value::Object(mut object) = raw else {
        return Err(Error::RejectedMapping(
            "mapping must be a JSON object".to_string(),
        ));
    };
    object
        .entry("mapping_type")
        .or_insert_with(|| Value::String("paragraph".to_string()));

    let mapping: Mapping = serde_json::from_value(Value::Object(object))
        .map_err(|e| Error::RejectedMapping(e.to_string()))?;
    mapping.validate()?;
    Ok(mapping)
}

/// Check that a name can be used as a template variable.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_scalar(label: &str, original_text: &str, field_type: FieldType) -> Result<()> {
    if !is_identifier(label) {
        return Err(Error::RejectedMapping(format!(
            "label '{}' is not a valid identifier",
            label
        )));
    }
    if original_text.is_empty() {
        return Err(Error::RejectedMapping(format!(
            "original_text for '{}' is empty",
            label
        )));
    }
    if field_type == FieldType::Array {
        return Err(Error::RejectedMapping(format!(
            "'{}' is a scalar mapping and cannot have type array",
            label
        )));
    }
    Ok(())
}

fn check_loop(mapping: &TableLoopMapping) -> Result<()> {
    if !is_identifier(&mapping.loop_variable) {
        return Err(Error::RejectedMapping(format!(
            "loop variable '{}' is not a valid identifier",
            mapping.loop_variable
        )));
    }
    if mapping.cell_labels.is_empty() {
        return Err(Error::RejectedMapping(format!(
            "loop '{}' has no cell labels",
            mapping.loop_variable
        )));
    }

    let mut columns = std::collections::HashSet::new();
    let mut labels = std::collections::HashSet::new();
    for cell in &mapping.cell_labels {
        if !is_identifier(&cell.label) {
            return Err(Error::RejectedMapping(format!(
                "loop label '{}' is not a valid identifier",
                cell.label
            )));
        }
        if !columns.insert(cell.col_index) {
            return Err(Error::RejectedMapping(format!(
                "loop '{}' maps column {} twice",
                mapping.loop_variable, cell.col_index
            )));
        }
        if !labels.insert(cell.label.as_str()) {
            return Err(Error::RejectedMapping(format!(
                "loop '{}' uses label '{}' twice",
                mapping.loop_variable, cell.label
            )));
        }
    }
    Ok(())
}
