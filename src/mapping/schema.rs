//! Schema derivation and render-time payload gating.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

use super::{FieldType, Mapping};

/// A top-level field of render input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    /// Payload key
    pub name: String,
    /// Declared type (`array` for loop fields)
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether the key must be present
    pub required: bool,
    /// Text the field replaced, or a loop description
    pub original_text: String,
    /// Per-item fields of a loop
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_fields: Vec<SubField>,
}

/// A per-item field of a loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubField {
    /// Item key
    pub name: String,
    /// Declared type
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Text the field replaced in the template row
    pub original_text: String,
}

impl SchemaField {
    /// Whether this is an array-of-object field.
    pub fn is_array(&self) -> bool {
        self.field_type == FieldType::Array
    }
}

/// Project mappings into the flat field list render input must satisfy.
///
/// One field per scalar label (the first occurrence wins if a label
/// repeats) and one required array field per loop.
pub fn derive(mappings: &[Mapping]) -> Vec<SchemaField> {
    let mut fields = Vec::new();
    let mut seen = HashSet::new();

    for mapping in mappings {
        match mapping {
            Mapping::Paragraph(m) => {
                if seen.insert(m.label.as_str()) {
                    fields.push(scalar(&m.label, m.field_type, m.required, &m.original_text));
                }
            }
            Mapping::TableCell(m) => {
                if seen.insert(m.label.as_str()) {
                    fields.push(scalar(&m.label, m.field_type, m.required, &m.original_text));
                }
            }
            Mapping::TableLoop(m) => {
                if !seen.insert(m.loop_variable.as_str()) {
                    continue;
                }
                let sub_fields: Vec<SubField> = m
                    .cell_labels
                    .iter()
                    .map(|c| SubField {
                        name: c.label.clone(),
                        field_type: c.field_type,
                        original_text: c.original_text.clone(),
                    })
                    .collect();
                fields.push(SchemaField {
                    name: m.loop_variable.clone(),
                    field_type: FieldType::Array,
                    required: true,
                    original_text: format!("Table loop ({} columns)", sub_fields.len()),
                    sub_fields,
                });
            }
        }
    }

    fields
}

fn scalar(name: &str, field_type: FieldType, required: bool, original_text: &str) -> SchemaField {
    SchemaField {
        name: name.to_string(),
        field_type,
        required,
        original_text: original_text.to_string(),
        sub_fields: Vec::new(),
    }
}

/// Gate render input against a schema.
///
/// Fails with [`Error::MissingRequiredField`] for the first required key
/// that is absent, and with [`Error::InvalidPayload`] when a present loop
/// key is not an array.
pub fn validate_payload(fields: &[SchemaField], data: &Map<String, Value>) -> Result<()> {
    for field in fields {
        match data.get(&field.name) {
            None if field.required => {
                return Err(Error::MissingRequiredField(field.name.clone()));
            }
            Some(value) if field.is_array() && !value.is_array() => {
                return Err(Error::InvalidPayload(format!(
                    "'{}' must be an array",
                    field.name
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Build a payload holding a default for every field: empty strings for
/// scalars and empty lists for loops.
pub fn default_payload(fields: &[SchemaField]) -> Map<String, Value> {
    fields
        .iter()
        .map(|f| {
            let value = if f.is_array() {
                Value::Array(Vec::new())
            } else {
                Value::String(String::new())
            };
            (f.name.clone(), value)
        })
        .collect()
}
