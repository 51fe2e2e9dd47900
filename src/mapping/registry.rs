//! Ordered, label-unique collection of mappings.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::DocumentStructure;

use super::{validate, Mapping, TableLoopMapping};

/// The mappings of one template.
///
/// Insertion order is application order: materialization applies
/// mappings front to back. Top-level field names (scalar labels and loop
/// variables) are unique.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingRegistry {
    mappings: Vec<Mapping>,
}

impl MappingRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from validated mappings, in order.
    pub fn from_mappings(mappings: impl IntoIterator<Item = Mapping>) -> Result<Self> {
        let mut registry = Self::new();
        for mapping in mappings {
            registry.insert(mapping)?;
        }
        Ok(registry)
    }

    /// Parse a JSON array of mappings in wire form.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| Error::RejectedMapping(e.to_string()))?;
        let Value::Array(items) = value else {
            return Err(Error::RejectedMapping(
                "mappings must be a JSON array".to_string(),
            ));
        };
        let mappings = items
            .into_iter()
            .map(validate)
            .collect::<Result<Vec<_>>>()?;
        Self::from_mappings(mappings)
    }

    /// Serialize to a JSON array.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.mappings)?)
    }

    /// Append a mapping.
    pub fn insert(&mut self, mapping: Mapping) -> Result<usize> {
        mapping.validate()?;
        self.check_unique(&mapping, None)?;
        self.mappings.push(mapping);
        Ok(self.mappings.len() - 1)
    }

    /// Append a mapping after checking it against the document it targets.
    ///
    /// The location must exist, and the original text of a paragraph or
    /// cell mapping must not occur more than once there, so that
    /// first-occurrence substitution is never a silent guess.
    pub fn insert_checked(&mut self, mapping: Mapping, structure: &DocumentStructure) -> Result<usize> {
        check_against(&mapping, structure)?;
        self.insert(mapping)
    }

    /// Replace the mapping at `index`.
    pub fn replace(&mut self, index: usize, mapping: Mapping) -> Result<Mapping> {
        if index >= self.mappings.len() {
            return Err(Error::LocationOutOfRange(format!("mapping {}", index)));
        }
        mapping.validate()?;
        self.check_unique(&mapping, Some(index))?;
        Ok(std::mem::replace(&mut self.mappings[index], mapping))
    }

    /// Remove the mapping at `index`.
    pub fn remove(&mut self, index: usize) -> Option<Mapping> {
        if index < self.mappings.len() {
            Some(self.mappings.remove(index))
        } else {
            None
        }
    }

    /// Get a mapping by position.
    pub fn get(&self, index: usize) -> Option<&Mapping> {
        self.mappings.get(index)
    }

    /// Iterate in application order.
    pub fn iter(&self) -> std::slice::Iter<'_, Mapping> {
        self.mappings.iter()
    }

    /// All mappings as a slice.
    pub fn as_slice(&self) -> &[Mapping] {
        &self.mappings
    }

    /// Loop mappings in order.
    pub fn loops(&self) -> impl Iterator<Item = &TableLoopMapping> {
        self.mappings.iter().filter_map(|m| match m {
            Mapping::TableLoop(l) => Some(l),
            _ => None,
        })
    }

    /// Number of mappings.
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    fn check_unique(&self, mapping: &Mapping, skip: Option<usize>) -> Result<()> {
        let name = mapping.field_name();
        let clash = self
            .mappings
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != skip)
            .any(|(_, m)| m.field_name() == name);
        if clash {
            return Err(Error::DuplicateLabel(name.to_string()));
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a MappingRegistry {
    type Item = &'a Mapping;
    type IntoIter = std::slice::Iter<'a, Mapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.mappings.iter()
    }
}

/// Check a mapping's location and text uniqueness against a structure.
pub fn check_against(mapping: &Mapping, structure: &DocumentStructure) -> Result<()> {
    match mapping {
        Mapping::Paragraph(m) => {
            let paragraph = structure.paragraph(m.paragraph_index).ok_or_else(|| {
                Error::LocationOutOfRange(format!("paragraph {}", m.paragraph_index))
            })?;
            ensure_unambiguous(&m.original_text, [paragraph.text.as_str()], mapping)
        }
        Mapping::TableCell(m) => {
            let cell = structure
                .table(m.table_index)
                .and_then(|t| t.cell(m.row_index, m.col_index))
                .ok_or_else(|| Error::LocationOutOfRange(mapping.location()))?;
            ensure_unambiguous(
                &m.original_text,
                cell.paragraphs.iter().map(|p| p.text.as_str()),
                mapping,
            )
        }
        Mapping::TableLoop(m) => {
            let row = structure
                .table(m.table_index)
                .and_then(|t| t.rows.get(m.data_row_index))
                .ok_or_else(|| Error::LocationOutOfRange(mapping.location()))?;
            match m.cell_labels.iter().find(|c| c.col_index >= row.cells.len()) {
                Some(cell) => Err(Error::LocationOutOfRange(format!(
                    "{} col {}",
                    mapping.location(),
                    cell.col_index
                ))),
                None => Ok(()),
            }
        }
    }
}

fn ensure_unambiguous<'a>(
    text: &str,
    haystacks: impl IntoIterator<Item = &'a str>,
    mapping: &Mapping,
) -> Result<()> {
    let occurrences: usize = haystacks
        .into_iter()
        .map(|h| count_occurrences(h, text))
        .sum();
    if occurrences > 1 {
        return Err(Error::AmbiguousText {
            text: text.to_string(),
            location: mapping.location(),
            occurrences,
        });
    }
    Ok(())
}

/// Count possibly overlapping occurrences of `needle`.
fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack
        .char_indices()
        .filter(|(i, _)| haystack[*i..].starts_with(needle))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{FieldType, LoopCell, ParagraphMapping, TableCellMapping};
    use crate::model::{Paragraph, Table, TableRow};

    fn para(label: &str, index: usize, text: &str) -> Mapping {
        Mapping::Paragraph(ParagraphMapping {
            label: label.to_string(),
            paragraph_index: index,
            original_text: text.to_string(),
            required: true,
            field_type: FieldType::String,
        })
    }

    fn structure() -> DocumentStructure {
        let mut doc = DocumentStructure::new();
        doc.paragraphs.push(Paragraph::with_text(0, "A-X-B-X"));
        doc.paragraphs.push(Paragraph::with_text(1, "Dear Sir"));
        let mut table = Table::new(0);
        table.add_row(TableRow::from_strings(0, ["Name", "Qty"]));
        table.add_row(TableRow::from_strings(1, ["Widget", "3"]));
        doc.tables.push(table);
        doc
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut registry = MappingRegistry::new();
        registry.insert(para("b", 0, "B")).unwrap();
        registry.insert(para("a", 1, "Sir")).unwrap();
        let names: Vec<_> = registry.iter().map(|m| m.field_name()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let mut registry = MappingRegistry::new();
        registry.insert(para("name", 0, "A")).unwrap();
        let result = registry.insert(para("name", 1, "Sir"));
        assert!(matches!(result, Err(Error::DuplicateLabel(_))));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_replace_allows_same_label_in_place() {
        let mut registry = MappingRegistry::new();
        registry.insert(para("name", 0, "A")).unwrap();
        let old = registry.replace(0, para("name", 1, "Sir")).unwrap();
        assert_eq!(old, para("name", 0, "A"));
    }

    #[test]
    fn test_ambiguous_text_rejected() {
        let mut registry = MappingRegistry::new();
        let result = registry.insert_checked(para("x", 0, "X"), &structure());
        assert!(matches!(
            result,
            Err(Error::AmbiguousText { occurrences: 2, .. })
        ));
        registry.insert_checked(para("b", 0, "B"), &structure()).unwrap();
    }

    #[test]
    fn test_out_of_range_location_rejected() {
        let mut registry = MappingRegistry::new();
        let result = registry.insert_checked(para("x", 9, "X"), &structure());
        assert!(matches!(result, Err(Error::LocationOutOfRange(_))));

        let cell = Mapping::TableCell(TableCellMapping {
            label: "qty".into(),
            table_index: 0,
            row_index: 1,
            col_index: 5,
            original_text: "3".into(),
            required: true,
            field_type: FieldType::Number,
        });
        assert!(matches!(
            registry.insert_checked(cell, &structure()),
            Err(Error::LocationOutOfRange(_))
        ));
    }

    #[test]
    fn test_loop_columns_checked() {
        let mapping = Mapping::TableLoop(TableLoopMapping {
            loop_variable: "items".into(),
            table_index: 0,
            data_row_index: 1,
            cell_labels: vec![LoopCell {
                col_index: 2,
                label: "price".into(),
                original_text: String::new(),
                field_type: FieldType::Currency,
            }],
        });
        assert!(matches!(
            check_against(&mapping, &structure()),
            Err(Error::LocationOutOfRange(_))
        ));
    }

    #[test]
    fn test_from_json() {
        let registry = MappingRegistry::from_json(
            r#"[{"label": "a", "paragraph_index": 0, "original_text": "A"},
                {"mapping_type": "table_loop", "loop_variable": "rows", "table_index": 0,
                 "data_row_index": 1, "cell_labels": [{"col_index": 0, "label": "name"}]}]"#,
        )
        .unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.loops().count(), 1);
    }

    #[test]
    fn test_count_overlapping() {
        assert_eq!(count_occurrences("aaa", "aa"), 2);
        assert_eq!(count_occurrences("Trần Trần", "Trần"), 2);
        assert_eq!(count_occurrences("abc", "d"), 0);
    }
}
