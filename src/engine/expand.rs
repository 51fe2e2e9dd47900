//! Table row expansion for loop mappings.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::mapping::LoopCell;
use crate::parser::xml::{XmlElement, XmlNode};

/// Marker token written into a loop row cell at publish time.
pub fn loop_marker(loop_variable: &str, label: &str) -> String {
    format!("__LOOP__{}__{}__", loop_variable, label)
}

/// String form of a payload value as it appears in the document.
///
/// Strings are inserted as-is, `null` as the empty string, anything else
/// in its JSON form.
pub fn stringify_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Expand the template row of `table` into one row per item.
///
/// Each clone is an independent deep copy of the template row's element;
/// every `__LOOP__<var>__<label>__` marker in its text leaves is replaced
/// by the item's value for `label` (empty when absent). Clones take the
/// template row's position in item order and the template row is removed.
/// With no items the table is left untouched, markers included.
///
/// Returns the number of rows inserted.
pub fn expand(
    table: &mut XmlElement,
    template_row_index: usize,
    loop_variable: &str,
    cell_labels: &[LoopCell],
    items: &[Value],
) -> Result<usize> {
    let position = table
        .children
        .iter()
        .enumerate()
        .filter(|(_, node)| matches!(node, XmlNode::Element(e) if e.is("tr")))
        .map(|(i, _)| i)
        .nth(template_row_index)
        .ok_or_else(|| {
            Error::LocationOutOfRange(format!("row {} of loop '{}'", template_row_index, loop_variable))
        })?;

    if items.is_empty() {
        log::debug!(
            "Loop '{}' has no items; template row {} kept",
            loop_variable,
            template_row_index
        );
        return Ok(0);
    }

    let XmlNode::Element(template) = &table.children[position] else {
        unreachable!("position was selected among element nodes");
    };

    let markers: Vec<(String, &str)> = cell_labels
        .iter()
        .map(|c| (loop_marker(loop_variable, &c.label), c.label.as_str()))
        .collect();

    let clones: Vec<XmlNode> = items
        .iter()
        .map(|item| {
            let fields = item_fields(item);
            let mut row = template.clone();
            fill_markers(&mut row, &markers, &fields);
            XmlNode::Element(row)
        })
        .collect();

    let inserted = clones.len();
    table.children.splice(position..=position, clones);

    log::debug!(
        "Loop '{}' expanded into {} row(s) at row {}",
        loop_variable,
        inserted,
        template_row_index
    );
    Ok(inserted)
}

/// View an item as a field map; non-objects become `{"value": item}`.
fn item_fields(item: &Value) -> Map<String, Value> {
    match item {
        Value::Object(map) => map.clone(),
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), Value::String(stringify_value(other)));
            map
        }
    }
}

fn fill_markers(row: &mut XmlElement, markers: &[(String, &str)], fields: &Map<String, Value>) {
    row.walk_mut(&mut |element| {
        if !element.is("t") {
            return;
        }
        for node in element.children.iter_mut() {
            let XmlNode::Text(text) = node else {
                continue;
            };
            for (marker, label) in markers {
                if text.contains(marker.as_str()) {
                    let value = fields.get(*label).map(stringify_value).unwrap_or_default();
                    *text = text.replace(marker.as_str(), &value);
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::FieldType;
    use crate::parser::wordml::{paragraph_text, table_rows};
    use crate::parser::xml::XmlDocument;
    use serde_json::json;

    const TABLE: &str = r#"<w:tbl><w:tblGrid><w:gridCol/><w:gridCol/></w:tblGrid><w:tr><w:tc><w:p><w:r><w:t>Name</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>Qty</w:t></w:r></w:p></w:tc></w:tr><w:tr><w:tc><w:p><w:r><w:rPr><w:b/></w:rPr><w:t>__LOOP__items__name__</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>x__LOOP__items__qty__ (__LOOP__items__qty__)</w:t></w:r></w:p></w:tc></w:tr><w:tr><w:tc><w:p><w:r><w:t>Total</w:t></w:r></w:p></w:tc><w:tc><w:p/></w:tc></w:tr></w:tbl>"#;

    fn cells() -> Vec<LoopCell> {
        ["name", "qty"]
            .iter()
            .enumerate()
            .map(|(i, label)| LoopCell {
                col_index: i,
                label: label.to_string(),
                original_text: String::new(),
                field_type: FieldType::String,
            })
            .collect()
    }

    fn row_texts(table: &XmlElement) -> Vec<String> {
        table_rows(table)
            .map(|row| {
                row.children_named("tc")
                    .flat_map(|tc| tc.children_named("p"))
                    .map(paragraph_text)
                    .collect::<Vec<_>>()
                    .join("|")
            })
            .collect()
    }

    #[test]
    fn test_expand_items_in_order() {
        let mut table = XmlDocument::parse_str(TABLE).unwrap().root;
        let items = vec![json!({"name": "Widget", "qty": 3}), json!({"name": "Gadget"})];

        let inserted = expand(&mut table, 1, "items", &cells(), &items).unwrap();

        assert_eq!(inserted, 2);
        assert_eq!(
            row_texts(&table),
            vec!["Name|Qty", "Widget|x3 (3)", "Gadget|x ()", "Total|"]
        );
    }

    #[test]
    fn test_expand_row_count_delta() {
        let mut table = XmlDocument::parse_str(TABLE).unwrap().root;
        let before = table_rows(&table).count();
        let items: Vec<Value> = (0..5).map(|i| json!({"name": format!("n{}", i)})).collect();

        expand(&mut table, 1, "items", &cells(), &items).unwrap();

        assert_eq!(table_rows(&table).count(), before - 1 + 5);
        assert!(!XmlDocument::new(table.clone()).to_xml_string().contains("__LOOP__"));
    }

    #[test]
    fn test_expand_keeps_formatting_in_clones() {
        let mut table = XmlDocument::parse_str(TABLE).unwrap().root;
        expand(&mut table, 1, "items", &cells(), &[json!({"name": "A"})]).unwrap();
        let row = table_rows(&table).nth(1).unwrap();
        let run = row.child("tc").unwrap().child("p").unwrap().child("r").unwrap();
        assert!(run.child("rPr").unwrap().child("b").is_some());
    }

    #[test]
    fn test_empty_items_is_noop() {
        let mut table = XmlDocument::parse_str(TABLE).unwrap().root;
        let before = table.clone();
        assert_eq!(expand(&mut table, 1, "items", &cells(), &[]).unwrap(), 0);
        assert_eq!(table, before);
        assert!(row_texts(&table)[1].contains("__LOOP__items__name__"));
    }

    #[test]
    fn test_non_object_items_coerced() {
        let mut table = XmlDocument::parse_str(TABLE).unwrap().root;
        let value_cell = vec![LoopCell {
            col_index: 0,
            label: "value".into(),
            original_text: String::new(),
            field_type: FieldType::String,
        }];
        let mut row = table_rows(&table).nth(1).unwrap().clone();
        row.walk_mut(&mut |e| {
            if e.is("t") {
                e.children = vec![XmlNode::Text("__LOOP__items__value__".into())];
            }
        });
        let XmlNode::Element(slot) = table
            .children
            .iter_mut()
            .filter(|n| matches!(n, XmlNode::Element(e) if e.is("tr")))
            .nth(1)
            .unwrap()
        else {
            unreachable!()
        };
        *slot = row;

        expand(&mut table, 1, "items", &value_cell, &[json!("plain"), json!(7)]).unwrap();
        let texts = row_texts(&table);
        assert_eq!(texts[1], "plain|plain");
        assert_eq!(texts[2], "7|7");
    }

    #[test]
    fn test_invalid_row_index() {
        let mut table = XmlDocument::parse_str(TABLE).unwrap().root;
        let result = expand(&mut table, 7, "items", &cells(), &[json!({})]);
        assert!(matches!(result, Err(Error::LocationOutOfRange(_))));
    }

    #[test]
    fn test_stringify_value() {
        assert_eq!(stringify_value(&json!("a")), "a");
        assert_eq!(stringify_value(&json!(null)), "");
        assert_eq!(stringify_value(&json!(1.5)), "1.5");
        assert_eq!(stringify_value(&json!(true)), "true");
    }
}
