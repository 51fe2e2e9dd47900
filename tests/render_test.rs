//! Integration tests for the render path.

mod common;

use std::sync::Mutex;

use common::{contract, docx, p, row_texts, structure, table, CONTRACT_MAPPINGS};
use docxmap::error::Result;
use docxmap::render::{self, TemplateEngine};
use docxmap::{
    materialize_bytes, render_bytes, DocumentConverter, DocxPackage, Error, MappingRegistry,
    MaterializeOptions, PlaceholderEngine, RenderOptions, RenderStatus,
};
use serde_json::{json, Map, Value};

/// Converter that always returns a fixed document.
struct MockConverter;

impl DocumentConverter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    fn convert_bytes(&self, _docx: &[u8]) -> Result<Vec<u8>> {
        Ok(b"%PDF-1.7 mock".to_vec())
    }
}

/// Converter that always fails.
struct BrokenConverter;

impl DocumentConverter for BrokenConverter {
    fn name(&self) -> &str {
        "broken"
    }

    fn convert_bytes(&self, _docx: &[u8]) -> Result<Vec<u8>> {
        Err(Error::ConversionFailed("soffice exited with status 1".into()))
    }
}

/// Engine that records the context keys it is given.
#[derive(Default)]
struct RecordingEngine {
    keys: Mutex<Vec<String>>,
}

impl TemplateEngine for RecordingEngine {
    fn name(&self) -> &str {
        "recording"
    }

    fn render(&self, _package: &mut DocxPackage, context: &Map<String, Value>) -> Result<usize> {
        let mut keys = self.keys.lock().unwrap();
        keys.extend(context.keys().cloned());
        Ok(0)
    }
}

fn mappings() -> MappingRegistry {
    MappingRegistry::from_json(CONTRACT_MAPPINGS).unwrap()
}

fn template() -> Vec<u8> {
    let (template, report) =
        materialize_bytes(&contract(), &mappings(), &MaterializeOptions::default()).unwrap();
    assert!(report.is_complete());
    template
}

fn payload(items: Value) -> Map<String, Value> {
    let data = json!({
        "buyer_name": "Trần Bình",
        "signed_on": "15/03/2024",
        "seller": "Công ty CP Y",
        "tax_code": "0309876543",
        "items": items,
    });
    data.as_object().unwrap().clone()
}

fn three_items() -> Value {
    json!([
        {"no": 1, "product": "Bút bi", "qty": 10},
        {"no": 2, "product": "Vở kẻ ngang", "qty": 5},
        {"no": 3, "product": "Thước kẻ", "qty": 2},
    ])
}

#[test]
fn test_render_scalars() {
    let rendered = render_bytes(&template(), &mappings(), &payload(three_items())).unwrap();
    assert_eq!(rendered.status, RenderStatus::Completed);
    assert!(rendered.pdf.is_none());

    let doc = structure(&rendered.docx);
    assert_eq!(doc.paragraphs[1].text, "Bên mua: Trần Bình");
    assert_eq!(doc.paragraphs[2].text, "Ngày ký: 15/03/2024");
    assert_eq!(row_texts(&doc, 0, 0), vec!["Bên bán", "Công ty CP Y"]);
    assert_eq!(row_texts(&doc, 0, 1), vec!["Mã số thuế", "0309876543"]);
    assert!(doc.paragraphs[1].runs.iter().any(|r| r.style.bold && r.text.contains("Trần Bình")));
}

#[test]
fn test_render_loop_rows() {
    let rendered = render_bytes(&template(), &mappings(), &payload(three_items())).unwrap();
    let doc = structure(&rendered.docx);

    // Three items replace one template row.
    assert_eq!(doc.tables[1].row_count(), 3 + 2);
    assert_eq!(row_texts(&doc, 1, 0), vec!["STT", "Sản phẩm", "Số lượng"]);
    assert_eq!(row_texts(&doc, 1, 1), vec!["1", "Bút bi", "10"]);
    assert_eq!(row_texts(&doc, 1, 2), vec!["2", "Vở kẻ ngang", "5"]);
    assert_eq!(row_texts(&doc, 1, 3), vec!["3", "Thước kẻ", "2"]);
    assert_eq!(row_texts(&doc, 1, 4), vec!["Tổng", "", "10"]);

    assert!(!doc.tables[1].plain_text().contains("__LOOP__"));
    assert_eq!(rendered.stats.loops_expanded, 1);
    assert_eq!(rendered.stats.rows_inserted, 3);
    assert_eq!(rendered.stats.empty_loops, 0);
}

#[test]
fn test_render_empty_loop_keeps_template_row() {
    let rendered = render_bytes(&template(), &mappings(), &payload(json!([]))).unwrap();
    let doc = structure(&rendered.docx);

    assert_eq!(doc.tables[1].row_count(), 3);
    assert_eq!(row_texts(&doc, 1, 1)[1], "__LOOP__items__product__");
    assert_eq!(rendered.stats.empty_loops, 1);
}

#[test]
fn test_render_missing_item_field_is_empty() {
    let items = json!([{"no": 1, "product": "Bút bi"}]);
    let rendered = render_bytes(&template(), &mappings(), &payload(items)).unwrap();
    let doc = structure(&rendered.docx);
    assert_eq!(row_texts(&doc, 1, 1), vec!["1", "Bút bi", ""]);
}

#[test]
fn test_render_missing_required_field() {
    let mut data = payload(three_items());
    data.remove("buyer_name");

    let result = render_bytes(&template(), &mappings(), &data);
    assert!(matches!(result, Err(Error::MissingRequiredField(ref f)) if f == "buyer_name"));
}

#[test]
fn test_render_optional_field_defaults_to_empty() {
    let mut data = payload(three_items());
    data.remove("tax_code");

    let rendered = render_bytes(&template(), &mappings(), &data).unwrap();
    let doc = structure(&rendered.docx);
    assert_eq!(row_texts(&doc, 0, 1), vec!["Mã số thuế", ""]);
}

#[test]
fn test_render_loop_must_be_array() {
    let result = render_bytes(&template(), &mappings(), &payload(json!("Bút bi")));
    assert!(matches!(result, Err(Error::InvalidPayload(_))));
}

#[test]
fn test_render_with_pdf() {
    let rendered = render::render(
        &template(),
        mappings().as_slice(),
        &payload(three_items()),
        &PlaceholderEngine::new(),
        Some(&MockConverter),
        &RenderOptions::new().with_pdf(true),
    )
    .unwrap();

    assert_eq!(rendered.status, RenderStatus::Completed);
    assert_eq!(rendered.pdf.as_deref(), Some(&b"%PDF-1.7 mock"[..]));
    assert!(rendered.is_complete());
}

#[test]
fn test_render_conversion_failure_returns_docx() {
    let rendered = render::render(
        &template(),
        mappings().as_slice(),
        &payload(three_items()),
        &PlaceholderEngine::new(),
        Some(&BrokenConverter),
        &RenderOptions::new().with_pdf(true),
    )
    .unwrap();

    assert_eq!(rendered.status, RenderStatus::DocxOnly);
    assert!(rendered.pdf.is_none());
    assert!(rendered
        .conversion_error
        .as_deref()
        .unwrap()
        .contains("status 1"));
    assert_eq!(structure(&rendered.docx).paragraphs[1].text, "Bên mua: Trần Bình");
}

#[test]
fn test_render_pdf_without_converter() {
    let rendered = render::render(
        &template(),
        mappings().as_slice(),
        &payload(three_items()),
        &PlaceholderEngine::new(),
        None,
        &RenderOptions::new().with_pdf(true),
    )
    .unwrap();
    assert_eq!(rendered.status, RenderStatus::DocxOnly);
}

#[test]
fn test_engine_never_sees_loop_variables() {
    let engine = RecordingEngine::default();
    render::render(
        &template(),
        mappings().as_slice(),
        &payload(three_items()),
        &engine,
        None,
        &RenderOptions::default(),
    )
    .unwrap();

    let keys = engine.keys.lock().unwrap();
    assert!(keys.contains(&"buyer_name".to_string()));
    assert!(!keys.contains(&"items".to_string()));
}

#[test]
fn test_missing_loop_table() {
    let mappings = MappingRegistry::from_json(
        r#"[{"mapping_type": "table_loop", "loop_variable": "rows", "table_index": 9, "data_row_index": 1,
             "cell_labels": [{"col_index": 0, "label": "a"}]}]"#,
    )
    .unwrap();
    let data = json!({"rows": [{"a": 1}]});
    let data = data.as_object().unwrap();

    let strict = render::render(
        &contract(),
        mappings.as_slice(),
        data,
        &PlaceholderEngine::new(),
        None,
        &RenderOptions::default(),
    );
    assert!(matches!(strict, Err(Error::LocationOutOfRange(_))));

    let lenient = render::render(
        &contract(),
        mappings.as_slice(),
        data,
        &PlaceholderEngine::new(),
        None,
        &RenderOptions::new().lenient_loops(),
    )
    .unwrap();
    assert_eq!(lenient.stats.loops_expanded, 0);
}

fn publish(source: &[u8], mappings: &MappingRegistry) -> Vec<u8> {
    let (template, report) =
        materialize_bytes(source, mappings, &MaterializeOptions::default()).unwrap();
    assert!(report.is_complete());
    template
}

#[test]
fn test_two_loops_in_one_table() {
    let source = docx(&table(&[&["H1"], &["a1"], &["Sep"], &["b1"]]));
    let mappings = MappingRegistry::from_json(
        r#"[
            {"mapping_type": "table_loop", "loop_variable": "alpha", "table_index": 0, "data_row_index": 1,
             "cell_labels": [{"col_index": 0, "label": "x", "original_text": "a1"}]},
            {"mapping_type": "table_loop", "loop_variable": "beta", "table_index": 0, "data_row_index": 3,
             "cell_labels": [{"col_index": 0, "label": "y", "original_text": "b1"}]}
        ]"#,
    )
    .unwrap();
    let data = json!({
        "alpha": [{"x": "A-1"}, {"x": "A-2"}, {"x": "A-3"}],
        "beta": [{"y": "B-1"}, {"y": "B-2"}],
    });

    let rendered = render_bytes(
        &publish(&source, &mappings),
        &mappings,
        data.as_object().unwrap(),
    )
    .unwrap();
    let doc = structure(&rendered.docx);

    let rows: Vec<String> = (0..doc.tables[0].row_count())
        .map(|i| row_texts(&doc, 0, i).concat())
        .collect();
    assert_eq!(rows, vec!["H1", "A-1", "A-2", "A-3", "Sep", "B-1", "B-2"]);
    assert_eq!(rendered.stats.loops_expanded, 2);
    assert_eq!(rendered.stats.rows_inserted, 5);
}

#[test]
fn test_loop_values_are_not_template_syntax() {
    let source = [p("Owner: Bob"), table(&[&["Note"], &["n1"]])].concat();
    let source = docx(&source);
    let mappings = MappingRegistry::from_json(
        r#"[
            {"label": "owner", "paragraph_index": 0, "original_text": "Bob"},
            {"mapping_type": "table_loop", "loop_variable": "notes", "table_index": 0, "data_row_index": 1,
             "cell_labels": [{"col_index": 0, "label": "note", "original_text": "n1"}]}
        ]"#,
    )
    .unwrap();
    let data = json!({
        "owner": "Alice",
        "notes": [{"note": "literal {{owner}}"}],
    });

    let rendered = render_bytes(
        &publish(&source, &mappings),
        &mappings,
        data.as_object().unwrap(),
    )
    .unwrap();
    let doc = structure(&rendered.docx);

    assert_eq!(doc.paragraphs[0].text, "Owner: Alice");
    assert_eq!(row_texts(&doc, 0, 1), vec!["literal {{owner}}"]);
}
