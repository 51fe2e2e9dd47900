//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use docxmap::{extract_bytes, DocumentStructure};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const NAMESPACE: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Paragraph with one plain run.
pub fn p(text: &str) -> String {
    format!(r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#, text)
}

/// Paragraph with a style and the given runs.
pub fn styled_p(style: &str, runs: &[String]) -> String {
    format!(
        r#"<w:p><w:pPr><w:pStyle w:val="{}"/></w:pPr>{}</w:p>"#,
        style,
        runs.concat()
    )
}

/// Paragraph made of the given runs.
pub fn runs_p(runs: &[String]) -> String {
    format!("<w:p>{}</w:p>", runs.concat())
}

/// Plain run.
pub fn r(text: &str) -> String {
    format!(r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#, text)
}

/// Bold run.
pub fn bold(text: &str) -> String {
    format!(
        r#"<w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#,
        text
    )
}

/// Italic run.
pub fn italic(text: &str) -> String {
    format!(
        r#"<w:r><w:rPr><w:i/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#,
        text
    )
}

/// Table of plain-text cells.
pub fn table(rows: &[&[&str]]) -> String {
    let columns = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let grid = "<w:gridCol/>".repeat(columns);
    let body: String = rows
        .iter()
        .map(|row| {
            let cells: String = row
                .iter()
                .map(|text| format!("<w:tc>{}</w:tc>", p(text)))
                .collect();
            format!("<w:tr>{}</w:tr>", cells)
        })
        .collect();
    format!("<w:tbl><w:tblGrid>{}</w:tblGrid>{}</w:tbl>", grid, body)
}

/// Build a DOCX around the given body content.
pub fn docx(body: &str) -> Vec<u8> {
    docx_with_styles(body, None)
}

/// Build a DOCX with an optional styles part.
pub fn docx_with_styles(body: &str, styles: Option<&str>) -> Vec<u8> {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{}"><w:body>{}<w:sectPr/></w:body></w:document>"#,
        NAMESPACE, body
    );

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    writer.start_file("[Content_Types].xml", options).unwrap();
    writer
        .write_all(br#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#)
        .unwrap();
    writer.start_file("word/document.xml", options).unwrap();
    writer.write_all(document.as_bytes()).unwrap();
    if let Some(styles) = styles {
        let part = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:styles xmlns:w="{}">{}</w:styles>"#,
            NAMESPACE, styles
        );
        writer.start_file("word/styles.xml", options).unwrap();
        writer.write_all(part.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// A style definition for the styles part.
pub fn style(id: &str, name: &str) -> String {
    format!(
        r#"<w:style w:type="paragraph" w:styleId="{}"><w:name w:val="{}"/></w:style>"#,
        id, name
    )
}

/// A sales contract with a header, a split-run customer name, a party
/// table and an order table whose second row repeats.
pub fn contract() -> Vec<u8> {
    let body = [
        styled_p("Heading1", &[r("HỢP ĐỒNG MUA BÁN")]),
        runs_p(&[r("Bên mua: "), bold("Nguyễn "), bold("Văn A")]),
        runs_p(&[r("Ngày ký: "), italic("01/01/2024")]),
        table(&[&["Bên bán", "Công ty TNHH X"], &["Mã số thuế", "0101234567"]]),
        table(&[
            &["STT", "Sản phẩm", "Số lượng"],
            &["1", "Bút bi", "10"],
            &["Tổng", "", "10"],
        ]),
        p("Hai bên cam kết thực hiện đúng hợp đồng."),
    ]
    .concat();
    docx_with_styles(&body, Some(&style("Heading1", "heading 1")))
}

/// Mappings for [`contract`] in JSON wire form.
pub const CONTRACT_MAPPINGS: &str = r#"[
    {"label": "buyer_name", "paragraph_index": 1, "original_text": "Nguyễn Văn A"},
    {"label": "signed_on", "paragraph_index": 2, "original_text": "01/01/2024", "field_type": "date"},
    {"mapping_type": "table_cell", "label": "seller", "table_index": 0, "row_index": 0, "col_index": 1, "original_text": "Công ty TNHH X"},
    {"mapping_type": "table_cell", "label": "tax_code", "table_index": 0, "row_index": 1, "col_index": 1, "original_text": "0101234567", "required": false},
    {"mapping_type": "table_loop", "loop_variable": "items", "table_index": 1, "data_row_index": 1, "cell_labels": [
        {"col_index": 0, "label": "no", "original_text": "1", "field_type": "number"},
        {"col_index": 1, "label": "product", "original_text": "Bút bi"},
        {"col_index": 2, "label": "qty", "original_text": "10", "field_type": "number"}
    ]}
]"#;

/// Structure of a DOCX held in memory.
pub fn structure(bytes: &[u8]) -> DocumentStructure {
    extract_bytes(bytes).unwrap()
}

/// Cell texts of one table row.
pub fn row_texts(doc: &DocumentStructure, table: usize, row: usize) -> Vec<String> {
    doc.tables[table].rows[row]
        .cells
        .iter()
        .map(|c| c.plain_text())
        .collect()
}
