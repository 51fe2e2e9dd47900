//! Structure extraction: DOCX package to [`DocumentStructure`].

use std::collections::HashMap;

use crate::detect::STYLES_PART;
use crate::error::Result;
use crate::model::{
    Alignment, DocumentStructure, Paragraph, Table, TableCell, TableRow, TextRun, TextStyle,
};

use super::options::{ErrorMode, ExtractOptions};
use super::package::DocxPackage;
use super::wordml::{
    body_paragraphs, body_tables, cell_paragraphs, paragraph_runs, row_cells, run_text,
    table_grid_columns, table_rows,
};
use super::xml::{XmlDocument, XmlElement};

/// Style id to display name lookup built from `word/styles.xml`.
#[derive(Debug, Clone, Default)]
pub struct StyleNames {
    names: HashMap<String, String>,
}

impl StyleNames {
    /// Parse a styles part.
    pub fn from_part(data: &[u8]) -> Result<Self> {
        let styles = XmlDocument::parse(data)?;
        let names = styles
            .root
            .children_named("style")
            .filter_map(|style| {
                let id = style.attr_local("styleId")?;
                let name = style.child("name")?.attr_local("val")?;
                Some((id.to_string(), display_name(name)))
            })
            .collect();
        Ok(Self { names })
    }

    /// Display name of a style id; unknown ids resolve to themselves.
    pub fn resolve(&self, id: &str) -> String {
        self.names
            .get(id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    /// Number of known styles.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if no styles are known.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Built-in style names are stored lowercase (`heading 1`); show them the
/// way Word does (`Heading 1`).
fn display_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_lowercase() => first.to_uppercase().chain(chars).collect(),
        _ => name.to_string(),
    }
}

/// Extract the body structure with default options.
pub fn extract(package: &DocxPackage) -> Result<DocumentStructure> {
    extract_with_options(package, &ExtractOptions::default())
}

/// Extract the body structure.
///
/// Paragraph and table indices are positions among the direct children of
/// `w:body` of the same kind; empty paragraphs count.
pub fn extract_with_options(
    package: &DocxPackage,
    options: &ExtractOptions,
) -> Result<DocumentStructure> {
    let styles = load_styles(package, options)?;
    let body = package.body()?;

    let mut structure = DocumentStructure::new();
    structure.paragraphs = body_paragraphs(body)
        .enumerate()
        .map(|(i, p)| build_paragraph(i, p, &styles, options))
        .collect();
    structure.tables = body_tables(body)
        .enumerate()
        .map(|(i, t)| build_table(i, t, &styles, options))
        .collect();

    log::debug!(
        "Extracted {} paragraph(s), {} table(s)",
        structure.total_paragraphs(),
        structure.total_tables()
    );
    Ok(structure)
}

fn load_styles(package: &DocxPackage, options: &ExtractOptions) -> Result<StyleNames> {
    if !options.resolve_styles {
        return Ok(StyleNames::default());
    }
    let Some(data) = package.part(STYLES_PART) else {
        return Ok(StyleNames::default());
    };
    match StyleNames::from_part(data) {
        Ok(styles) => Ok(styles),
        Err(e) if options.error_mode == ErrorMode::Lenient => {
            log::warn!("Ignoring malformed {}: {}", STYLES_PART, e);
            Ok(StyleNames::default())
        }
        Err(e) => Err(e),
    }
}

fn build_paragraph(
    index: usize,
    element: &XmlElement,
    styles: &StyleNames,
    options: &ExtractOptions,
) -> Paragraph {
    let properties = element.child("pPr");
    let style = properties
        .and_then(|p| p.child("pStyle"))
        .and_then(|s| s.attr_local("val"))
        .map(|id| styles.resolve(id))
        .unwrap_or_else(|| "Normal".to_string());

    let mut paragraph = Paragraph::new(index).with_style(style);
    paragraph.alignment = properties
        .and_then(|p| p.child("jc"))
        .and_then(|jc| jc.attr_local("val"))
        .and_then(Alignment::from_wordml);

    for run in paragraph_runs(element) {
        let text = run_text(run);
        if options.include_runs {
            paragraph.add_run(TextRun::styled(text, run_style(run)));
        } else {
            paragraph.text.push_str(&text);
        }
    }
    paragraph
}

fn build_table(
    index: usize,
    element: &XmlElement,
    styles: &StyleNames,
    options: &ExtractOptions,
) -> Table {
    let mut table = Table::new(index);
    for (row_index, row) in table_rows(element).enumerate() {
        let cells = row_cells(row)
            .enumerate()
            .map(|(col_index, cell)| {
                let paragraphs = cell_paragraphs(cell)
                    .enumerate()
                    .map(|(i, p)| build_paragraph(i, p, styles, options))
                    .collect();
                TableCell::with_paragraphs(col_index, paragraphs)
            })
            .collect();
        table.add_row(TableRow::new(row_index, cells));
    }

    let grid = table_grid_columns(element);
    if table.rows.is_empty() {
        table.column_count = 0;
    } else if grid > 0 {
        table.column_count = grid;
    }
    table
}

fn run_style(run: &XmlElement) -> TextStyle {
    let Some(props) = run.child("rPr") else {
        return TextStyle::default();
    };

    let fonts = props.child("rFonts");
    TextStyle {
        bold: toggle(props, "b"),
        italic: toggle(props, "i"),
        underline: props
            .child("u")
            .map(|u| !matches!(u.attr_local("val"), Some("none")))
            .unwrap_or(false),
        font_name: fonts
            .and_then(|f| f.attr_local("ascii").or_else(|| f.attr_local("hAnsi")))
            .map(str::to_string),
        font_size: props
            .child("sz")
            .and_then(|sz| sz.attr_local("val"))
            .and_then(|v| v.parse::<f32>().ok())
            .map(|half_points| half_points / 2.0),
    }
}

/// On/off property: present and not explicitly switched off.
fn toggle(props: &XmlElement, local: &str) -> bool {
    match props.child(local) {
        Some(e) => !matches!(e.attr_local("val"), Some("0" | "false" | "off")),
        None => false,
    }
}
