//! WordprocessingML navigation over the XML tree.
//!
//! Elements are matched by local name so that documents using a
//! non-standard prefix for the main namespace still resolve. Elements this
//! module creates always use the conventional `w:` prefix.

use crate::engine::RunText;

use super::xml::{XmlElement, XmlNode};

/// Containers that can wrap runs inside a paragraph.
const RUN_CONTAINERS: &[&str] = &["hyperlink", "ins", "smartTag", "customXml", "fldSimple"];

/// Run children that carry text and are rewritten when run text changes.
const RUN_CONTENT: &[&str] = &["t", "tab", "br", "cr", "noBreakHyphen", "softHyphen"];

/// Body-level paragraphs (direct `w:p` children of `w:body`).
pub fn body_paragraphs(body: &XmlElement) -> impl Iterator<Item = &XmlElement> {
    body.children_named("p")
}

/// Body-level tables (direct `w:tbl` children of `w:body`).
pub fn body_tables(body: &XmlElement) -> impl Iterator<Item = &XmlElement> {
    body.children_named("tbl")
}

/// A body-level paragraph by index.
pub fn body_paragraph_mut(body: &mut XmlElement, index: usize) -> Option<&mut XmlElement> {
    body.elements_mut().filter(|e| e.is("p")).nth(index)
}

/// A body-level table by index.
pub fn body_table_mut(body: &mut XmlElement, index: usize) -> Option<&mut XmlElement> {
    body.elements_mut().filter(|e| e.is("tbl")).nth(index)
}

/// Rows of a table.
pub fn table_rows(table: &XmlElement) -> impl Iterator<Item = &XmlElement> {
    table.children_named("tr")
}

/// A table row by index.
pub fn table_row_mut(table: &mut XmlElement, index: usize) -> Option<&mut XmlElement> {
    table.elements_mut().filter(|e| e.is("tr")).nth(index)
}

/// Cells of a row.
pub fn row_cells(row: &XmlElement) -> impl Iterator<Item = &XmlElement> {
    row.children_named("tc")
}

/// A cell of a row by index.
pub fn row_cell_mut(row: &mut XmlElement, index: usize) -> Option<&mut XmlElement> {
    row.elements_mut().filter(|e| e.is("tc")).nth(index)
}

/// Paragraphs of a cell.
pub fn cell_paragraphs(cell: &XmlElement) -> impl Iterator<Item = &XmlElement> {
    cell.children_named("p")
}

/// Paragraphs of a cell, mutably.
pub fn cell_paragraphs_mut(cell: &mut XmlElement) -> impl Iterator<Item = &mut XmlElement> {
    cell.elements_mut().filter(|e| e.is("p"))
}

/// Number of grid columns declared by a table's `w:tblGrid`.
pub fn table_grid_columns(table: &XmlElement) -> usize {
    table
        .child("tblGrid")
        .map(|grid| grid.children_named("gridCol").count())
        .unwrap_or(0)
}

/// Runs of a paragraph in document order, including wrapped runs.
pub fn paragraph_runs(paragraph: &XmlElement) -> Vec<&XmlElement> {
    let mut out = Vec::new();
    collect_runs(paragraph, &mut out);
    out
}

fn collect_runs<'a>(element: &'a XmlElement, out: &mut Vec<&'a XmlElement>) {
    for child in element.elements() {
        if child.is("r") {
            out.push(child);
        } else if RUN_CONTAINERS.contains(&child.local_name()) {
            collect_runs(child, out);
        }
    }
}

/// Runs of a paragraph as editable handles.
pub fn paragraph_runs_mut(paragraph: &mut XmlElement) -> Vec<RunElement<'_>> {
    let mut out = Vec::new();
    collect_runs_mut(paragraph, &mut out);
    out
}

fn collect_runs_mut<'a>(element: &'a mut XmlElement, out: &mut Vec<RunElement<'a>>) {
    for child in element.elements_mut() {
        if child.is("r") {
            out.push(RunElement(child));
        } else if RUN_CONTAINERS.contains(&child.local_name()) {
            collect_runs_mut(child, out);
        }
    }
}

/// Visit every paragraph under `element` that is not nested in another
/// paragraph (body paragraphs and table-cell paragraphs at any depth).
pub fn for_each_paragraph_mut(element: &mut XmlElement, f: &mut impl FnMut(&mut XmlElement)) {
    for child in element.elements_mut() {
        if child.is("p") {
            f(child);
        } else {
            for_each_paragraph_mut(child, f);
        }
    }
}

/// Plain text of a paragraph: the concatenation of its runs' text.
pub fn paragraph_text(paragraph: &XmlElement) -> String {
    paragraph_runs(paragraph).into_iter().map(run_text).collect()
}

/// Character standing for `w:noBreakHyphen` in run text.
pub const NON_BREAKING_HYPHEN: char = '\u{2011}';

/// Character standing for `w:softHyphen` in run text.
pub const SOFT_HYPHEN: char = '\u{00AD}';

/// Text of a run.
///
/// `w:t` contributes its characters, `w:tab` a tab, `w:br`/`w:cr` a newline.
/// Hyphen elements map to [`NON_BREAKING_HYPHEN`] and [`SOFT_HYPHEN`] so
/// that [`set_run_text`] can write them back.
pub fn run_text(run: &XmlElement) -> String {
    let mut out = String::new();
    for child in run.elements() {
        match child.local_name() {
            "t" => out.push_str(&child.text_content()),
            "tab" => out.push('\t'),
            "br" | "cr" => out.push('\n'),
            "noBreakHyphen" => out.push(NON_BREAKING_HYPHEN),
            "softHyphen" => out.push(SOFT_HYPHEN),
            _ => {}
        }
    }
    out
}

/// Replace the text of a run, keeping `w:rPr` and any non-text children.
///
/// The new content takes the place of the run's first text child, so it
/// keeps its position relative to drawings and field characters.
pub fn set_run_text(run: &mut XmlElement, text: &str) {
    let mut at = None;
    let mut kept = Vec::with_capacity(run.children.len());
    for node in std::mem::take(&mut run.children) {
        match node {
            XmlNode::Element(e) if RUN_CONTENT.contains(&e.local_name()) => {
                at.get_or_insert(kept.len());
            }
            XmlNode::Element(e) => kept.push(XmlNode::Element(e)),
            _ => {}
        }
    }

    let at = at.unwrap_or(kept.len());
    kept.splice(at..at, text_content_nodes(text));
    run.children = kept;
}

fn text_content_nodes(text: &str) -> Vec<XmlNode> {
    let mut nodes = Vec::new();
    let mut segment = String::new();
    for ch in text.chars() {
        let special = match ch {
            '\t' => "w:tab",
            '\n' => "w:br",
            NON_BREAKING_HYPHEN => "w:noBreakHyphen",
            SOFT_HYPHEN => "w:softHyphen",
            _ => {
                segment.push(ch);
                continue;
            }
        };
        flush_segment(&mut nodes, &mut segment);
        nodes.push(XmlNode::Element(XmlElement::new(special)));
    }
    flush_segment(&mut nodes, &mut segment);
    nodes
}

fn flush_segment(nodes: &mut Vec<XmlNode>, segment: &mut String) {
    if segment.is_empty() {
        return;
    }
    let t = XmlElement::new("w:t")
        .with_attr("xml:space", "preserve")
        .with_text(std::mem::take(segment));
    nodes.push(XmlNode::Element(t));
}

/// Create an unformatted run holding `text`.
pub fn new_run(text: &str) -> XmlElement {
    let mut run = XmlElement::new("w:r");
    set_run_text(&mut run, text);
    run
}

/// Mutable handle on a `w:r` element for the substitution engine.
pub struct RunElement<'a>(pub &'a mut XmlElement);

impl RunText for RunElement<'_> {
    fn text(&self) -> String {
        run_text(self.0)
    }

    fn set_text(&mut self, text: &str) {
        set_run_text(self.0, text);
    }
}
