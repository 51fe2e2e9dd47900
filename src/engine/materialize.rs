//! Publish-time materialization: writing placeholders and loop markers
//! into a working copy of the source document.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::mapping::{LoopCell, Mapping, TableLoopMapping};
use crate::parser::package::DocxPackage;
use crate::parser::wordml::{
    body_paragraph_mut, body_table_mut, cell_paragraphs_mut, new_run, paragraph_runs_mut,
    paragraph_text, row_cell_mut, table_row_mut,
};
use crate::parser::xml::{XmlElement, XmlNode};

use super::expand::loop_marker;
use super::substitute::{substitute, RunText};

/// What to do when a mapping cannot be applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterializePolicy {
    /// Apply what can be applied and report the rest
    #[default]
    SkipAndReport,
    /// Fail on the first mapping that cannot be applied
    AbortAll,
}

/// Options for materialization.
#[derive(Debug, Clone, Default)]
pub struct MaterializeOptions {
    /// Failure policy
    pub policy: MaterializePolicy,
}

impl MaterializeOptions {
    /// Create default options (skip and report).
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort on the first failing mapping.
    pub fn abort_on_failure(mut self) -> Self {
        self.policy = MaterializePolicy::AbortAll;
        self
    }
}

/// Result of applying one mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Placeholder or markers written
    Applied,
    /// Mapping skipped
    Failed {
        /// Why the mapping could not be applied
        reason: String,
    },
}

/// Outcome of one mapping, in application order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingOutcome {
    /// Position of the mapping in the list
    pub position: usize,
    /// Field name the mapping introduces
    pub target: String,
    /// Human-readable location
    pub location: String,
    /// What happened
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl MappingOutcome {
    /// Check if the mapping was applied.
    pub fn is_applied(&self) -> bool {
        self.status == OutcomeStatus::Applied
    }
}

/// Per-mapping success/failure list of one materialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterializeReport {
    /// One outcome per mapping
    pub outcomes: Vec<MappingOutcome>,
}

impl MaterializeReport {
    /// Number of mappings applied.
    pub fn applied_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_applied()).count()
    }

    /// Outcomes of mappings that failed.
    pub fn failures(&self) -> impl Iterator<Item = &MappingOutcome> {
        self.outcomes.iter().filter(|o| !o.is_applied())
    }

    /// Check if every mapping was applied.
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(MappingOutcome::is_applied)
    }
}

/// Apply `mappings` to the package's main document, in list order.
///
/// Paragraph and table-cell mappings replace the first occurrence of their
/// original text with `{{label}}`; loop mappings write
/// `__LOOP__<var>__<label>__` into each mapped cell of the template row.
///
/// With [`MaterializePolicy::AbortAll`] the first failure is returned as an
/// error and the (partially edited) package must be discarded.
pub fn materialize(
    package: &mut DocxPackage,
    mappings: &[Mapping],
    options: &MaterializeOptions,
) -> Result<MaterializeReport> {
    let body = package.body_mut()?;
    let mut report = MaterializeReport::default();

    for (position, mapping) in mappings.iter().enumerate() {
        let status = match apply(body, mapping) {
            Ok(()) => OutcomeStatus::Applied,
            Err(err) if options.policy == MaterializePolicy::AbortAll => return Err(err),
            Err(err) => {
                log::warn!("Skipping mapping {} ({}): {}", position, mapping.field_name(), err);
                OutcomeStatus::Failed {
                    reason: err.to_string(),
                }
            }
        };
        report.outcomes.push(MappingOutcome {
            position,
            target: mapping.field_name().to_string(),
            location: mapping.location(),
            status,
        });
    }

    log::info!(
        "Materialized {}/{} mapping(s)",
        report.applied_count(),
        report.outcomes.len()
    );
    Ok(report)
}

fn apply(body: &mut XmlElement, mapping: &Mapping) -> Result<()> {
    match mapping {
        Mapping::Paragraph(m) => {
            let paragraph = body_paragraph_mut(body, m.paragraph_index)
                .ok_or_else(|| Error::LocationOutOfRange(mapping.location()))?;
            let placeholder = crate::mapping::placeholder(&m.label);
            if substitute(&mut paragraph_runs_mut(paragraph), &m.original_text, &placeholder) {
                Ok(())
            } else {
                Err(Error::TextNotFound {
                    label: m.label.clone(),
                    location: mapping.location(),
                })
            }
        }
        Mapping::TableCell(m) => {
            let cell = locate_cell(body, m.table_index, m.row_index, m.col_index)
                .ok_or_else(|| Error::LocationOutOfRange(mapping.location()))?;
            let placeholder = crate::mapping::placeholder(&m.label);
            if substitute_in_cell(cell, &m.original_text, &placeholder) {
                Ok(())
            } else {
                Err(Error::TextNotFound {
                    label: m.label.clone(),
                    location: mapping.location(),
                })
            }
        }
        Mapping::TableLoop(m) => apply_loop(body, m, mapping),
    }
}

fn locate_cell(
    body: &mut XmlElement,
    table: usize,
    row: usize,
    col: usize,
) -> Option<&mut XmlElement> {
    let table = body_table_mut(body, table)?;
    let row = table_row_mut(table, row)?;
    row_cell_mut(row, col)
}

fn apply_loop(body: &mut XmlElement, m: &TableLoopMapping, mapping: &Mapping) -> Result<()> {
    let row = body_table_mut(body, m.table_index)
        .and_then(|table| table_row_mut(table, m.data_row_index))
        .ok_or_else(|| Error::LocationOutOfRange(mapping.location()))?;

    for cell_label in &m.cell_labels {
        let cell = row_cell_mut(row, cell_label.col_index).ok_or_else(|| {
            Error::LocationOutOfRange(format!("{} col {}", mapping.location(), cell_label.col_index))
        })?;
        mark_loop_cell(cell, &m.loop_variable, cell_label, mapping)?;
    }
    Ok(())
}

fn mark_loop_cell(
    cell: &mut XmlElement,
    loop_variable: &str,
    cell_label: &LoopCell,
    mapping: &Mapping,
) -> Result<()> {
    let marker = loop_marker(loop_variable, &cell_label.label);

    if cell_label.original_text.is_empty() {
        fill_cell(cell, &marker);
        return Ok(());
    }

    if substitute_in_cell(cell, &cell_label.original_text, &marker) {
        Ok(())
    } else {
        Err(Error::TextNotFound {
            label: format!("{}.{}", loop_variable, cell_label.label),
            location: format!("{} col {}", mapping.location(), cell_label.col_index),
        })
    }
}

/// Substitute in the first paragraph of the cell that contains `target`.
fn substitute_in_cell(cell: &mut XmlElement, target: &str, replacement: &str) -> bool {
    cell_paragraphs_mut(cell).any(|p| substitute(&mut paragraph_runs_mut(p), target, replacement))
}

/// Replace the entire text of a cell with `text`, keeping the first run's
/// formatting.
fn fill_cell(cell: &mut XmlElement, text: &str) {
    if cell_paragraphs_mut(cell).next().is_none() {
        cell.children.push(XmlNode::Element(XmlElement::new("w:p")));
    }

    // The marker goes to the first paragraph with text, else the first one.
    let target = cell
        .children_named("p")
        .position(|p| !paragraph_text(p).is_empty())
        .unwrap_or(0);

    for (index, paragraph) in cell_paragraphs_mut(cell).enumerate() {
        let mut runs = paragraph_runs_mut(paragraph);
        if index == target && runs.is_empty() {
            drop(runs);
            paragraph.children.push(XmlNode::Element(new_run(text)));
            continue;
        }
        for (i, run) in runs.iter_mut().enumerate() {
            run.set_text(if index == target && i == 0 { text } else { "" });
        }
    }
}
