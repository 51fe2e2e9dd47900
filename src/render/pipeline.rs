//! The render path: payload gating, loop expansion, placeholder
//! resolution and best-effort conversion.

use std::cmp::Reverse;

use serde_json::{Map, Value};

use crate::convert::DocumentConverter;
use crate::engine::expand;
use crate::error::{Error, Result};
use crate::mapping::{derive, validate_payload, Mapping};
use crate::parser::package::DocxPackage;
use crate::parser::wordml::body_table_mut;

use super::engine::TemplateEngine;
use super::options::RenderOptions;
use super::result::{RenderStats, RenderedDocument};

/// Render a materialized template with live data.
///
/// The payload is checked against the schema derived from `mappings`
/// before the document is touched, so a missing required field never
/// yields partial output. Scalar placeholders are resolved by `engine` first,
/// with loop variables removed from its context, so text that loop items
/// bring in is never read as template syntax. Loops are expanded after. When
/// [`RenderOptions::convert_pdf`] is set, `converter` runs best-effort: its
/// failure (or absence) yields [`RenderStatus::DocxOnly`](super::RenderStatus::DocxOnly).
pub fn render(
    template: &[u8],
    mappings: &[Mapping],
    data: &Map<String, Value>,
    engine: &dyn TemplateEngine,
    converter: Option<&dyn DocumentConverter>,
    options: &RenderOptions,
) -> Result<RenderedDocument> {
    let fields = derive(mappings);
    validate_payload(&fields, data)?;

    let mut package = DocxPackage::from_bytes(template)?;
    let mut stats = RenderStats::new();

    let mut context = data.clone();
    for mapping in mappings {
        if let Mapping::TableLoop(m) = mapping {
            context.remove(&m.loop_variable);
        }
    }

    let resolved = engine.render(&mut package, &context)?;
    if options.collect_stats {
        stats.placeholders_resolved = resolved as u32;
    }

    expand_loops(&mut package, mappings, data, options, &mut stats)?;

    let docx = package.to_bytes()?;
    let rendered = RenderedDocument::docx(docx, stats);

    if !options.convert_pdf {
        return Ok(rendered);
    }

    let Some(converter) = converter else {
        log::warn!("PDF requested but no converter is configured");
        return Ok(rendered.with_conversion_error("no converter configured"));
    };

    match converter.convert_bytes(&rendered.docx) {
        Ok(pdf) => {
            log::info!("Converted with {} ({} bytes)", converter.name(), pdf.len());
            Ok(rendered.with_pdf(pdf))
        }
        Err(e) => {
            log::warn!("PDF conversion failed, returning DOCX only: {}", e);
            Ok(rendered.with_conversion_error(e.to_string()))
        }
    }
}

fn expand_loops(
    package: &mut DocxPackage,
    mappings: &[Mapping],
    data: &Map<String, Value>,
    options: &RenderOptions,
    stats: &mut RenderStats,
) -> Result<()> {
    let body = package.body_mut()?;

    // Bottom rows first within a table, so inserted rows never shift a
    // template row that is still waiting.
    let mut loops: Vec<_> = mappings
        .iter()
        .filter_map(|mapping| match mapping {
            Mapping::TableLoop(m) => Some((mapping, m)),
            _ => None,
        })
        .collect();
    loops.sort_by_key(|(_, m)| (m.table_index, Reverse(m.data_row_index)));

    for (mapping, m) in loops {

        let items: &[Value] = match data.get(&m.loop_variable) {
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(Error::InvalidPayload(format!(
                    "'{}' must be an array",
                    m.loop_variable
                )))
            }
            None => &[],
        };

        let Some(table) = body_table_mut(body, m.table_index) else {
            if options.strict_loops {
                return Err(Error::LocationOutOfRange(mapping.location()));
            }
            log::warn!(
                "Skipping loop '{}': table {} not found",
                m.loop_variable,
                m.table_index
            );
            continue;
        };

        let inserted = expand(
            table,
            m.data_row_index,
            &m.loop_variable,
            &m.cell_labels,
            items,
        )?;

        if options.collect_stats {
            stats.loops_expanded += 1;
            stats.rows_inserted += inserted as u32;
            if items.is_empty() {
                stats.empty_loops += 1;
            }
        }
    }
    Ok(())
}
