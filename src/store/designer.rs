//! The template lifecycle service.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::convert::DocumentConverter;
use crate::engine::{materialize, MaterializeOptions, MaterializeReport};
use crate::error::{Error, Result};
use crate::mapping::{self, check_against, Mapping, MappingRegistry, SchemaField};
use crate::model::DocumentStructure;
use crate::parser::{extract, DocxPackage};
use crate::render::{self, PlaceholderEngine, RenderOptions, RenderedDocument, TemplateEngine};

use super::{TemplateInfo, TemplateRecord, TemplateStatus, TemplateStore};

/// Field list of a template as exposed to form builders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSchema {
    /// Template id
    pub template_id: Uuid,
    /// Template name
    pub template_name: String,
    /// Lifecycle state
    pub status: TemplateStatus,
    /// Fields render input must satisfy
    pub fields: Vec<SchemaField>,
}

/// Draft/published lifecycle over an injected [`TemplateStore`].
///
/// Mapping writes are accepted only while a template is a draft.
/// Publishing materializes the source document with the full mapping list
/// and freezes it; rendering only ever reads the materialized copy.
pub struct TemplateDesigner<S: TemplateStore> {
    store: S,
    engine: Box<dyn TemplateEngine>,
    converter: Option<Box<dyn DocumentConverter>>,
    materialize_options: MaterializeOptions,
    render_options: RenderOptions,
}

impl<S: TemplateStore> TemplateDesigner<S> {
    /// Create a designer with the built-in placeholder engine and no
    /// converter.
    pub fn new(store: S) -> Self {
        Self {
            store,
            engine: Box::new(PlaceholderEngine::new()),
            converter: None,
            materialize_options: MaterializeOptions::default(),
            render_options: RenderOptions::default(),
        }
    }

    /// Use another template engine.
    pub fn with_engine(mut self, engine: impl TemplateEngine + 'static) -> Self {
        self.engine = Box::new(engine);
        self
    }

    /// Enable PDF conversion with the given converter.
    pub fn with_converter(mut self, converter: impl DocumentConverter + 'static) -> Self {
        self.converter = Some(Box::new(converter));
        self.render_options.convert_pdf = true;
        self
    }

    /// Set publish-time options.
    pub fn with_materialize_options(mut self, options: MaterializeOptions) -> Self {
        self.materialize_options = options;
        self
    }

    /// Set render options.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the designer and return the store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Register a source document as a new draft template.
    pub fn create_template(&mut self, name: impl Into<String>, source: Vec<u8>) -> Result<TemplateInfo> {
        DocxPackage::from_bytes(&source)?;
        let record = TemplateRecord::new(name, source);
        let info = record.info();
        self.store.insert(record)?;
        log::info!("template_created {} ({})", info.id, info.name);
        Ok(info)
    }

    /// Summary of a template.
    pub fn get(&self, id: &Uuid) -> Result<TemplateInfo> {
        Ok(self.load(id)?.info())
    }

    /// Summaries of all templates.
    pub fn list(&self) -> Result<Vec<TemplateInfo>> {
        self.store.list()
    }

    /// Delete a template.
    pub fn delete(&mut self, id: &Uuid) -> Result<()> {
        if !self.store.delete(id)? {
            return Err(Error::TemplateNotFound(id.to_string()));
        }
        log::info!("template_deleted {}", id);
        Ok(())
    }

    /// Structure of the source document, derived on every call.
    pub fn structure(&self, id: &Uuid) -> Result<DocumentStructure> {
        let record = self.load(id)?;
        extract(&DocxPackage::from_bytes(&record.source)?)
    }

    /// Mappings of a template in application order.
    pub fn mappings(&self, id: &Uuid) -> Result<MappingRegistry> {
        Ok(self.load(id)?.mappings)
    }

    /// Validate and append a mapping given in JSON wire form.
    ///
    /// Returns the mapping's position.
    pub fn add_mapping(&mut self, id: &Uuid, raw: Value) -> Result<usize> {
        let mut record = self.load_draft(id)?;
        let mapping = mapping::validate(raw)?;
        let structure = extract(&DocxPackage::from_bytes(&record.source)?)?;

        let position = record.mappings.insert_checked(mapping, &structure)?;
        record.touch();
        self.store.update(record)?;
        log::info!("mapping_created {} #{}", id, position);
        Ok(position)
    }

    /// Update the mapping at `index` with the non-null fields of `changes`.
    ///
    /// Returns the previous mapping.
    pub fn update_mapping(&mut self, id: &Uuid, index: usize, changes: Value) -> Result<Mapping> {
        let mut record = self.load_draft(id)?;
        let current = record
            .mappings
            .get(index)
            .ok_or_else(|| Error::LocationOutOfRange(format!("mapping {}", index)))?;

        let Value::Object(changes) = changes else {
            return Err(Error::RejectedMapping(
                "mapping update must be a JSON object".to_string(),
            ));
        };
        let mut merged = match serde_json::to_value(current)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in changes {
            if !value.is_null() {
                merged.insert(key, value);
            }
        }

        let mapping = mapping::validate(Value::Object(merged))?;
        let structure = extract(&DocxPackage::from_bytes(&record.source)?)?;
        check_against(&mapping, &structure)?;

        let previous = record.mappings.replace(index, mapping)?;
        record.touch();
        self.store.update(record)?;
        log::info!("mapping_updated {} #{}", id, index);
        Ok(previous)
    }

    /// Remove the mapping at `index`.
    pub fn remove_mapping(&mut self, id: &Uuid, index: usize) -> Result<Mapping> {
        let mut record = self.load_draft(id)?;
        let removed = record
            .mappings
            .remove(index)
            .ok_or_else(|| Error::LocationOutOfRange(format!("mapping {}", index)))?;
        record.touch();
        self.store.update(record)?;
        log::info!("mapping_deleted {} #{}", id, index);
        Ok(removed)
    }

    /// Materialize the template and freeze its mappings.
    pub fn publish(&mut self, id: &Uuid) -> Result<MaterializeReport> {
        let mut record = self.load_draft(id)?;
        if record.mappings.is_empty() {
            return Err(Error::NoMappings(id.to_string()));
        }

        let mut package = DocxPackage::from_bytes(&record.source)?;
        let report = materialize(&mut package, record.mappings.as_slice(), &self.materialize_options)?;

        record.materialized = Some(package.to_bytes()?);
        record.status = TemplateStatus::Published;
        record.touch();
        self.store.update(record)?;

        log::info!(
            "template_published {} ({}/{} mappings applied)",
            id,
            report.applied_count(),
            report.outcomes.len()
        );
        Ok(report)
    }

    /// Schema render input must satisfy.
    pub fn schema(&self, id: &Uuid) -> Result<TemplateSchema> {
        let record = self.load(id)?;
        Ok(TemplateSchema {
            template_id: record.id,
            template_name: record.name,
            status: record.status,
            fields: mapping::derive(record.mappings.as_slice()),
        })
    }

    /// Render a published template.
    pub fn render(&self, id: &Uuid, data: &Map<String, Value>) -> Result<RenderedDocument> {
        let record = self.load(id)?;
        let template = match (&record.status, &record.materialized) {
            (TemplateStatus::Published, Some(bytes)) => bytes,
            _ => return Err(Error::TemplateNotPublished(id.to_string())),
        };

        let rendered = render::render(
            template,
            record.mappings.as_slice(),
            data,
            &*self.engine,
            self.converter.as_deref(),
            &self.render_options,
        )?;
        log::info!("document_rendered {} ({:?})", id, rendered.status);
        Ok(rendered)
    }

    fn load(&self, id: &Uuid) -> Result<TemplateRecord> {
        self.store
            .get(id)?
            .ok_or_else(|| Error::TemplateNotFound(id.to_string()))
    }

    fn load_draft(&self, id: &Uuid) -> Result<TemplateRecord> {
        let record = self.load(id)?;
        if record.is_published() {
            return Err(Error::TemplatePublished(id.to_string()));
        }
        Ok(record)
    }
}
