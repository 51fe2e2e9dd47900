//! # docxmap
//!
//! Turn ordinary DOCX documents into fill-in templates.
//!
//! A caller extracts the navigable structure of a document, selects spans
//! of text and maps them to variables. Publishing writes `{{label}}`
//! placeholders (and `__LOOP__<var>__<label>__` markers for repeating table
//! rows) into a copy of the document without disturbing run formatting.
//! Rendering fills that copy with live data.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docxmap::{extract_file, materialize_bytes, render_bytes, MappingRegistry, MaterializeOptions};
//! use serde_json::json;
//!
//! fn main() -> docxmap::Result<()> {
//!     // Inspect the source document
//!     let structure = extract_file("contract.docx")?;
//!     println!("{} paragraphs", structure.total_paragraphs());
//!
//!     // Map a span to a variable and publish
//!     let mappings = MappingRegistry::from_json(
//!         r#"[{"label": "customer_name", "paragraph_index": 2, "original_text": "Nguyễn Văn A"}]"#,
//!     )?;
//!     let source = std::fs::read("contract.docx")?;
//!     let (template, report) = materialize_bytes(&source, &mappings, &MaterializeOptions::default())?;
//!     assert!(report.is_complete());
//!
//!     // Fill it
//!     let data = json!({"customer_name": "Trần Bình"});
//!     let rendered = render_bytes(&template, &mappings, data.as_object().unwrap())?;
//!     std::fs::write("filled.docx", rendered.docx)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Structure extraction**: body paragraphs with run formatting, tables as rows of cells
//! - **Run-level substitution**: spans crossing run boundaries keep each run's formatting
//! - **Table loops**: one row per array item, cloned from a template row
//! - **Schema derivation**: the field list render input must satisfy
//! - **Best-effort PDF**: conversion through headless LibreOffice never fails a render

pub mod convert;
pub mod detect;
pub mod engine;
pub mod error;
pub mod mapping;
pub mod model;
pub mod parser;
pub mod render;
pub mod store;

// Re-export commonly used types
pub use convert::{ConvertOptions, DocumentConverter, LibreOfficeConverter};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_docx, DocxFormat};
pub use engine::{
    MappingOutcome, MaterializeOptions, MaterializePolicy, MaterializeReport, OutcomeStatus,
};
pub use error::{Error, Result};
pub use mapping::{FieldType, Mapping, MappingRegistry, SchemaField};
pub use model::{
    Alignment, DocumentStructure, Paragraph, Table, TableCell, TableRow, TextRun, TextStyle,
};
pub use parser::{DocxPackage, ExtractOptions};
pub use render::{
    JsonFormat, PlaceholderEngine, RenderOptions, RenderStatus, RenderedDocument, TemplateEngine,
};
pub use store::{InMemoryStore, TemplateDesigner, TemplateStatus, TemplateStore};

use serde_json::{Map, Value};
use std::path::Path;

/// Extract the structure of a DOCX file.
///
/// # Example
///
/// ```no_run
/// use docxmap::extract_file;
///
/// let doc = extract_file("contract.docx").unwrap();
/// for p in &doc.paragraphs {
///     println!("{}: {}", p.index, p.text);
/// }
/// ```
pub fn extract_file<P: AsRef<Path>>(path: P) -> Result<DocumentStructure> {
    let package = DocxPackage::open(path)?;
    parser::extract(&package)
}

/// Extract the structure of a DOCX file with custom options.
pub fn extract_file_with_options<P: AsRef<Path>>(
    path: P,
    options: &ExtractOptions,
) -> Result<DocumentStructure> {
    let package = DocxPackage::open(path)?;
    parser::extract_with_options(&package, options)
}

/// Extract the structure of a DOCX held in memory.
pub fn extract_bytes(data: &[u8]) -> Result<DocumentStructure> {
    let package = DocxPackage::from_bytes(data)?;
    parser::extract(&package)
}

/// Extract plain text from a DOCX file.
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let doc = extract_file(path)?;
    Ok(render::to_text(&doc))
}

/// Extract the structure of a DOCX file as JSON.
///
/// # Example
///
/// ```no_run
/// use docxmap::{to_json, JsonFormat};
///
/// let json = to_json("contract.docx", JsonFormat::Pretty).unwrap();
/// std::fs::write("structure.json", json).unwrap();
/// ```
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let doc = extract_file(path)?;
    render::to_json(&doc, format)
}

/// Publish a source document: write placeholders and loop markers for
/// every mapping and return the materialized DOCX with its report.
pub fn materialize_bytes(
    source: &[u8],
    mappings: &MappingRegistry,
    options: &MaterializeOptions,
) -> Result<(Vec<u8>, MaterializeReport)> {
    let mut package = DocxPackage::from_bytes(source)?;
    let report = engine::materialize(&mut package, mappings.as_slice(), options)?;
    Ok((package.to_bytes()?, report))
}

/// Render a materialized template with the built-in placeholder engine.
///
/// No PDF is produced; use [`render::render`] with a converter for that.
pub fn render_bytes(
    template: &[u8],
    mappings: &MappingRegistry,
    data: &Map<String, Value>,
) -> Result<RenderedDocument> {
    render::render(
        template,
        mappings.as_slice(),
        data,
        &PlaceholderEngine::new(),
        None,
        &RenderOptions::default(),
    )
}

/// Builder for extracting and publishing DOCX documents.
///
/// # Example
///
/// ```no_run
/// use docxmap::DocxMap;
///
/// let json = DocxMap::new()
///     .lenient()
///     .text_only()
///     .parse("contract.docx")?
///     .to_json(docxmap::JsonFormat::Compact)?;
/// # Ok::<(), docxmap::Error>(())
/// ```
pub struct DocxMap {
    extract_options: ExtractOptions,
    materialize_options: MaterializeOptions,
}

impl DocxMap {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            extract_options: ExtractOptions::default(),
            materialize_options: MaterializeOptions::default(),
        }
    }

    /// Ignore malformed auxiliary parts.
    pub fn lenient(mut self) -> Self {
        self.extract_options = self.extract_options.lenient();
        self
    }

    /// Extract text only (no run formatting).
    pub fn text_only(mut self) -> Self {
        self.extract_options = self.extract_options.text_only();
        self
    }

    /// Enable or disable style name resolution.
    pub fn with_style_names(mut self, resolve: bool) -> Self {
        self.extract_options = self.extract_options.with_style_names(resolve);
        self
    }

    /// Fail publishing on the first mapping that cannot be applied.
    pub fn abort_on_failure(mut self) -> Self {
        self.materialize_options = self.materialize_options.abort_on_failure();
        self
    }

    /// Open a DOCX file.
    pub fn parse<P: AsRef<Path>>(self, path: P) -> Result<DocxMapResult> {
        let package = DocxPackage::open(path)?;
        self.finish(package)
    }

    /// Open a DOCX from bytes.
    pub fn parse_bytes(self, data: &[u8]) -> Result<DocxMapResult> {
        let package = DocxPackage::from_bytes(data)?;
        self.finish(package)
    }

    fn finish(self, package: DocxPackage) -> Result<DocxMapResult> {
        let structure = parser::extract_with_options(&package, &self.extract_options)?;
        Ok(DocxMapResult {
            package,
            structure,
            materialize_options: self.materialize_options,
        })
    }
}

impl Default for DocxMap {
    fn default() -> Self {
        Self::new()
    }
}

/// An opened document with its extracted structure.
pub struct DocxMapResult {
    package: DocxPackage,
    /// The extracted structure
    pub structure: DocumentStructure,
    materialize_options: MaterializeOptions,
}

impl DocxMapResult {
    /// Convert the structure to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.structure, format)
    }

    /// Convert the structure to plain text.
    pub fn to_text(&self) -> String {
        render::to_text(&self.structure)
    }

    /// Get the structure.
    pub fn structure(&self) -> &DocumentStructure {
        &self.structure
    }

    /// Get the package.
    pub fn package(&self) -> &DocxPackage {
        &self.package
    }

    /// Check mappings against this document before publishing.
    pub fn check(&self, mappings: &MappingRegistry) -> Result<()> {
        mappings
            .iter()
            .try_for_each(|m| mapping::check_against(m, &self.structure))
    }

    /// Materialize a copy of the document with `mappings`.
    pub fn materialize(&self, mappings: &MappingRegistry) -> Result<(Vec<u8>, MaterializeReport)> {
        let mut package = self.package.clone();
        let report = engine::materialize(&mut package, mappings.as_slice(), &self.materialize_options)?;
        Ok((package.to_bytes()?, report))
    }
}
