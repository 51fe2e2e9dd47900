//! Document conversion to PDF through an external converter.
//!
//! Conversion is always best-effort from the render path's point of view:
//! a converter error degrades the render status but never fails it.
//!
//! # Example
//!
//! ```no_run
//! use docxmap::convert::{ConvertOptions, DocumentConverter, LibreOfficeConverter};
//!
//! fn main() -> docxmap::Result<()> {
//!     let converter = LibreOfficeConverter::new(ConvertOptions::new().with_program("libreoffice"));
//!     let docx = std::fs::read("filled.docx")?;
//!     let pdf = converter.convert_bytes(&docx)?;
//!     std::fs::write("filled.pdf", pdf)?;
//!     Ok(())
//! }
//! ```

mod libreoffice;

pub use libreoffice::LibreOfficeConverter;

use std::time::Duration;

use crate::error::Result;

/// Environment variable overriding the converter program.
pub const PROGRAM_ENV: &str = "DOCXMAP_SOFFICE";

/// Default limit on a single conversion.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Options for the external converter.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Converter executable
    pub program: String,

    /// Extra arguments passed before the conversion arguments
    pub extra_args: Vec<String>,

    /// How long a conversion may run before the process is killed
    pub timeout: Duration,
}

impl ConvertOptions {
    /// Create new conversion options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options with the program taken from `DOCXMAP_SOFFICE` when set.
    pub fn from_env() -> Self {
        match std::env::var(PROGRAM_ENV) {
            Ok(program) if !program.trim().is_empty() => Self::new().with_program(program),
            _ => Self::new(),
        }
    }

    /// Set the converter executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Set the conversion timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add an extra argument.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            program: "soffice".to_string(),
            extra_args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Trait for document converters.
///
/// Implement this trait to plug in another conversion backend.
pub trait DocumentConverter: Send + Sync {
    /// Get the name of this converter.
    fn name(&self) -> &str;

    /// Convert DOCX bytes to PDF bytes.
    ///
    /// Every failure is reported as [`Error::ConversionFailed`](crate::Error::ConversionFailed).
    fn convert_bytes(&self, docx: &[u8]) -> Result<Vec<u8>>;
}
