//! Error types for docxmap library.

use std::io;
use thiserror::Error;

/// Result type alias for docxmap operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while extracting, materializing or rendering.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The byte stream is not a well-formed DOCX container.
    #[error("Unreadable document: {0}")]
    UnreadableDocument(String),

    /// A document part is not well-formed XML.
    #[error("XML error: {0}")]
    Xml(String),

    /// A mapping failed schema validation at creation time.
    #[error("Rejected mapping: {0}")]
    RejectedMapping(String),

    /// A scalar label is already used by another mapping.
    #[error("Duplicate label: {0}")]
    DuplicateLabel(String),

    /// The original text occurs more than once at the mapping's location.
    #[error("Text '{text}' occurs {occurrences} times in {location}")]
    AmbiguousText {
        /// The selected text
        text: String,
        /// Human-readable location (e.g. "paragraph 3")
        location: String,
        /// Number of occurrences found
        occurrences: usize,
    },

    /// The substitution engine could not locate a mapping's original text.
    #[error("Text for '{label}' not found in {location}")]
    TextNotFound {
        /// Label or loop marker the mapping would have written
        label: String,
        /// Human-readable location
        location: String,
    },

    /// A paragraph, table, row or column index does not exist.
    #[error("Location out of range: {0}")]
    LocationOutOfRange(String),

    /// Render-time input omits a required scalar or loop key.
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    /// Render-time input has the wrong shape.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// The external converter failed. Never fatal for a render.
    #[error("Conversion failed: {0}")]
    ConversionFailed(String),

    /// No template is stored under the given id.
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    /// Mapping writes are rejected once a template is published.
    #[error("Template {0} is published; mappings are frozen")]
    TemplatePublished(String),

    /// Publishing requires at least one mapping.
    #[error("Template {0} has no mappings to publish")]
    NoMappings(String),

    /// Rendering requires a published template.
    #[error("Template {0} is not published")]
    TemplateNotPublished(String),

    /// Error while producing output.
    #[error("Rendering error: {0}")]
    Render(String),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            _ => Error::UnreadableDocument(err.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Render(format!("JSON serialization error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MissingRequiredField("customer_name".into());
        assert_eq!(err.to_string(), "Missing required field: customer_name");

        let err = Error::TextNotFound {
            label: "total".into(),
            location: "paragraph 4".into(),
        };
        assert_eq!(err.to_string(), "Text for 'total' not found in paragraph 4");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_zip_error_conversion() {
        let err: Error = zip::result::ZipError::InvalidArchive("bad".into()).into();
        assert!(matches!(err, Error::UnreadableDocument(_)));
    }
}
