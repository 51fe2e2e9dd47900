//! DOCX parsing module.

mod extractor;
mod options;
pub mod package;
pub mod wordml;
pub mod xml;

pub use extractor::{extract, extract_with_options, StyleNames};
pub use options::{ErrorMode, ExtractOptions};
pub use package::DocxPackage;
pub use xml::{XmlDocument, XmlElement, XmlNode};
