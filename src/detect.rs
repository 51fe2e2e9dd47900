//! DOCX container detection and validation.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

/// DOCX container information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocxFormat {
    /// Name of the main document part (normally `word/document.xml`)
    pub main_part: String,
    /// Number of entries in the container
    pub entry_count: usize,
    /// Whether `word/styles.xml` is present
    pub has_styles: bool,
}

impl std::fmt::Display for DocxFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DOCX ({} entries)", self.entry_count)
    }
}

/// ZIP local file header magic: PK\x03\x04
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Main document part inside a WordprocessingML package.
pub const MAIN_PART: &str = "word/document.xml";

/// Styles part inside a WordprocessingML package.
pub const STYLES_PART: &str = "word/styles.xml";

/// Check whether bytes start with the ZIP magic.
pub fn has_zip_magic(data: &[u8]) -> bool {
    data.starts_with(ZIP_MAGIC)
}

/// Detect a DOCX container from a file path.
///
/// # Example
/// ```no_run
/// use docxmap::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("contract.docx").unwrap();
/// println!("{}", format);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<DocxFormat> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    detect_format_from_bytes(&data)
}

/// Detect a DOCX container from its full byte content.
///
/// # Returns
/// * `Ok(DocxFormat)` if the data is a ZIP archive holding `word/document.xml`
/// * `Err(Error::UnreadableDocument)` otherwise
pub fn detect_format_from_bytes(data: &[u8]) -> Result<DocxFormat> {
    if !has_zip_magic(data) {
        return Err(Error::UnreadableDocument(
            "not a ZIP container".to_string(),
        ));
    }

    let archive = zip::ZipArchive::new(Cursor::new(data))?;
    let names: Vec<&str> = archive.file_names().collect();

    if !names.contains(&MAIN_PART) {
        return Err(Error::UnreadableDocument(format!(
            "missing {} part",
            MAIN_PART
        )));
    }

    Ok(DocxFormat {
        main_part: MAIN_PART.to_string(),
        entry_count: names.len(),
        has_styles: names.contains(&STYLES_PART),
    })
}

/// Check if a file is a DOCX container.
pub fn is_docx<P: AsRef<Path>>(path: P) -> bool {
    detect_format_from_path(path).is_ok()
}

/// Check if bytes represent a DOCX container.
pub fn is_docx_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok()
}
