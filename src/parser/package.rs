//! DOCX package reading and writing.

use std::io::{Cursor, Read, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::detect::{has_zip_magic, MAIN_PART};
use crate::error::{Error, Result};

use super::xml::{XmlDocument, XmlElement};

/// A raw entry of the container, kept byte-for-byte.
#[derive(Debug, Clone)]
struct PackageEntry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
}

/// An opened DOCX container.
///
/// Every entry is held in memory in its original order. The main document
/// part is additionally parsed into an editable tree and re-serialized
/// when the package is written; all other parts are copied unchanged.
#[derive(Debug, Clone)]
pub struct DocxPackage {
    entries: Vec<PackageEntry>,
    main_index: usize,
    document: XmlDocument,
}

impl DocxPackage {
    /// Open a DOCX file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Read a DOCX from a reader.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }

    /// Read a DOCX from bytes.
    ///
    /// Fails with [`Error::UnreadableDocument`] when the bytes are not a ZIP
    /// archive, the archive has no `word/document.xml`, or that part is not
    /// well-formed XML with a `w:body`.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if !has_zip_magic(data) {
            return Err(Error::UnreadableDocument(
                "not a ZIP container".to_string(),
            ));
        }

        let mut archive = ZipArchive::new(Cursor::new(data)).map_err(unreadable)?;
        let mut entries = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i).map_err(unreadable)?;
            if file.is_dir() {
                continue;
            }
            let mut buf = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut buf)?;
            entries.push(PackageEntry {
                name: file.name().to_string(),
                data: buf,
                compression: file.compression(),
            });
        }

        let main_index = entries
            .iter()
            .position(|e| e.name == MAIN_PART)
            .ok_or_else(|| Error::UnreadableDocument(format!("missing {} part", MAIN_PART)))?;

        let document = XmlDocument::parse(&entries[main_index].data)
            .map_err(|e| Error::UnreadableDocument(format!("{}: {}", MAIN_PART, e)))?;

        if document.root.child("body").is_none() {
            return Err(Error::UnreadableDocument(
                "main document part has no body".to_string(),
            ));
        }

        log::debug!(
            "Opened DOCX package with {} entries ({} bytes)",
            entries.len(),
            data.len()
        );

        Ok(Self {
            entries,
            main_index,
            document,
        })
    }

    /// The parsed main document part.
    pub fn document(&self) -> &XmlDocument {
        &self.document
    }

    /// The parsed main document part, mutably.
    pub fn document_mut(&mut self) -> &mut XmlDocument {
        &mut self.document
    }

    /// The `w:body` element.
    pub fn body(&self) -> Result<&XmlElement> {
        self.document
            .root
            .child("body")
            .ok_or_else(|| Error::UnreadableDocument("main document part has no body".to_string()))
    }

    /// The `w:body` element, mutably.
    pub fn body_mut(&mut self) -> Result<&mut XmlElement> {
        self.document
            .root
            .child_mut("body")
            .ok_or_else(|| Error::UnreadableDocument("main document part has no body".to_string()))
    }

    /// Raw bytes of a part other than the main document.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.data.as_slice())
    }

    /// Names of all parts in container order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Write the package, with the current main document tree, to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        for (i, entry) in self.entries.iter().enumerate() {
            let method = match entry.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = SimpleFileOptions::default().compression_method(method);
            writer.start_file(entry.name.as_str(), options)?;
            if i == self.main_index {
                writer.write_all(&self.document.to_bytes())?;
            } else {
                writer.write_all(&entry.data)?;
            }
        }

        Ok(writer.finish()?.into_inner())
    }

    /// Write the package to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}

fn unreadable(err: zip::result::ZipError) -> Error {
    Error::UnreadableDocument(err.to_string())
}
