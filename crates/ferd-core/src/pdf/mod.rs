//! Container reading: embedded attachments of a PDF, or a bare XML file.

mod reader;

pub use reader::PdfAttachmentReader;

use std::path::Path;

use tracing::debug;

use crate::error::PdfError;
use crate::models::attachment::EmbeddedAttachment;

/// Result type for container operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Anything that can enumerate embedded attachments.
pub trait AttachmentSource {
    /// Attachments in container enumeration order.
    fn attachments(&self) -> Result<Vec<EmbeddedAttachment>>;
}

/// A standalone XML invoice, presented as a single attachment.
#[derive(Debug, Clone)]
pub struct XmlFileSource {
    attachment: EmbeddedAttachment,
}

impl XmlFileSource {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            attachment: EmbeddedAttachment::new(name, bytes),
        }
    }

    /// Read an XML file from disk.
    pub fn from_path(path: &Path) -> crate::Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::new(file_name(path), bytes))
    }
}

impl AttachmentSource for XmlFileSource {
    fn attachments(&self) -> Result<Vec<EmbeddedAttachment>> {
        Ok(vec![self.attachment.clone()])
    }
}

/// Open `path` as a PDF container or, failing the `%PDF` signature, as bare XML.
pub fn open(path: &Path) -> crate::Result<Box<dyn AttachmentSource>> {
    let bytes = std::fs::read(path)?;
    if is_pdf(&bytes) {
        debug!("Opening {} as PDF", path.display());
        Ok(Box::new(PdfAttachmentReader::from_bytes(&bytes)?))
    } else {
        debug!("Opening {} as standalone XML", path.display());
        Ok(Box::new(XmlFileSource::new(file_name(path), bytes)))
    }
}

/// Whether `data` starts with the PDF header (leading whitespace allowed).
pub fn is_pdf(data: &[u8]) -> bool {
    let start = data
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    data[start..].starts_with(b"%PDF")
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
