//! Error types for the ferd-core library.

use thiserror::Error;

/// Main error type for the ferd library.
#[derive(Error, Debug)]
pub enum FerdError {
    /// Container (PDF) reading error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Invoice extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while reading embedded attachments out of a PDF container.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// The PDF is encrypted with a non-empty password.
    #[error("PDF is encrypted")]
    Encrypted,

    /// An embedded file specification could not be read.
    #[error("failed to read embedded file {name}: {reason}")]
    EmbeddedFile { name: String, reason: String },
}

/// Terminal failures of the extraction pipeline.
///
/// Missing invoice fields are never reported here; they surface as
/// `None` values on the extracted invoice.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// No attachment with an XML file name was found.
    #[error("no invoice data: no XML attachment found")]
    NoAttachmentFound,

    /// The attachment bytes are not valid UTF-8.
    #[error("attachment is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// The attachment text is not well-formed XML.
    #[error("malformed XML: {0}")]
    MalformedXml(#[from] roxmltree::Error),
}

/// Failure of a single location candidate.
///
/// These never leave the field resolver: a failing candidate is treated
/// as "no match" and the next candidate is tried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CandidateError {
    /// The expression references a namespace prefix the schema table does not define.
    #[error("unknown namespace prefix '{0}'")]
    UnknownPrefix(String),

    /// The expression could not be parsed.
    #[error("invalid path expression '{path}': {reason}")]
    Syntax { path: String, reason: String },
}

/// Result type for the ferd library.
pub type Result<T> = std::result::Result<T, FerdError>;
