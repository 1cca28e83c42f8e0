//! Core library for ZUGFeRD e-invoice extraction.
//!
//! This crate provides:
//! - Reading embedded attachments out of PDF/A-3 containers
//! - Selecting the invoice XML attachment
//! - Schema generation detection (ZUGFeRD 1.0 vs. 2.x / Factur-X)
//! - Field resolution through ordered, version-specific location candidates

pub mod error;
pub mod invoice;
pub mod models;
#[cfg(feature = "pdf")]
pub mod pdf;

pub use error::{CandidateError, ExtractionError, FerdError, PdfError, Result};
pub use invoice::{FieldResolver, InvoiceExtractor, ZugferdExtractor, detect_version, extract, locate};
pub use models::attachment::EmbeddedAttachment;
pub use models::config::{ExtractionConfig, FerdConfig, OutputConfig};
pub use models::invoice::{ExtractedInvoice, FieldAttribute, FieldName, ResolvedField, SchemaVersion};
#[cfg(feature = "pdf")]
pub use pdf::{AttachmentSource, PdfAttachmentReader, XmlFileSource};
