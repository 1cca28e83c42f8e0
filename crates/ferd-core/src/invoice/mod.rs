//! ZUGFeRD invoice extraction.
//!
//! The pipeline runs in four stages, each in its own module:
//!
//! 1. [`locator`] picks the invoice attachment out of a container
//! 2. [`version`] decodes, parses and classifies it as generation 1 or 2
//! 3. [`resolver`] looks up every field through the [`catalog`] candidates
//! 4. [`pipeline`] ties the stages together into an [`ExtractedInvoice`]

pub mod catalog;
pub mod locator;
pub mod path;
mod pipeline;
pub mod resolver;
pub mod version;

pub use catalog::{LocationCandidate, ValueSource, candidates_for};
pub use locator::{locate, locate_with_suffix};
pub use pipeline::{ZugferdExtractor, extract};
pub use resolver::FieldResolver;
pub use version::detect_version;

use crate::error::ExtractionError;
use crate::models::attachment::EmbeddedAttachment;
use crate::models::invoice::ExtractedInvoice;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Trait for invoice extractors.
pub trait InvoiceExtractor {
    /// Extract invoice data from a container's embedded attachments.
    fn extract(&self, attachments: &[EmbeddedAttachment]) -> Result<ExtractedInvoice>;
}
