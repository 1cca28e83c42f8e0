//! Extraction pipeline: attachment -> parsed XML -> schema version -> fields.

use tracing::{debug, info};

use crate::models::attachment::EmbeddedAttachment;
use crate::models::config::ExtractionConfig;
use crate::models::invoice::ExtractedInvoice;

use super::locator::{XML_SUFFIX, locate_with_suffix};
use super::resolver::FieldResolver;
use super::version::{decode, detect, parse};
use super::{InvoiceExtractor, Result};

/// ZUGFeRD / Factur-X extractor.
///
/// Holds no per-document state; one instance can serve any number of
/// `extract` calls, from any number of threads.
#[derive(Debug, Clone)]
pub struct ZugferdExtractor {
    /// Suffix identifying the invoice attachment.
    attachment_suffix: String,
    /// Whether documents with a DOCTYPE are accepted.
    allow_dtd: bool,
}

impl ZugferdExtractor {
    /// Create an extractor with default settings.
    pub fn new() -> Self {
        Self {
            attachment_suffix: XML_SUFFIX.to_string(),
            allow_dtd: false,
        }
    }

    /// Create an extractor from configuration.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new()
            .with_attachment_suffix(config.attachment_suffix.clone())
            .with_dtd(config.allow_dtd)
    }

    /// Set the attachment name suffix.
    pub fn with_attachment_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.attachment_suffix = suffix.into();
        self
    }

    /// Allow or reject documents carrying a DOCTYPE.
    pub fn with_dtd(mut self, allow: bool) -> Self {
        self.allow_dtd = allow;
        self
    }
}

impl Default for ZugferdExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceExtractor for ZugferdExtractor {
    fn extract(&self, attachments: &[EmbeddedAttachment]) -> Result<ExtractedInvoice> {
        let attachment = locate_with_suffix(attachments, &self.attachment_suffix)?;

        let text = decode(&attachment.bytes)?;
        let doc = parse(text, self.allow_dtd)?;
        debug!("Parsed {} ({} nodes)", attachment.name, doc.descendants().count());

        let version = detect(&doc);
        let fields = FieldResolver::new(&doc, version).resolve_all();

        let invoice = ExtractedInvoice::new(
            version,
            attachment.name.clone(),
            text.to_string(),
            fields,
        );
        info!(
            "Extracted ZUGFeRD {} invoice from {}: {}/{} fields",
            version,
            attachment.name,
            invoice.resolved_count(),
            invoice.fields().len()
        );
        Ok(invoice)
    }
}

/// Extract invoice data from a container's attachments with default settings.
pub fn extract(attachments: &[EmbeddedAttachment]) -> Result<ExtractedInvoice> {
    ZugferdExtractor::new().extract(attachments)
}
