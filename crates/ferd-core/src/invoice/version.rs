//! Schema generation detection.

use roxmltree::{Document, ParsingOptions};
use tracing::{debug, warn};

use crate::error::ExtractionError;
use crate::models::invoice::SchemaVersion;

use super::catalog::{V1_IDENTIFIER, V2_IDENTIFIER};

/// Decode attachment bytes as UTF-8, dropping a leading byte order mark.
pub fn decode(bytes: &[u8]) -> Result<&str, ExtractionError> {
    let text = std::str::from_utf8(bytes)?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}

/// Parse decoded text into an XML tree.
pub fn parse(text: &str, allow_dtd: bool) -> Result<Document<'_>, ExtractionError> {
    let options = ParsingOptions {
        allow_dtd,
        ..ParsingOptions::default()
    };
    Ok(Document::parse_with_options(text, options)?)
}

/// Classify a namespace URI (or any text) by the known generation identifiers.
pub fn classify(text: &str) -> Option<SchemaVersion> {
    if text.contains(V2_IDENTIFIER) {
        Some(SchemaVersion::V2)
    } else if text.contains(V1_IDENTIFIER) {
        Some(SchemaVersion::V1)
    } else {
        None
    }
}

/// Determine the schema generation of a parsed document.
///
/// The root element's namespace decides; when it matches neither
/// generation the raw text is searched for the identifiers instead.
pub fn detect(doc: &Document<'_>) -> SchemaVersion {
    let root = doc.root_element();
    let namespace = root.tag_name().namespace();

    if let Some(version) = namespace.and_then(classify) {
        debug!("Root namespace {:?} -> ZUGFeRD {}", namespace, version);
        return version;
    }

    match classify(doc.input_text()) {
        Some(version) => {
            debug!(
                "Root <{}> has no known namespace, raw text matches ZUGFeRD {}",
                root.tag_name().name(),
                version
            );
            version
        }
        None => {
            warn!(
                "Unrecognized invoice schema (root <{}>, namespace {:?}), resolving with 1.0 tables",
                root.tag_name().name(),
                namespace
            );
            SchemaVersion::Unknown
        }
    }
}

/// Decode, parse and classify raw attachment bytes.
pub fn detect_version(bytes: &[u8]) -> Result<SchemaVersion, ExtractionError> {
    let text = decode(bytes)?;
    let doc = parse(text, false)?;
    Ok(detect(&doc))
}
