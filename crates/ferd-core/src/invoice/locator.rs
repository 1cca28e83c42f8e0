//! Selection of the invoice attachment among a container's embedded files.

use tracing::debug;

use crate::error::ExtractionError;
use crate::models::attachment::EmbeddedAttachment;

/// Default suffix identifying the invoice attachment.
pub const XML_SUFFIX: &str = ".xml";

/// Select the first attachment whose name ends in `.xml` (any case).
pub fn locate(attachments: &[EmbeddedAttachment]) -> Result<&EmbeddedAttachment, ExtractionError> {
    locate_with_suffix(attachments, XML_SUFFIX)
}

/// Select the first attachment whose name ends in `suffix` (any case).
///
/// Enumeration order decides between several matches; content is not
/// inspected.
pub fn locate_with_suffix<'a>(
    attachments: &'a [EmbeddedAttachment],
    suffix: &str,
) -> Result<&'a EmbeddedAttachment, ExtractionError> {
    let mut matching = attachments.iter().filter(|a| a.has_suffix(suffix));
    let chosen = matching.next().ok_or(ExtractionError::NoAttachmentFound)?;

    let skipped = matching.count();
    if skipped > 0 {
        debug!(
            "{} attachments match '{}', using the first: {}",
            skipped + 1,
            suffix,
            chosen.name
        );
    } else {
        debug!("Using attachment {} ({} bytes)", chosen.name, chosen.size());
    }

    Ok(chosen)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(name: &str) -> EmbeddedAttachment {
        EmbeddedAttachment::new(name, name.as_bytes().to_vec())
    }

    #[test]
    fn test_no_xml_attachment() {
        let attachments = [attachment("readme.txt"), attachment("logo.png")];
        assert!(matches!(locate(&attachments), Err(ExtractionError::NoAttachmentFound)));
        assert!(matches!(locate(&[]), Err(ExtractionError::NoAttachmentFound)));
    }

    #[test]
    fn test_first_xml_in_enumeration_order() {
        let attachments = [
            attachment("readme.txt"),
            attachment("metadata.XML"),
            attachment("factur-x.xml"),
        ];
        assert_eq!(locate(&attachments).unwrap().name, "metadata.XML");
    }

    #[test]
    fn test_custom_suffix() {
        let attachments = [attachment("invoice.xml"), attachment("invoice.cii")];
        assert_eq!(
            locate_with_suffix(&attachments, ".CII").unwrap().name,
            "invoice.cii"
        );
    }
}
