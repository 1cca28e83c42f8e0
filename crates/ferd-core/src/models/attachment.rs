//! Embedded attachments handed over by the container reader.

use serde::{Deserialize, Serialize};

/// A named byte blob stored inside a container document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedAttachment {
    /// File name as declared by the container.
    pub name: String,

    /// Raw, already decompressed content.
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl EmbeddedAttachment {
    /// Create a new attachment.
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Size of the attachment content in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the file name ends in `suffix`, ignoring ASCII case.
    pub fn has_suffix(&self, suffix: &str) -> bool {
        let name = self.name.as_bytes();
        let suffix = suffix.as_bytes();
        name.len() >= suffix.len()
            && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_suffix_ignores_case() {
        assert!(EmbeddedAttachment::new("factur-x.XML", b"".to_vec()).has_suffix(".xml"));
        assert!(EmbeddedAttachment::new("ZUGFeRD-invoice.xml", b"".to_vec()).has_suffix(".xml"));
        assert!(!EmbeddedAttachment::new("invoice.xml.pdf", b"".to_vec()).has_suffix(".xml"));
        assert!(!EmbeddedAttachment::new("ml", b"".to_vec()).has_suffix(".xml"));
    }
}
