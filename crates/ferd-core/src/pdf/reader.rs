//! Embedded file extraction using lopdf.

use std::collections::HashSet;
use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace, warn};

use super::{AttachmentSource, Result};
use crate::error::PdfError;
use crate::models::attachment::EmbeddedAttachment;

/// Name trees nested deeper than this are treated as corrupt.
const MAX_TREE_DEPTH: usize = 32;

/// Reads embedded files from a PDF (PDF/A-3) container.
pub struct PdfAttachmentReader {
    document: Document,
}

impl PdfAttachmentReader {
    /// Load a PDF from bytes, decrypting it if it only has an empty user password.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut document = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if document.is_encrypted() {
            if document.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        Ok(Self { document })
    }

    /// Load a PDF from disk.
    pub fn from_path(path: &Path) -> crate::Result<Self> {
        let data = std::fs::read(path)?;
        Ok(Self::from_bytes(&data)?)
    }

    fn catalog(&self) -> Result<&Dictionary> {
        let root = self
            .document
            .trailer
            .get(b"Root")
            .map_err(|e| PdfError::Parse(format!("missing document catalog: {}", e)))?;
        self.resolve(root)
            .and_then(|o| o.as_dict().ok())
            .ok_or_else(|| PdfError::Parse("document catalog is not a dictionary".to_string()))
    }

    fn resolve<'a>(&'a self, object: &'a Object) -> Option<&'a Object> {
        self.document.dereference(object).ok().map(|(_, o)| o)
    }

    /// File specifications listed in the `/EmbeddedFiles` name tree, in tree order.
    fn name_tree_specs<'a>(&'a self, catalog: &'a Dictionary) -> Option<Vec<&'a Dictionary>> {
        let names = catalog.get(b"Names").ok().and_then(|o| self.resolve(o))?.as_dict().ok()?;
        let tree = names.get(b"EmbeddedFiles").ok()?;

        let mut specs = Vec::new();
        let mut visited = HashSet::new();
        self.walk_name_tree(tree, 0, &mut visited, &mut specs);
        Some(specs)
    }

    fn walk_name_tree<'a>(
        &'a self,
        node: &'a Object,
        depth: usize,
        visited: &mut HashSet<ObjectId>,
        specs: &mut Vec<&'a Dictionary>,
    ) {
        if depth > MAX_TREE_DEPTH {
            warn!("EmbeddedFiles name tree deeper than {}, ignoring the rest", MAX_TREE_DEPTH);
            return;
        }
        if let Ok(id) = node.as_reference() {
            if !visited.insert(id) {
                warn!("Cycle in EmbeddedFiles name tree at {:?}", id);
                return;
            }
        }
        let Some(dict) = self.resolve(node).and_then(|o| o.as_dict().ok()) else {
            return;
        };

        if let Some(pairs) = dict.get(b"Names").ok().and_then(|o| self.resolve(o)) {
            if let Ok(pairs) = pairs.as_array() {
                // [key1 spec1 key2 spec2 ...]
                for value in pairs.iter().skip(1).step_by(2) {
                    if let Some(spec) = self.resolve(value).and_then(|o| o.as_dict().ok()) {
                        specs.push(spec);
                    }
                }
            }
        }

        if let Some(kids) = dict.get(b"Kids").ok().and_then(|o| self.resolve(o)) {
            if let Ok(kids) = kids.as_array() {
                for kid in kids {
                    self.walk_name_tree(kid, depth + 1, visited, specs);
                }
            }
        }
    }

    /// File specifications listed in the catalog's `/AF` array.
    fn associated_file_specs<'a>(&'a self, catalog: &'a Dictionary) -> Vec<&'a Dictionary> {
        catalog
            .get(b"AF")
            .ok()
            .and_then(|o| self.resolve(o))
            .and_then(|o| o.as_array().ok())
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|e| self.resolve(e).and_then(|o| o.as_dict().ok()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn read_spec(&self, spec: &Dictionary) -> Result<EmbeddedAttachment> {
        let name = [b"UF".as_slice(), b"F".as_slice()]
            .into_iter()
            .find_map(|key| {
                spec.get(key)
                    .ok()
                    .and_then(|o| self.resolve(o))
                    .and_then(|o| o.as_str().ok())
            })
            .map(decode_text_string)
            .unwrap_or_default();

        let embedded_file_error = |reason: &str| PdfError::EmbeddedFile {
            name: name.clone(),
            reason: reason.to_string(),
        };

        let ef = spec
            .get(b"EF")
            .ok()
            .and_then(|o| self.resolve(o))
            .and_then(|o| o.as_dict().ok())
            .ok_or_else(|| embedded_file_error("file specification has no /EF entry"))?;
        let stream = [b"F".as_slice(), b"UF".as_slice()]
            .into_iter()
            .find_map(|key| {
                ef.get(key)
                    .ok()
                    .and_then(|o| self.resolve(o))
                    .and_then(|o| o.as_stream().ok())
            })
            .ok_or_else(|| embedded_file_error("/EF has no embedded file stream"))?;

        let bytes = if stream.dict.has(b"Filter") {
            stream
                .decompressed_content()
                .map_err(|e| embedded_file_error(&e.to_string()))?
        } else {
            stream.content.clone()
        };

        trace!("Embedded file {} ({} bytes)", name, bytes.len());
        Ok(EmbeddedAttachment::new(name, bytes))
    }
}

impl AttachmentSource for PdfAttachmentReader {
    fn attachments(&self) -> Result<Vec<EmbeddedAttachment>> {
        let catalog = self.catalog()?;

        let specs = match self.name_tree_specs(catalog) {
            Some(specs) => specs,
            None => {
                debug!("No EmbeddedFiles name tree, trying /AF");
                self.associated_file_specs(catalog)
            }
        };

        let attachments = specs
            .into_iter()
            .filter_map(|spec| match self.read_spec(spec) {
                Ok(attachment) => Some(attachment),
                Err(e) => {
                    warn!("Skipping embedded file: {}", e);
                    None
                }
            })
            .collect::<Vec<_>>();

        debug!("Found {} embedded file(s)", attachments.len());
        Ok(attachments)
    }
}

/// Decode a PDF text string: UTF-16BE or UTF-8 with a byte order mark,
/// otherwise PDFDocEncoding, approximated as Latin-1.
fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xfe, 0xff]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else if let Some(rest) = bytes.strip_prefix(&[0xef, 0xbb, 0xbf]) {
        String::from_utf8_lossy(rest).into_owned()
    } else {
        bytes.iter().map(|&b| char::from(b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Stream, dictionary};

    fn file_spec(doc: &mut Document, name: &str, content: &[u8]) -> ObjectId {
        let stream_id = doc.add_object(Stream::new(
            dictionary! { "Type" => "EmbeddedFile" },
            content.to_vec(),
        ));
        doc.add_object(dictionary! {
            "Type" => "Filespec",
            "F" => Object::string_literal(name),
            "UF" => Object::string_literal(name),
            "EF" => dictionary! { "F" => stream_id },
        })
    }

    fn save(mut doc: Document, catalog: Dictionary) -> Vec<u8> {
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", catalog_id);
        let mut data = Vec::new();
        doc.save_to(&mut data).unwrap();
        data
    }

    fn names(reader: &PdfAttachmentReader) -> Vec<String> {
        reader
            .attachments()
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect()
    }

    #[test]
    fn test_reads_name_tree_in_order() {
        let mut doc = Document::with_version("1.7");
        let first = file_spec(&mut doc, "factur-x.xml", b"<a/>");
        let second = file_spec(&mut doc, "logo.png", b"\x89PNG");
        let data = save(
            doc,
            dictionary! {
                "Type" => "Catalog",
                "Names" => dictionary! {
                    "EmbeddedFiles" => dictionary! {
                        "Names" => vec![
                            Object::string_literal("factur-x.xml"),
                            first.into(),
                            Object::string_literal("logo.png"),
                            second.into(),
                        ],
                    },
                },
            },
        );

        let reader = PdfAttachmentReader::from_bytes(&data).unwrap();
        let attachments = reader.attachments().unwrap();
        assert_eq!(attachments.len(), 2);
        assert_eq!(attachments[0], EmbeddedAttachment::new("factur-x.xml", b"<a/>".to_vec()));
        assert_eq!(attachments[1].name, "logo.png");
    }

    #[test]
    fn test_reads_kids() {
        let mut doc = Document::with_version("1.7");
        let a = file_spec(&mut doc, "a.xml", b"<a/>");
        let b = file_spec(&mut doc, "b.xml", b"<b/>");
        let leaf_a = doc.add_object(dictionary! {
            "Names" => vec![Object::string_literal("a.xml"), a.into()],
        });
        let leaf_b = doc.add_object(dictionary! {
            "Names" => vec![Object::string_literal("b.xml"), b.into()],
        });
        let data = save(
            doc,
            dictionary! {
                "Type" => "Catalog",
                "Names" => dictionary! {
                    "EmbeddedFiles" => dictionary! {
                        "Kids" => vec![leaf_a.into(), leaf_b.into()],
                    },
                },
            },
        );

        let reader = PdfAttachmentReader::from_bytes(&data).unwrap();
        assert_eq!(names(&reader), vec!["a.xml", "b.xml"]);
    }

    #[test]
    fn test_unreadable_spec_is_skipped() {
        let mut doc = Document::with_version("1.7");
        // External file reference: no /EF stream to read.
        let external = doc.add_object(dictionary! {
            "Type" => "Filespec",
            "F" => Object::string_literal("external.txt"),
        });
        let invoice = file_spec(&mut doc, "factur-x.xml", b"<a/>");
        let data = save(
            doc,
            dictionary! {
                "Type" => "Catalog",
                "Names" => dictionary! {
                    "EmbeddedFiles" => dictionary! {
                        "Names" => vec![
                            Object::string_literal("external.txt"),
                            external.into(),
                            Object::string_literal("factur-x.xml"),
                            invoice.into(),
                        ],
                    },
                },
            },
        );

        let reader = PdfAttachmentReader::from_bytes(&data).unwrap();
        let attachments = reader.attachments().unwrap();
        assert_eq!(attachments, vec![EmbeddedAttachment::new("factur-x.xml", b"<a/>".to_vec())]);
    }

    #[test]
    fn test_falls_back_to_associated_files() {
        let mut doc = Document::with_version("1.7");
        let spec = file_spec(&mut doc, "zugferd-invoice.xml", b"<x/>");
        let data = save(
            doc,
            dictionary! {
                "Type" => "Catalog",
                "AF" => vec![spec.into()],
            },
        );

        let reader = PdfAttachmentReader::from_bytes(&data).unwrap();
        assert_eq!(names(&reader), vec!["zugferd-invoice.xml"]);
    }

    #[test]
    fn test_no_embedded_files_is_empty() {
        let doc = Document::with_version("1.7");
        let data = save(doc, dictionary! { "Type" => "Catalog" });

        let reader = PdfAttachmentReader::from_bytes(&data).unwrap();
        assert!(reader.attachments().unwrap().is_empty());
    }

    #[test]
    fn test_not_a_pdf() {
        assert!(matches!(
            PdfAttachmentReader::from_bytes(b"<?xml version=\"1.0\"?><a/>"),
            Err(PdfError::Parse(_))
        ));
    }

    #[test]
    fn test_decode_text_string() {
        assert_eq!(decode_text_string(b"invoice.xml"), "invoice.xml");
        assert_eq!(decode_text_string(b"Rechnung_\xe4.xml"), "Rechnung_ä.xml");
        assert_eq!(
            decode_text_string(&[0xfe, 0xff, 0x00, b'a', 0x00, 0xe4, 0x00, b'.', 0x00, b'x']),
            "aä.x"
        );
        assert_eq!(decode_text_string(b"\xef\xbb\xbfa.xml"), "a.xml");
    }
}
