//! PDF extraction into typed content units.
//!
//! Extraction is a pure transform of document bytes: identical input bytes
//! always yield the identical unit sequence. Figures are detected from
//! image XObjects in page resources and represented by a nearby caption
//! line when one exists, otherwise by an empty placeholder.

mod segment;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::{FinragError, Result};
use crate::models::{ContentUnit, ExtractionResult, UnitBody, UnitCounts};
use segment::Segment;

/// Parses a PDF document into content units with page/order provenance
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract all content units from a PDF, in document order.
    pub fn extract(&self, bytes: &[u8]) -> Result<ExtractionResult> {
        let doc = match Document::load_mem(bytes) {
            Ok(doc) => doc,
            Err(err) => {
                let reason = err.to_string();
                let lowered = reason.to_ascii_lowercase();
                if lowered.contains("crypt") || lowered.contains("password") {
                    return Err(FinragError::DocumentEncrypted);
                }
                return Err(FinragError::DocumentUnreadable { reason });
            }
        };

        if doc.trailer.has(b"Encrypt") {
            return Err(FinragError::DocumentEncrypted);
        }

        let pages = doc.get_pages();
        let page_count = pages.len();

        let mut units = Vec::new();
        let mut order_index = 0usize;

        for (page_number, page_id) in pages {
            let text = match doc.extract_text(&[page_number]) {
                Ok(text) => text,
                Err(err) => {
                    tracing::warn!(page = page_number, "Failed to extract page text: {}", err);
                    String::new()
                }
            };

            let (segments, captions) = segment::segment_page(&text);
            for seg in segments {
                let body = match seg {
                    Segment::Text(content) => UnitBody::Text { content },
                    Segment::Table(grid) => UnitBody::Table { grid },
                };
                units.push(ContentUnit {
                    page_number: page_number as usize,
                    order_index,
                    body,
                });
                order_index += 1;
            }

            // Figure units follow the page's textual units; captions are
            // assigned in page order and leftovers get the empty placeholder.
            let mut captions = captions.into_iter();
            for _ in 0..page_image_count(&doc, page_id) {
                units.push(ContentUnit {
                    page_number: page_number as usize,
                    order_index,
                    body: UnitBody::Figure { caption: captions.next() },
                });
                order_index += 1;
            }
        }

        if units.is_empty() {
            return Err(FinragError::DocumentEmpty);
        }

        let analytics = UnitCounts::tally(&units);

        tracing::debug!(
            pages = page_count,
            text = analytics.text,
            tables = analytics.table,
            figures = analytics.figure,
            "Extracted document"
        );

        Ok(ExtractionResult { units, page_count, analytics })
    }
}

/// Follow one level of indirection if the object is a reference.
fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        _ => object,
    }
}

/// Count image XObjects reachable from the page's resources.
///
/// Resources may be inherited through the page tree, so the lookup walks
/// Parent links until a Resources entry is found.
fn page_image_count(doc: &Document, page_id: ObjectId) -> usize {
    let mut node_id = Some(page_id);
    let mut depth = 0;
    while let Some(id) = node_id {
        if depth > 16 {
            break;
        }
        let Ok(node) = doc.get_dictionary(id) else {
            break;
        };
        if let Ok(resources) = node.get(b"Resources") {
            if let Ok(resources) = resolve(doc, resources).as_dict() {
                return count_images(doc, resources);
            }
        }
        node_id = node.get(b"Parent").ok().and_then(|p| p.as_reference().ok());
        depth += 1;
    }
    0
}

fn count_images(doc: &Document, resources: &Dictionary) -> usize {
    let Ok(xobjects) = resources.get(b"XObject") else {
        return 0;
    };
    let Ok(xobjects) = resolve(doc, xobjects).as_dict() else {
        return 0;
    };

    xobjects
        .iter()
        .filter(|(_, value)| match resolve(doc, value) {
            Object::Stream(stream) => stream
                .dict
                .get(b"Subtype")
                .and_then(Object::as_name)
                .map(|name| name == b"Image")
                .unwrap_or(false),
            _ => false,
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreadable_bytes() {
        let extractor = PdfExtractor::new();
        let err = extractor.extract(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, FinragError::DocumentUnreadable { .. }));
    }

    #[test]
    fn test_empty_input() {
        let extractor = PdfExtractor::new();
        let err = extractor.extract(&[]).unwrap_err();
        assert!(matches!(err, FinragError::DocumentUnreadable { .. }));
    }
}
