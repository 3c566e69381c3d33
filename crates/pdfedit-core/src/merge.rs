//! PDF Merge algorithm
//!
//! Combines multiple PDFs into a single document.

use lopdf::{Object, ObjectId};
use tracing::{debug, info};

use crate::document::{save_document, PdfDocument};
use crate::error::PdfEditError;
use crate::pages::rebuild_page_tree;

/// Merge PDFs into one, pages appended in input order.
///
/// The algorithm:
/// 1. Require at least two documents
/// 2. Take the first document as the destination
/// 3. For each further document:
///    a. Offset its object ids past the destination's highest id
///    b. Import all objects with remapped references
///    c. Queue its pages after the ones collected so far
/// 4. Hang all queued pages under the destination's root page node
/// 5. Drop objects nothing references any more, compress and save
pub fn merge_documents(documents: &[Vec<u8>]) -> Result<Vec<u8>, PdfEditError> {
    if documents.len() < 2 {
        return Err(PdfEditError::Input(
            "Provide at least two PDFs to merge".into(),
        ));
    }

    let mut loaded = Vec::with_capacity(documents.len());
    for (i, bytes) in documents.iter().enumerate() {
        let doc = PdfDocument::open(bytes).map_err(|e| match e {
            PdfEditError::Format(msg) => {
                PdfEditError::Format(format!("Failed to read document {}: {}", i + 1, msg))
            }
            other => other,
        })?;
        loaded.push(doc.into_inner());
    }

    let mut sources = loaded.into_iter();
    let mut dest = sources
        .next()
        .ok_or_else(|| PdfEditError::Input("No documents to merge".into()))?;
    let mut page_refs: Vec<ObjectId> = dest.get_pages().into_values().collect();

    for source in sources {
        let offset = dest.max_id;
        let source_pages: Vec<ObjectId> = source.get_pages().into_values().collect();
        debug!(
            "Importing {} objects ({} pages) at id offset {}",
            source.objects.len(),
            source_pages.len(),
            offset
        );

        for ((number, generation), mut object) in source.objects {
            shift_references(&mut object, offset);
            dest.objects.insert((number + offset, generation), object);
        }
        page_refs.extend(
            source_pages
                .into_iter()
                .map(|(number, generation)| (number + offset, generation)),
        );
        dest.max_id = dest.max_id.max(source.max_id + offset);
    }

    rebuild_page_tree(&mut dest, &page_refs)?;
    dest.prune_objects();
    dest.compress();
    info!(
        "Merged {} documents into {} pages",
        documents.len(),
        page_refs.len()
    );

    save_document(&mut dest)
}

/// Add `offset` to the object number of every reference inside `object`.
fn shift_references(object: &mut Object, offset: u32) {
    match object {
        Object::Reference(id) => id.0 += offset,
        Object::Array(items) => {
            for item in items.iter_mut() {
                shift_references(item, offset);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter_mut() {
                shift_references(value, offset);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter_mut() {
                shift_references(value, offset);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{blank_pdf, page_texts};
    use lopdf::{dictionary, Document};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_merge_requires_two_documents() {
        let err = merge_documents(&[]).unwrap_err();
        assert!(matches!(err, PdfEditError::Input(_)));

        let err = merge_documents(&[blank_pdf(1)]).unwrap_err();
        assert!(err.to_string().contains("at least two"));
    }

    #[test]
    fn test_merge_appends_pages_in_order() {
        let merged = merge_documents(&[blank_pdf(2), blank_pdf(3)]).unwrap();
        assert_eq!(
            page_texts(&merged),
            vec!["Page 1", "Page 2", "Page 1", "Page 2", "Page 3"]
        );
    }

    #[test]
    fn test_merge_three_documents() {
        let merged = merge_documents(&[blank_pdf(1), blank_pdf(1), blank_pdf(2)]).unwrap();
        let doc = PdfDocument::open(&merged).unwrap();
        assert_eq!(doc.page_count(), 4);
    }

    #[test]
    fn test_merge_reports_unreadable_input() {
        let err = merge_documents(&[blank_pdf(1), b"garbage".to_vec()]).unwrap_err();
        assert!(matches!(err, PdfEditError::Format(_)));
        assert!(err.to_string().contains("document 2"));
    }

    #[test]
    fn test_merged_pages_point_at_root_node() {
        let merged = merge_documents(&[blank_pdf(1), blank_pdf(1)]).unwrap();
        let doc = Document::load_mem(&merged).unwrap();
        let pages_id = crate::pages::root_pages_id(&doc).unwrap();
        for page_id in doc.get_pages().into_values() {
            let parent = doc
                .get_dictionary(page_id)
                .unwrap()
                .get(b"Parent")
                .unwrap()
                .as_reference()
                .unwrap();
            assert_eq!(parent, pages_id);
        }
    }

    #[test]
    fn test_shift_references_reaches_nested_objects() {
        let mut object = Object::Dictionary(dictionary! {
            "A" => Object::Reference((3, 0)),
            "B" => vec![Object::Reference((4, 1)), Object::Integer(7)],
        });
        shift_references(&mut object, 10);
        let dict = object.as_dict().unwrap();
        assert_eq!(dict.get(b"A").unwrap().as_reference().unwrap(), (13, 0));
        let items = dict.get(b"B").unwrap().as_array().unwrap();
        assert_eq!(items[0].as_reference().unwrap(), (14, 1));
        assert_eq!(items[1].as_i64().unwrap(), 7);
    }
}
