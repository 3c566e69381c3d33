//! Lossless size reduction

use tracing::info;

use crate::document::{save_document, PdfDocument};
use crate::error::PdfEditError;

/// Drop unreachable objects and empty streams, then Flate-compress every
/// stream that is not compressed yet.
pub fn compress(pdf: &[u8]) -> Result<Vec<u8>, PdfEditError> {
    let mut doc = PdfDocument::open(pdf)?.into_inner();
    let before = doc.objects.len();

    let pruned = doc.prune_objects().len();
    let emptied = doc.delete_zero_length_streams().len();
    doc.compress();

    let output = save_document(&mut doc)?;
    info!(
        "Compressed {} -> {} bytes ({} objects, {} unreachable, {} empty streams removed)",
        pdf.len(),
        output.len(),
        before,
        pruned,
        emptied
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{numbered_pdf, page_texts, save};
    use lopdf::{dictionary, Document, Object, Stream};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_compress_keeps_pages_and_drops_orphans() {
        let mut raw = numbered_pdf(3);
        let orphan = "0 0 m 100 100 l S ".repeat(200);
        raw.add_object(Stream::new(dictionary! {}, orphan.into_bytes()));
        let input = save(&mut raw);

        let output = compress(&input).unwrap();
        assert!(output.len() < input.len());
        assert_eq!(page_texts(&output), vec!["Page 1", "Page 2", "Page 3"]);
    }

    #[test]
    fn test_compress_flate_encodes_content() {
        let mut raw = numbered_pdf(1);
        let page_id = raw.get_pages()[&1];
        let content = format!(
            "BT /F1 12 Tf 100 700 Td (Page 1) Tj ET {}",
            "0 0 m 10 10 l S ".repeat(100)
        );
        let content_id = raw.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        raw.get_object_mut(page_id)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set("Contents", Object::Reference(content_id));

        let output = compress(&save(&mut raw)).unwrap();
        let doc = Document::load_mem(&output).unwrap();
        let page_id = doc.get_pages()[&1];
        let content_id = doc
            .get_dictionary(page_id)
            .unwrap()
            .get(b"Contents")
            .unwrap()
            .as_reference()
            .unwrap();
        let stream = doc.get_object(content_id).unwrap().as_stream().unwrap();
        assert!(matches!(
            stream.dict.get(b"Filter"),
            Ok(Object::Name(name)) if name == b"FlateDecode"
        ));
        assert_eq!(page_texts(&output), vec!["Page 1"]);
    }

    #[test]
    fn test_compress_rejects_garbage() {
        assert!(matches!(
            compress(b"%PDF-1.7 nothing here"),
            Err(PdfEditError::Format(_))
        ));
    }
}
