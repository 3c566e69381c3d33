//! PDF Split algorithm
//!
//! One output document per span of the range expression. Each part starts as
//! a copy of the source, keeps only its span's pages, then drops every object
//! those pages no longer reach.

use std::io::{Cursor, Write};

use serde::Serialize;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::document::{save_document, PdfDocument};
use crate::error::PdfEditError;
use crate::pages::rebuild_page_tree;
use crate::range::resolve;

/// One document produced by a split.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitPart {
    /// `split_{index}_{start}-{end}.pdf`, index counted from 1.
    pub name: String,
    #[serde(skip)]
    pub data: Vec<u8>,
}

/// Split `pdf` into one document per span of `ranges`.
pub fn split_document(pdf: &[u8], ranges: &str) -> Result<Vec<SplitPart>, PdfEditError> {
    let doc = PdfDocument::open(pdf)?;
    let ranges = resolve(ranges, doc.page_count() as u32)?;

    let mut parts = Vec::with_capacity(ranges.len());
    for (i, span) in ranges.iter().enumerate() {
        let pages = span
            .pages()
            .map(|number| doc.page_id(number as usize - 1))
            .collect::<Result<Vec<_>, _>>()?;

        let mut part = doc.inner().clone();
        rebuild_page_tree(&mut part, &pages)?;
        part.prune_objects();
        part.compress();

        let name = format!("split_{}_{}-{}.pdf", i + 1, span.start, span.end);
        let data = save_document(&mut part)?;
        debug!("{}: {} pages, {} bytes", name, span.page_count(), data.len());
        parts.push(SplitPart { name, data });
    }

    info!("Split {} pages into {} parts", doc.page_count(), parts.len());
    Ok(parts)
}

/// Pack split parts into a deflate-compressed ZIP archive.
pub fn zip_parts(parts: &[SplitPart]) -> Result<Vec<u8>, PdfEditError> {
    let archive_error = |e: &dyn std::fmt::Display| {
        PdfEditError::Operation(format!("Failed to build archive: {}", e))
    };

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for part in parts {
        zip.start_file(part.name.as_str(), options)
            .map_err(|e| archive_error(&e))?;
        zip.write_all(&part.data).map_err(|e| archive_error(&e))?;
    }
    let cursor = zip.finish().map_err(|e| archive_error(&e))?;
    Ok(cursor.into_inner())
}

/// [`split_document`] followed by [`zip_parts`].
pub fn split_to_zip(pdf: &[u8], ranges: &str) -> Result<Vec<u8>, PdfEditError> {
    zip_parts(&split_document(pdf, ranges)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{blank_pdf, page_texts};
    use pretty_assertions::assert_eq;
    use std::io::Read;

    #[test]
    fn test_split_one_part_per_span() {
        let parts = split_document(&blank_pdf(3), "1-2,3").unwrap();
        let names: Vec<&str> = parts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["split_1_1-2.pdf", "split_2_3-3.pdf"]);
        assert_eq!(page_texts(&parts[0].data), vec!["Page 1", "Page 2"]);
        assert_eq!(page_texts(&parts[1].data), vec!["Page 3"]);
    }

    #[test]
    fn test_split_default_range_is_whole_document() {
        let parts = split_document(&blank_pdf(4), "").unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].name, "split_1_1-4.pdf");
    }

    #[test]
    fn test_split_overlapping_spans() {
        let parts = split_document(&blank_pdf(3), "1-2,2-3").unwrap();
        assert_eq!(page_texts(&parts[1].data), vec!["Page 2", "Page 3"]);
    }

    #[test]
    fn test_split_part_drops_unused_pages() {
        let parts = split_document(&blank_pdf(5), "2").unwrap();
        let doc = lopdf::Document::load_mem(&parts[0].data).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        let source = lopdf::Document::load_mem(&blank_pdf(5)).unwrap();
        assert!(doc.objects.len() < source.objects.len());
    }

    #[test]
    fn test_split_rejects_bad_range() {
        assert!(matches!(
            split_document(&blank_pdf(3), "4-5"),
            Err(PdfEditError::Range(_))
        ));
    }

    #[test]
    fn test_zip_contains_named_parts() {
        let archive = split_to_zip(&blank_pdf(3), "1,2-3").unwrap();
        let mut zip = zip::ZipArchive::new(Cursor::new(archive)).unwrap();
        assert_eq!(zip.len(), 2);

        let mut data = Vec::new();
        zip.by_name("split_2_2-3.pdf")
            .unwrap()
            .read_to_end(&mut data)
            .unwrap();
        assert_eq!(page_texts(&data), vec!["Page 2", "Page 3"]);
    }
}
