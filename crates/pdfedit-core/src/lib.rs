//! PDF editing operations
//!
//! Page-range selection, overlay coordinate mapping and style-preserving
//! text substitution, plus the whole-document operations built on them:
//! merge, split, reorder, rotate, highlight, watermark, protect, unlock,
//! metadata stripping and compression.
//!
//! Every operation takes PDF bytes and returns new PDF bytes; nothing is
//! shared between calls.

pub mod annotate;
pub mod compress;
mod crypt;
pub mod document;
pub mod encoding;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod merge;
pub mod metrics;
pub mod pages;
pub mod range;
pub mod security;
pub mod span;
pub mod split;
pub mod style;
pub mod substitute;
pub mod watermark;

#[cfg(test)]
mod test_support;

pub use annotate::{highlight, parse_highlights, HighlightItem};
pub use compress::compress;
pub use document::PdfDocument;
pub use error::PdfEditError;
pub use geometry::{map_rect, DeviceRect, NormalizedRect};
pub use merge::merge_documents;
pub use pages::{reorder, rotate, Rotation};
pub use range::{resolve, PageSpan, RangeSet};
pub use security::{protect, strip_metadata, unlock};
pub use split::{split_document, split_to_zip, SplitPart};
pub use substitute::replace_text;
pub use watermark::{watermark_image, watermark_text, ImageWatermark, TextWatermark};

/// Parse PDF bytes and return page count
pub fn get_page_count(bytes: &[u8]) -> Result<u32, PdfEditError> {
    Ok(PdfDocument::open(bytes)?.page_count() as u32)
}
