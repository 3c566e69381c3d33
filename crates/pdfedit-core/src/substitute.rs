//! Style-preserving text replacement
//!
//! The original glyphs are not edited. The run is painted over with an opaque
//! white box and the replacement is drawn on top in the closest style we can
//! reproduce.

use tracing::{debug, info};

use crate::document::{FontRef, PdfDocument, Rgb};
use crate::error::PdfEditError;
use crate::geometry::Point;
use crate::layout::TextRun;
use crate::span::find_span;
use crate::style::{resolve_font, unpack_color, OutputFont, StyleDecision};

/// Fraction of the font size between the bottom of a run box and its baseline.
const BASELINE_OFFSET: f64 = 0.2;

/// Register the font a [`StyleDecision`] asks for.
pub fn load_font(
    doc: &mut PdfDocument,
    style: &StyleDecision,
    fallback: Option<&[u8]>,
) -> Result<FontRef, PdfEditError> {
    match (&style.output_font, fallback) {
        (OutputFont::Standard(base_font), _) => Ok(doc.builtin_font(base_font)),
        (OutputFont::Embedded(name), Some(program)) => doc.embed_font(name, program),
        (OutputFont::Embedded(name), None) => Err(PdfEditError::Font(format!(
            "No font program supplied for '{}'",
            name
        ))),
    }
}

/// Cover `run` and draw `replacement` at its baseline with the run's size and color.
pub fn substitute(
    doc: &mut PdfDocument,
    page_index: usize,
    run: &TextRun,
    replacement: &str,
    style: &StyleDecision,
    fallback: Option<&[u8]>,
) -> Result<(), PdfEditError> {
    let font = load_font(doc, style, fallback)?;

    doc.draw_filled_rect(page_index, run.bbox, Rgb::WHITE)?;

    let origin = Point {
        x: run.bbox.x0,
        y: run.bbox.y1 - BASELINE_OFFSET * run.size,
    };
    debug!(
        "Drawing replacement at ({:.2}, {:.2}) in '{}' {:.2}pt",
        origin.x,
        origin.y,
        font.base_font(),
        run.size
    );
    doc.draw_text(
        page_index,
        origin,
        replacement,
        &font,
        run.size,
        unpack_color(run.color),
    )
}

/// Replace the first run on `page_index` (zero-based) containing `find`.
pub fn replace_text(
    pdf: &[u8],
    page_index: usize,
    find: &str,
    replace: &str,
    fallback: Option<&[u8]>,
) -> Result<Vec<u8>, PdfEditError> {
    let mut doc = PdfDocument::open(pdf)?;
    let layout = doc.structured_text(page_index)?;
    let run = find_span(&layout, find).cloned().ok_or_else(|| {
        PdfEditError::NotFound("Target text not found on the specified page".into())
    })?;

    let style = resolve_font(&run.font, fallback);
    info!(
        "Replacing run '{}' on page {} (font '{}' -> {:?})",
        run.text, page_index, run.font, style.output_font
    );
    substitute(&mut doc, page_index, &run, replace, &style, fallback)?;
    doc.serialize()
}
