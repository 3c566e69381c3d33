//! Glyph widths for the standard fonts
//!
//! Widths are in thousandths of the font size, taken from the Adobe AFM files
//! for the printable ASCII range. Anything outside that range falls back to an
//! average width for the family.

/// Ascender as a fraction of the font size.
pub const ASCENT: f64 = 0.8;

/// Descender depth as a fraction of the font size.
pub const DESCENT: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFamily {
    Helvetica,
    Times,
    Courier,
}

impl StandardFamily {
    /// Family whose widths best approximate `base_font`.
    pub fn for_font(base_font: &str) -> Self {
        let lower = base_font.to_lowercase();
        if lower.contains("courier") || lower.contains("mono") || lower.contains("consolas") {
            StandardFamily::Courier
        } else if lower.contains("times")
            || lower.contains("georgia")
            || lower.contains("garamond")
            || (lower.contains("serif") && !lower.contains("sans"))
        {
            StandardFamily::Times
        } else {
            StandardFamily::Helvetica
        }
    }

    /// Width of `ch` in thousandths of the font size.
    pub fn char_width(self, ch: char) -> f64 {
        let code = ch as u32;
        match self {
            StandardFamily::Courier => 600.0,
            StandardFamily::Helvetica => lookup(&HELVETICA_WIDTHS, code).unwrap_or(556.0),
            StandardFamily::Times => lookup(&TIMES_WIDTHS, code).unwrap_or(500.0),
        }
    }

    /// Advance width of `text` at `size` points.
    pub fn text_width(self, text: &str, size: f64) -> f64 {
        text.chars().map(|ch| self.char_width(ch)).sum::<f64>() * size / 1000.0
    }
}

fn lookup(table: &[u16; 95], code: u32) -> Option<f64> {
    if (32..=126).contains(&code) {
        Some(f64::from(table[(code - 32) as usize]))
    } else {
        None
    }
}

#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const TIMES_WIDTHS: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];
