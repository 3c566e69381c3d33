//! Visual style recovery for replacement text
//!
//! Maps the font of an existing run to something we can draw with: a standard
//! font when the family is known, the caller's fallback program otherwise, and
//! Helvetica as the last resort.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::document::Rgb;

/// Logical name a caller-supplied fallback font program is registered under.
pub const FALLBACK_FONT_NAME: &str = "matchfont";

/// Standard font used when nothing better is known.
pub const DEFAULT_FONT: &str = "Helvetica";

lazy_static! {
    static ref SUBSET_PREFIX: Regex = Regex::new(r"^[A-Z]{6}\+").unwrap();

    /// Font names that can be drawn with a standard font, exact match.
    static ref STANDARD_ALIASES: HashMap<&'static str, &'static str> = HashMap::from([
        ("Times-Roman", "Times-Roman"),
        ("Times New Roman", "Times-Roman"),
        ("Helvetica", "Helvetica"),
        ("Arial", "Helvetica"),
        ("Courier", "Courier"),
    ]);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum OutputFont {
    /// One of the standard 14 fonts, by base name.
    Standard(&'static str),
    /// The fallback program, embedded under [`FALLBACK_FONT_NAME`].
    Embedded(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyleDecision {
    pub output_font: OutputFont,
    pub is_embedded_custom_font: bool,
}

impl StyleDecision {
    fn standard(base_font: &'static str) -> Self {
        Self {
            output_font: OutputFont::Standard(base_font),
            is_embedded_custom_font: false,
        }
    }
}

/// Remove a six-letter subset tag such as `ABCDEF+`.
pub fn strip_subset_prefix(font_id: &str) -> &str {
    match SUBSET_PREFIX.find(font_id) {
        Some(prefix) => &font_id[prefix.end()..],
        None => font_id,
    }
}

/// Decide which font draws the replacement for a run set in `font_id`.
///
/// Only the presence of `fallback` matters here; whether it parses is
/// checked when it is embedded.
pub fn resolve_font(font_id: &str, fallback: Option<&[u8]>) -> StyleDecision {
    let clean = strip_subset_prefix(font_id);
    if let Some(base_font) = STANDARD_ALIASES.get(clean) {
        return StyleDecision::standard(*base_font);
    }
    match fallback {
        Some(program) if !program.is_empty() => StyleDecision {
            output_font: OutputFont::Embedded(FALLBACK_FONT_NAME),
            is_embedded_custom_font: true,
        },
        _ => StyleDecision::standard(DEFAULT_FONT),
    }
}

/// Split a packed 0xRRGGBB color into unit components.
pub fn unpack_color(color: u32) -> Rgb {
    let channel = |shift: u32| f64::from((color >> shift) & 0xFF) / 255.0;
    Rgb {
        r: channel(16),
        g: channel(8),
        b: channel(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_subset_prefix_is_stripped() {
        assert_eq!(strip_subset_prefix("ABCDEF+Arial"), "Arial");
        assert_eq!(strip_subset_prefix("Arial"), "Arial");
        assert_eq!(strip_subset_prefix("abcdef+Arial"), "abcdef+Arial");
        assert_eq!(strip_subset_prefix("ABCDE+Arial"), "ABCDE+Arial");
    }

    #[test]
    fn test_subset_alias_resolves_to_standard_font() {
        let decision = resolve_font("ABCDEF+Arial", None);
        assert_eq!(decision, StyleDecision::standard("Helvetica"));
    }

    #[test]
    fn test_alias_table() {
        assert_eq!(
            resolve_font("Times New Roman", None).output_font,
            OutputFont::Standard("Times-Roman")
        );
        assert_eq!(
            resolve_font("Courier", Some(&b"font"[..])).output_font,
            OutputFont::Standard("Courier")
        );
    }

    #[test]
    fn test_unknown_font_uses_fallback_program() {
        let decision = resolve_font("XYZABC+Garamond", Some(&b"\x00\x01\x00\x00"[..]));
        assert_eq!(decision.output_font, OutputFont::Embedded(FALLBACK_FONT_NAME));
        assert!(decision.is_embedded_custom_font);
    }

    #[test]
    fn test_unknown_font_without_fallback_is_helvetica() {
        assert_eq!(
            resolve_font("Garamond", None),
            StyleDecision::standard(DEFAULT_FONT)
        );
        assert_eq!(
            resolve_font("Garamond", Some(&b""[..])),
            StyleDecision::standard(DEFAULT_FONT)
        );
    }

    #[test]
    fn test_alias_match_is_exact() {
        // Style variants are not in the table.
        assert_eq!(
            resolve_font("Arial-BoldMT", None).output_font,
            OutputFont::Standard(DEFAULT_FONT)
        );
    }

    #[test]
    fn test_unpack_color() {
        let rgb = unpack_color(0xFF8000);
        assert_eq!(rgb.r, 1.0);
        assert!((rgb.g - 128.0 / 255.0).abs() < 1e-12);
        assert_eq!(rgb.b, 0.0);
        assert_eq!(unpack_color(0), Rgb::BLACK);
    }
}
