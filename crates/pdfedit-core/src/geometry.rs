//! Coordinate mapping between viewer overlays and PDF user space
//!
//! Viewers author regions as fractions of the page with a top-left origin and
//! y growing downward. PDF user space has a bottom-left origin with y growing
//! upward and absolute units (points).

use serde::{Deserialize, Serialize};

/// Region in page fractions, top-left origin, y down. Untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Region in PDF user space, bottom-left origin, y up.
///
/// Always non-degenerate: `x2 > x1` and `y2 > y1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceRect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl DeviceRect {
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Highlight quad in PDF order: upper-left, upper-right, lower-left, lower-right.
    pub fn quad_points(&self) -> [f64; 8] {
        [
            self.x1, self.y2, self.x2, self.y2, self.x1, self.y1, self.x2, self.y1,
        ]
    }
}

/// Region in layout page space: top-left origin of the MediaBox, y down.
///
/// This is the space text runs are reported in and the space the page drawing
/// primitives accept.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageRect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl PageRect {
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &PageRect) -> PageRect {
        PageRect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

/// Page space point, top-left origin, y down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Map a fractional top-down rectangle to an absolute bottom-up one.
///
/// Returns `None` for regions that should be skipped: non-positive size, or
/// nothing left after clamping to the page. The left edge only has a floor
/// clamp while the right edge is clipped at the page border.
pub fn map_rect(rect: &NormalizedRect, page_width: f64, page_height: f64) -> Option<DeviceRect> {
    if !(rect.width > 0.0) || !(rect.height > 0.0) {
        return None;
    }

    let x1 = rect.left.max(0.0) * page_width;
    let x2 = (rect.left + rect.width).clamp(0.0, 1.0) * page_width;
    let y2 = (1.0 - rect.top.clamp(0.0, 1.0)) * page_height;
    let y1 = (1.0 - (rect.top + rect.height).clamp(0.0, 1.0)) * page_height;

    if !(x2 > x1) || !(y2 > y1) {
        return None;
    }

    Some(DeviceRect { x1, y1, x2, y2 })
}

/// Placement for an image watermark: `scale` of the page width, aspect
/// preserved, shrunk to the page height if needed, centered. PDF user space.
pub fn centered_box(
    page_width: f64,
    page_height: f64,
    image_width: f64,
    image_height: f64,
    scale: f64,
) -> DeviceRect {
    let mut width = page_width * scale;
    let mut height = width * (image_height / image_width);
    if height > page_height {
        height = page_height;
        width = height * (image_width / image_height);
    }

    let x1 = (page_width - width) / 2.0;
    let y1 = (page_height - height) / 2.0;
    DeviceRect {
        x1,
        y1,
        x2: x1 + width,
        y2: y1 + height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    fn rect(left: f64, top: f64, width: f64, height: f64) -> NormalizedRect {
        NormalizedRect {
            left,
            top,
            width,
            height,
        }
    }

    #[test]
    fn test_maps_letter_page_region() {
        let mapped = map_rect(&rect(0.1, 0.2, 0.4, 0.08), 612.0, 792.0).unwrap();
        assert!((mapped.x1 - 61.2).abs() < EPS);
        assert!((mapped.x2 - 306.0).abs() < EPS);
        assert!((mapped.y2 - 633.6).abs() < 1e-6);
        assert!((mapped.y1 - 570.24).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_size_is_dropped() {
        assert!(map_rect(&rect(0.1, 0.1, 0.0, 0.2), 612.0, 792.0).is_none());
        assert!(map_rect(&rect(0.1, 0.1, 0.2, 0.0), 612.0, 792.0).is_none());
        assert!(map_rect(&rect(0.1, 0.1, -0.2, 0.2), 612.0, 792.0).is_none());
        assert!(map_rect(&rect(0.1, 0.1, f64::NAN, 0.2), 612.0, 792.0).is_none());
    }

    #[test]
    fn test_negative_left_is_floor_clamped() {
        let mapped = map_rect(&rect(-0.1, 0.0, 0.3, 0.5), 100.0, 100.0).unwrap();
        assert!((mapped.x1 - 0.0).abs() < EPS);
        assert!((mapped.x2 - 20.0).abs() < EPS);
    }

    #[test]
    fn test_overflow_is_clipped_at_page_edge() {
        let mapped = map_rect(&rect(0.8, 0.9, 0.5, 0.5), 100.0, 200.0).unwrap();
        assert!((mapped.x2 - 100.0).abs() < EPS);
        assert!((mapped.y1 - 0.0).abs() < EPS);
        assert!((mapped.y2 - 20.0).abs() < EPS);
    }

    #[test]
    fn test_region_fully_off_page_is_dropped() {
        assert!(map_rect(&rect(1.2, 0.1, 0.3, 0.1), 612.0, 792.0).is_none());
        assert!(map_rect(&rect(0.1, 1.5, 0.3, 0.1), 612.0, 792.0).is_none());
    }

    #[test]
    fn test_quad_points_order() {
        let r = DeviceRect {
            x1: 1.0,
            y1: 2.0,
            x2: 3.0,
            y2: 4.0,
        };
        assert_eq!(r.quad_points(), [1.0, 4.0, 3.0, 4.0, 1.0, 2.0, 3.0, 2.0]);
    }

    #[test]
    fn test_centered_box_scales_by_width() {
        let b = centered_box(600.0, 800.0, 200.0, 100.0, 0.5);
        assert!((b.width() - 300.0).abs() < EPS);
        assert!((b.height() - 150.0).abs() < EPS);
        assert!((b.x1 - 150.0).abs() < EPS);
        assert!((b.y1 - 325.0).abs() < EPS);
    }

    #[test]
    fn test_centered_box_shrinks_tall_images_to_page() {
        let b = centered_box(600.0, 800.0, 100.0, 1000.0, 1.0);
        assert!((b.height() - 800.0).abs() < EPS);
        assert!((b.width() - 80.0).abs() < EPS);
        assert!((b.y1 - 0.0).abs() < EPS);
    }

    proptest! {
        #[test]
        fn mapped_rects_are_never_degenerate(
            left in -1.0f64..2.0,
            top in -1.0f64..2.0,
            width in -1.0f64..2.0,
            height in -1.0f64..2.0,
            page_width in 1.0f64..2000.0,
            page_height in 1.0f64..2000.0,
        ) {
            if let Some(mapped) = map_rect(&rect(left, top, width, height), page_width, page_height) {
                prop_assert!(mapped.x2 > mapped.x1);
                prop_assert!(mapped.y2 > mapped.y1);
                prop_assert!(mapped.x2 <= page_width + 1e-9);
                prop_assert!(mapped.y1 >= 0.0);
                prop_assert!(mapped.y2 <= page_height + 1e-9);
            }
        }
    }
}
