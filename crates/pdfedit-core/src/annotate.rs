//! Highlight annotations from viewer overlays

use lopdf::{dictionary, Document, Object, ObjectId};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::document::{real, PdfDocument};
use crate::error::PdfEditError;
use crate::geometry::{map_rect, DeviceRect, NormalizedRect};

/// Opacity of highlight annotations.
pub const HIGHLIGHT_OPACITY: f64 = 0.65;

/// One highlight request as sent by a viewer. Every field is optional:
/// anything missing or non-numeric makes the item a no-op.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HighlightItem {
    pub page_index: Option<i64>,
    pub left: Option<f64>,
    pub top: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl HighlightItem {
    /// Lenient conversion: numbers and numeric strings are accepted.
    pub fn from_value(value: &Value) -> Self {
        let field = |name: &str| value.get(name).and_then(lenient_f64);
        Self {
            page_index: value.get("pageIndex").and_then(lenient_i64),
            left: field("left"),
            top: field("top"),
            width: field("width"),
            height: field("height"),
        }
    }

    pub fn rect(&self) -> Option<NormalizedRect> {
        Some(NormalizedRect {
            left: self.left?,
            top: self.top?,
            width: self.width?,
            height: self.height?,
        })
    }
}

fn lenient_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse the `highlights` form field: a JSON list of items.
pub fn parse_highlights(payload: &str) -> Result<Vec<HighlightItem>, PdfEditError> {
    let payload = if payload.trim().is_empty() {
        "[]"
    } else {
        payload
    };
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| PdfEditError::Input(format!("Invalid highlight payload: {}", e)))?;
    match value {
        Value::Array(items) => Ok(items.iter().map(HighlightItem::from_value).collect()),
        _ => Err(PdfEditError::Input("Highlights must be a list".into())),
    }
}

/// Add a yellow highlight annotation for every valid item, on the page its
/// `page_index` names. Items for pages that do not exist are ignored.
pub fn highlight(pdf: &[u8], items: &[HighlightItem]) -> Result<Vec<u8>, PdfEditError> {
    let mut doc = PdfDocument::open(pdf)?;
    let mut added = 0;

    for index in 0..doc.page_count() {
        let page_items = items
            .iter()
            .filter(|item| item.page_index == Some(index as i64));
        let (width, height) = doc.page_size(index)?;
        let page_id = doc.page_id(index)?;

        for item in page_items {
            let Some(rect) = item.rect().and_then(|r| map_rect(&r, width, height)) else {
                debug!("Skipping unusable highlight {:?}", item);
                continue;
            };
            add_highlight_annotation(doc.inner_mut(), page_id, &rect)?;
            added += 1;
        }
    }

    info!(
        "Added {} of {} highlights",
        added,
        items.len()
    );
    doc.serialize()
}

fn add_highlight_annotation(
    doc: &mut Document,
    page_id: ObjectId,
    rect: &DeviceRect,
) -> Result<(), PdfEditError> {
    let annot = dictionary! {
        "Type" => "Annot",
        "Subtype" => "Highlight",
        "Rect" => vec![real(rect.x1), real(rect.y1), real(rect.x2), real(rect.y2)],
        "QuadPoints" => rect.quad_points().iter().map(|&v| real(v)).collect::<Vec<_>>(),
        "C" => vec![real(1.0), real(1.0), real(0.0)],
        "CA" => real(HIGHLIGHT_OPACITY),
    };
    let annot_id = doc.add_object(annot);
    add_annotation_to_page(doc, page_id, annot_id)
}

fn add_annotation_to_page(
    doc: &mut Document,
    page_id: ObjectId,
    annot_id: ObjectId,
) -> Result<(), PdfEditError> {
    let page = doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| PdfEditError::Operation(e.to_string()))?;

    let shared_array = match page.get_mut(b"Annots") {
        Ok(Object::Array(annots)) => {
            annots.push(Object::Reference(annot_id));
            return Ok(());
        }
        Ok(Object::Reference(array_id)) => Some(*array_id),
        _ => None,
    };

    match shared_array {
        Some(array_id) => match doc.get_object_mut(array_id) {
            Ok(Object::Array(annots)) => annots.push(Object::Reference(annot_id)),
            _ => {
                return Err(PdfEditError::Format(
                    "Page /Annots is not an array".into(),
                ))
            }
        },
        None => page.set("Annots", Object::Array(vec![Object::Reference(annot_id)])),
    }
    Ok(())
}
