//! Page tree rewriting: reorder and rotate
//!
//! Reorder, split and merge all end the same way: a flat list of page objects
//! hung directly under the catalog's root `/Pages` node. Attributes the pages
//! used to inherit from intermediate nodes are copied onto the pages first.

use std::collections::HashSet;
use std::fmt;

use lopdf::{Document, Object, ObjectId};
use serde::Serialize;
use tracing::info;

use crate::document::{inherited, save_document, PdfDocument};
use crate::error::PdfEditError;
use crate::range::resolve;

/// Page attributes a page may inherit from its ancestors.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Quarter-turn clockwise rotations accepted by [`rotate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rotation {
    Quarter,
    Half,
    ThreeQuarters,
}

impl Rotation {
    pub fn degrees(self) -> i64 {
        match self {
            Rotation::Quarter => 90,
            Rotation::Half => 180,
            Rotation::ThreeQuarters => 270,
        }
    }
}

impl TryFrom<i64> for Rotation {
    type Error = PdfEditError;

    fn try_from(degrees: i64) -> Result<Self, Self::Error> {
        match degrees {
            90 => Ok(Rotation::Quarter),
            180 => Ok(Rotation::Half),
            270 => Ok(Rotation::ThreeQuarters),
            _ => Err(PdfEditError::Input(
                "Degrees must be 90, 180, or 270".into(),
            )),
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Object id of the catalog's root `/Pages` node.
pub(crate) fn root_pages_id(doc: &Document) -> Result<ObjectId, PdfEditError> {
    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| PdfEditError::Format("No Root in trailer".into()))?;
    doc.get_dictionary(catalog_id)
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|_| PdfEditError::Format("Catalog has no Pages reference".into()))
}

/// Make `pages` (in order, repeats allowed) the only kids of the root page node.
///
/// A page listed more than once is duplicated so every kid is a distinct object.
pub(crate) fn rebuild_page_tree(
    doc: &mut Document,
    pages: &[ObjectId],
) -> Result<(), PdfEditError> {
    let pages_id = root_pages_id(doc)?;
    let mut seen = HashSet::new();
    let mut kids = Vec::with_capacity(pages.len());

    for &page_id in pages {
        let mut page = doc
            .get_dictionary(page_id)
            .map_err(|e| PdfEditError::Format(format!("Bad page object {:?}: {}", page_id, e)))?
            .clone();
        for key in INHERITABLE {
            if page.get(key).is_err() {
                if let Some(value) = inherited(doc, page_id, key) {
                    page.set(key.to_vec(), value.clone());
                }
            }
        }
        page.set("Parent", Object::Reference(pages_id));

        let id = if seen.insert(page_id) {
            doc.objects.insert(page_id, Object::Dictionary(page));
            page_id
        } else {
            doc.add_object(page)
        };
        kids.push(Object::Reference(id));
    }

    let count = kids.len() as i64;
    let root = doc
        .get_object_mut(pages_id)
        .and_then(Object::as_dict_mut)
        .map_err(|_| PdfEditError::Format("Invalid pages dictionary".into()))?;
    root.set("Kids", Object::Array(kids));
    root.set("Count", Object::Integer(count));
    Ok(())
}

/// Concatenate the pages of each span of `order`, in the order written.
pub fn reorder(pdf: &[u8], order: &str) -> Result<Vec<u8>, PdfEditError> {
    let doc = PdfDocument::open(pdf)?;
    let ranges = resolve(order, doc.page_count() as u32)?;
    let pages = ranges
        .page_numbers()
        .map(|number| doc.page_id(number as usize - 1))
        .collect::<Result<Vec<_>, _>>()?;
    info!("Reordering {} pages as {}", doc.page_count(), ranges);

    let mut doc = doc.into_inner();
    rebuild_page_tree(&mut doc, &pages)?;
    doc.prune_objects();
    save_document(&mut doc)
}

/// Add `rotation` to every page selected by `ranges`; other pages keep theirs.
pub fn rotate(pdf: &[u8], ranges: &str, rotation: Rotation) -> Result<Vec<u8>, PdfEditError> {
    let mut doc = PdfDocument::open(pdf)?;
    let ranges = resolve(ranges, doc.page_count() as u32)?;

    for index in 0..doc.page_count() {
        if ranges.contains_index(index) {
            let current = doc.rotation(index)?;
            doc.set_rotation(index, (current + rotation.degrees()) % 360)?;
        }
    }
    info!("Rotated pages {} by {}", ranges, rotation);
    doc.serialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{blank_pdf, numbered_pdf, page_texts, save};
    use pretty_assertions::assert_eq;

    fn rotations(bytes: &[u8]) -> Vec<i64> {
        let doc = PdfDocument::open(bytes).unwrap();
        (0..doc.page_count())
            .map(|i| doc.rotation(i).unwrap())
            .collect()
    }

    #[test]
    fn test_rotation_values() {
        assert_eq!(Rotation::try_from(90).unwrap(), Rotation::Quarter);
        assert_eq!(Rotation::try_from(270).unwrap().degrees(), 270);
        assert!(matches!(
            Rotation::try_from(45),
            Err(PdfEditError::Input(_))
        ));
        assert!(Rotation::try_from(0).is_err());
        assert!(Rotation::try_from(360).is_err());
    }

    #[test]
    fn test_rotate_selected_pages_only() {
        let output = rotate(&blank_pdf(3), "1-2", Rotation::Half).unwrap();
        assert_eq!(rotations(&output), vec![180, 180, 0]);
    }

    #[test]
    fn test_rotate_adds_to_existing_rotation() {
        let once = rotate(&blank_pdf(2), "1-", Rotation::ThreeQuarters).unwrap();
        let twice = rotate(&once, "2", Rotation::Half).unwrap();
        assert_eq!(rotations(&twice), vec![270, 90]);
    }

    #[test]
    fn test_rotate_defaults_to_whole_document() {
        let output = rotate(&blank_pdf(2), "", Rotation::Quarter).unwrap();
        assert_eq!(rotations(&output), vec![90, 90]);
    }

    #[test]
    fn test_rotate_rejects_bad_range() {
        let err = rotate(&blank_pdf(2), "5", Rotation::Quarter).unwrap_err();
        assert!(matches!(err, PdfEditError::Range(_)));
    }

    #[test]
    fn test_reorder_follows_span_order() {
        let output = reorder(&blank_pdf(3), "3,1-2").unwrap();
        assert_eq!(page_texts(&output), vec!["Page 3", "Page 1", "Page 2"]);
    }

    #[test]
    fn test_reorder_keeps_repeats_as_distinct_pages() {
        let output = reorder(&blank_pdf(2), "2,1,2").unwrap();
        assert_eq!(page_texts(&output), vec!["Page 2", "Page 1", "Page 2"]);

        let doc = PdfDocument::open(&output).unwrap();
        let ids: HashSet<ObjectId> = (0..3).map(|i| doc.page_id(i).unwrap()).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_reorder_copies_inherited_attributes() {
        let mut raw = numbered_pdf(2);
        let pages_id = root_pages_id(&raw).unwrap();
        for page_id in raw.get_pages().into_values().collect::<Vec<_>>() {
            raw.get_object_mut(page_id)
                .unwrap()
                .as_dict_mut()
                .unwrap()
                .remove(b"MediaBox");
        }
        raw.get_object_mut(pages_id)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set("MediaBox", vec![0.into(), 0.into(), 300.into(), 400.into()]);

        let output = reorder(&save(&mut raw), "2,1").unwrap();
        let doc = PdfDocument::open(&output).unwrap();
        assert_eq!(doc.page_size(0).unwrap(), (300.0, 400.0));
    }
}
