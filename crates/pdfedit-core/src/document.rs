//! Document engine over lopdf
//!
//! Everything the editing operations need from a PDF library: page lookup
//! with inherited attributes, structured text, fonts, and appending drawing
//! operations to a page without disturbing its existing content.

use std::collections::{HashMap, HashSet};
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::debug;

use crate::encoding::{decode_win_ansi, encode_win_ansi};
use crate::error::PdfEditError;
use crate::geometry::{PageRect, Point};
use crate::layout::{number, resolve, StructuredText};
use crate::metrics::StandardFamily;

/// US Letter, used when a page has no usable MediaBox.
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Fill color with components in 0..=1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub const BLACK: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub const fn gray(level: f64) -> Rgb {
        Rgb {
            r: level,
            g: level,
            b: level,
        }
    }

    pub(crate) fn operation(&self) -> Operation {
        Operation::new("rg", vec![real(self.r), real(self.g), real(self.b)])
    }
}

/// A font registered in the document, usable by [`PdfDocument::draw_text`].
#[derive(Debug, Clone, PartialEq)]
pub struct FontRef {
    name: String,
    base_font: String,
    id: ObjectId,
    metrics: FontMetrics,
}

#[derive(Debug, Clone, PartialEq)]
enum FontMetrics {
    Standard(StandardFamily),
    /// Widths for WinAnsi codes 32..=255, thousandths of the size.
    Embedded(Vec<f64>),
}

impl FontRef {
    /// Logical name, also the preferred resource name on pages.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_font(&self) -> &str {
        &self.base_font
    }

    pub fn object_id(&self) -> ObjectId {
        self.id
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self.metrics, FontMetrics::Embedded(_))
    }

    /// Advance width of `text` at `size`, measured as it will be encoded.
    pub fn text_width(&self, text: &str, size: f64) -> f64 {
        let units: f64 = encode_win_ansi(text)
            .into_iter()
            .map(|code| match &self.metrics {
                FontMetrics::Standard(family) => family.char_width(decode_win_ansi(code)),
                FontMetrics::Embedded(widths) => code
                    .checked_sub(32)
                    .and_then(|i| widths.get(i as usize))
                    .copied()
                    .unwrap_or(0.0),
            })
            .sum();
        units * size / 1000.0
    }
}

/// Short resource names for the standard fonts, as PDF editors commonly use them.
fn builtin_resource_name(base_font: &str) -> String {
    match base_font {
        "Helvetica" => "helv".to_string(),
        "Times-Roman" => "tiro".to_string(),
        "Courier" => "cour".to_string(),
        other => other
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase(),
    }
}

/// Where a page's `/Resources` dictionary lives.
#[derive(Debug, Clone, Copy)]
enum ResourcesHolder {
    Page(ObjectId),
    Object(ObjectId),
}

/// An open PDF, editable page by page.
pub struct PdfDocument {
    doc: Document,
    page_ids: Vec<ObjectId>,
    /// Pages whose original content is already wrapped in `q ... Q`.
    isolated: HashSet<ObjectId>,
    builtin_fonts: HashMap<String, FontRef>,
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("pages", &self.page_ids.len())
            .finish()
    }
}

impl PdfDocument {
    /// Parse a document. Encrypted documents are refused; see [`crate::security::unlock`].
    pub fn open(bytes: &[u8]) -> Result<Self, PdfEditError> {
        let doc = Document::load_mem(bytes).map_err(|e| PdfEditError::Format(e.to_string()))?;
        if doc.trailer.get(b"Encrypt").is_ok() {
            return Err(PdfEditError::Password(
                "Document is encrypted; unlock it first".into(),
            ));
        }
        Ok(Self::from_document(doc))
    }

    pub(crate) fn from_document(doc: Document) -> Self {
        let page_ids = doc.get_pages().into_values().collect();
        Self {
            doc,
            page_ids,
            isolated: HashSet::new(),
            builtin_fonts: HashMap::new(),
        }
    }

    pub(crate) fn inner(&self) -> &Document {
        &self.doc
    }

    pub(crate) fn inner_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub(crate) fn into_inner(self) -> Document {
        self.doc
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Object id of the page at zero-based `index`.
    pub fn page_id(&self, index: usize) -> Result<ObjectId, PdfEditError> {
        self.page_ids.get(index).copied().ok_or_else(|| {
            PdfEditError::Range(format!(
                "Page index {} out of range for {} pages",
                index,
                self.page_ids.len()
            ))
        })
    }

    /// `[x0, y0, x1, y1]` of the page's MediaBox in user space, normalized.
    pub fn media_box(&self, index: usize) -> Result<[f64; 4], PdfEditError> {
        let page_id = self.page_id(index)?;
        let values: Vec<f64> = inherited(&self.doc, page_id, b"MediaBox")
            .and_then(|o| o.as_array().ok())
            .map(|arr| arr.iter().filter_map(|o| number(resolve(&self.doc, o))).collect())
            .unwrap_or_default();

        if values.len() != 4 {
            return Ok(DEFAULT_MEDIA_BOX);
        }
        let media_box = [
            values[0].min(values[2]),
            values[1].min(values[3]),
            values[0].max(values[2]),
            values[1].max(values[3]),
        ];
        if media_box[2] - media_box[0] <= 0.0 || media_box[3] - media_box[1] <= 0.0 {
            return Ok(DEFAULT_MEDIA_BOX);
        }
        Ok(media_box)
    }

    /// `(width, height)` in points.
    pub fn page_size(&self, index: usize) -> Result<(f64, f64), PdfEditError> {
        let mb = self.media_box(index)?;
        Ok((mb[2] - mb[0], mb[3] - mb[1]))
    }

    /// Effective `/Rotate`, normalized to 0, 90, 180 or 270.
    pub fn rotation(&self, index: usize) -> Result<i64, PdfEditError> {
        let page_id = self.page_id(index)?;
        let rotate = match inherited(&self.doc, page_id, b"Rotate") {
            Some(Object::Integer(value)) => *value,
            Some(Object::Real(value)) => *value as i64,
            _ => 0,
        };
        Ok(rotate.rem_euclid(360) / 90 * 90)
    }

    pub fn set_rotation(&mut self, index: usize, degrees: i64) -> Result<(), PdfEditError> {
        let page_id = self.page_id(index)?;
        self.page_dict_mut(page_id)?
            .set("Rotate", Object::Integer(degrees.rem_euclid(360)));
        Ok(())
    }

    /// Layout tree of the page at `index`.
    pub fn structured_text(&self, index: usize) -> Result<StructuredText, PdfEditError> {
        let page_id = self.page_id(index)?;
        let media_box = self.media_box(index)?;
        let resources = inherited(&self.doc, page_id, b"Resources").and_then(|o| o.as_dict().ok());
        StructuredText::extract(&self.doc, page_id, media_box, resources)
    }

    /// Register one of the standard 14 fonts, WinAnsi encoded. Idempotent per name.
    pub fn builtin_font(&mut self, base_font: &str) -> FontRef {
        if let Some(font) = self.builtin_fonts.get(base_font) {
            return font.clone();
        }

        let id = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => Object::Name(base_font.as_bytes().to_vec()),
            "Encoding" => "WinAnsiEncoding",
        });
        let font = FontRef {
            name: builtin_resource_name(base_font),
            base_font: base_font.to_string(),
            id,
            metrics: FontMetrics::Standard(StandardFamily::for_font(base_font)),
        };
        self.builtin_fonts
            .insert(base_font.to_string(), font.clone());
        font
    }

    /// Embed a TrueType/OpenType program as a simple WinAnsi font named `name`.
    pub fn embed_font(&mut self, name: &str, program: &[u8]) -> Result<FontRef, PdfEditError> {
        let face = ttf_parser::Face::parse(program, 0)
            .map_err(|e| PdfEditError::Font(format!("Unreadable font program: {}", e)))?;
        let units_per_em = f64::from(face.units_per_em().max(1));
        let scale = |v: i16| (f64::from(v) * 1000.0 / units_per_em).round() as i64;

        let widths: Vec<f64> = (32u8..=255)
            .map(|code| {
                face.glyph_index(decode_win_ansi(code))
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
                    .map(|advance| (f64::from(advance) * 1000.0 / units_per_em).round())
                    .unwrap_or(0.0)
            })
            .collect();

        let bbox = face.global_bounding_box();
        let descriptor_id = {
            let data = deflate(program)?;
            let file_id = self.doc.add_object(Stream::new(
                dictionary! {
                    "Filter" => "FlateDecode",
                    "Length1" => program.len() as i64,
                },
                data,
            ));
            self.doc.add_object(dictionary! {
                "Type" => "FontDescriptor",
                "FontName" => Object::Name(name.as_bytes().to_vec()),
                "Flags" => 32,
                "FontBBox" => vec![
                    scale(bbox.x_min).into(),
                    scale(bbox.y_min).into(),
                    scale(bbox.x_max).into(),
                    scale(bbox.y_max).into(),
                ],
                "ItalicAngle" => 0,
                "Ascent" => scale(face.ascender()),
                "Descent" => scale(face.descender()),
                "CapHeight" => scale(face.capital_height().unwrap_or(face.ascender())),
                "StemV" => 80,
                "FontFile2" => Object::Reference(file_id),
            })
        };

        let id = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "TrueType",
            "BaseFont" => Object::Name(name.as_bytes().to_vec()),
            "FirstChar" => 32,
            "LastChar" => 255,
            "Widths" => widths.iter().map(|w| Object::Integer(*w as i64)).collect::<Vec<_>>(),
            "FontDescriptor" => Object::Reference(descriptor_id),
            "Encoding" => "WinAnsiEncoding",
        });
        debug!("Embedded font '{}' ({} bytes) as {:?}", name, program.len(), id);

        Ok(FontRef {
            name: name.to_string(),
            base_font: name.to_string(),
            id,
            metrics: FontMetrics::Embedded(widths),
        })
    }

    /// Paint an opaque rectangle given in page space.
    pub fn draw_filled_rect(
        &mut self,
        index: usize,
        rect: PageRect,
        color: Rgb,
    ) -> Result<(), PdfEditError> {
        let mb = self.media_box(index)?;
        let x = rect.x0 + mb[0];
        let y = mb[3] - rect.y1;
        self.append_content(
            index,
            vec![
                Operation::new("q", vec![]),
                color.operation(),
                Operation::new(
                    "re",
                    vec![real(x), real(y), real(rect.width()), real(rect.height())],
                ),
                Operation::new("f", vec![]),
                Operation::new("Q", vec![]),
            ],
        )
    }

    /// Show `text` with its baseline starting at `origin` (page space).
    pub fn draw_text(
        &mut self,
        index: usize,
        origin: Point,
        text: &str,
        font: &FontRef,
        size: f64,
        color: Rgb,
    ) -> Result<(), PdfEditError> {
        let mb = self.media_box(index)?;
        let resource = self.add_page_resource(index, b"Font", font.name(), font.id)?;
        self.append_content(
            index,
            vec![
                Operation::new("q", vec![]),
                color.operation(),
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(resource.into_bytes()), real(size)],
                ),
                Operation::new("Td", vec![real(origin.x + mb[0]), real(mb[3] - origin.y)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
                ),
                Operation::new("ET", vec![]),
                Operation::new("Q", vec![]),
            ],
        )
    }

    /// Register `id` under `/Resources/<category>` of the page and return the
    /// name it is reachable by. A name already bound to another object gets a
    /// numeric suffix instead of being overwritten.
    pub(crate) fn add_page_resource(
        &mut self,
        index: usize,
        category: &[u8],
        preferred: &str,
        id: ObjectId,
    ) -> Result<String, PdfEditError> {
        let page_id = self.page_id(index)?;
        let holder = self.resources_holder(page_id)?;

        let category_ref = match self.resources_dict_mut(holder)?.get(category) {
            Ok(Object::Reference(category_id)) => Some(*category_id),
            _ => None,
        };
        let category_dict: &mut Dictionary = match category_ref {
            Some(category_id) => self
                .doc
                .get_object_mut(category_id)
                .and_then(Object::as_dict_mut)
                .map_err(|e| PdfEditError::Operation(format!("Bad resource dictionary: {}", e)))?,
            None => {
                let resources = self.resources_dict_mut(holder)?;
                if !matches!(resources.get(category), Ok(Object::Dictionary(_))) {
                    resources.set(category.to_vec(), Object::Dictionary(Dictionary::new()));
                }
                resources
                    .get_mut(category)
                    .and_then(Object::as_dict_mut)
                    .map_err(|e| PdfEditError::Operation(e.to_string()))?
            }
        };

        let mut name = preferred.to_string();
        let mut suffix = 1;
        loop {
            match category_dict.get(name.as_bytes()) {
                Ok(Object::Reference(existing)) if *existing == id => return Ok(name),
                Ok(_) => {
                    name = format!("{}{}", preferred, suffix);
                    suffix += 1;
                }
                Err(_) => break,
            }
        }
        category_dict.set(name.clone(), Object::Reference(id));
        Ok(name)
    }

    /// Append operations after the page's existing content. The first call
    /// per page wraps the existing content in `q ... Q` so the page's leftover
    /// graphics state cannot leak into the new drawing.
    pub(crate) fn append_content(
        &mut self,
        index: usize,
        operations: Vec<Operation>,
    ) -> Result<(), PdfEditError> {
        let page_id = self.page_id(index)?;
        let encoded = Content { operations }
            .encode()
            .map_err(|e| PdfEditError::Operation(format!("Content encoding failed: {}", e)))?;
        let mut data = b"\n".to_vec();
        data.extend_from_slice(&encoded);
        data.push(b'\n');
        let new_id = self.doc.add_object(Stream::new(Dictionary::new(), data));

        let existing: Vec<Object> = match self.page_dict_mut(page_id)?.get(b"Contents") {
            Ok(Object::Array(items)) => items.clone(),
            Ok(Object::Reference(id)) => vec![Object::Reference(*id)],
            _ => Vec::new(),
        };

        let contents = if self.isolated.insert(page_id) && !existing.is_empty() {
            let save_id = self
                .doc
                .add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
            let restore_id = self
                .doc
                .add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
            let mut contents = Vec::with_capacity(existing.len() + 3);
            contents.push(Object::Reference(save_id));
            contents.extend(existing);
            contents.push(Object::Reference(restore_id));
            contents.push(Object::Reference(new_id));
            contents
        } else {
            let mut contents = existing;
            contents.push(Object::Reference(new_id));
            contents
        };

        self.page_dict_mut(page_id)?
            .set("Contents", Object::Array(contents));
        Ok(())
    }

    /// Save to bytes.
    pub fn serialize(&mut self) -> Result<Vec<u8>, PdfEditError> {
        save_document(&mut self.doc)
    }

    fn page_dict_mut(&mut self, page_id: ObjectId) -> Result<&mut Dictionary, PdfEditError> {
        self.doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| PdfEditError::Operation(format!("Bad page object: {}", e)))
    }

    /// Locate the page's resources, copying inherited ones onto the page
    /// first so edits stay local to it.
    fn resources_holder(&mut self, page_id: ObjectId) -> Result<ResourcesHolder, PdfEditError> {
        match self.page_dict_mut(page_id)?.get(b"Resources") {
            Ok(Object::Reference(id)) => return Ok(ResourcesHolder::Object(*id)),
            Ok(Object::Dictionary(_)) => return Ok(ResourcesHolder::Page(page_id)),
            _ => {}
        }

        let copied = inherited(&self.doc, page_id, b"Resources")
            .and_then(|o| o.as_dict().ok())
            .cloned()
            .unwrap_or_default();
        self.page_dict_mut(page_id)?
            .set("Resources", Object::Dictionary(copied));
        Ok(ResourcesHolder::Page(page_id))
    }

    fn resources_dict_mut(
        &mut self,
        holder: ResourcesHolder,
    ) -> Result<&mut Dictionary, PdfEditError> {
        let result = match holder {
            ResourcesHolder::Object(id) => self.doc.get_object_mut(id).and_then(Object::as_dict_mut),
            ResourcesHolder::Page(page_id) => self
                .doc
                .get_object_mut(page_id)
                .and_then(Object::as_dict_mut)
                .and_then(|page| page.get_mut(b"Resources"))
                .and_then(Object::as_dict_mut),
        };
        result.map_err(|e| PdfEditError::Operation(format!("Bad resource dictionary: {}", e)))
    }
}

/// Look `key` up on the page, then up its `/Parent` chain.
pub(crate) fn inherited<'d>(doc: &'d Document, page_id: ObjectId, key: &[u8]) -> Option<&'d Object> {
    let mut node = doc.get_object(page_id).ok()?.as_dict().ok()?;
    // Bounded walk; malformed files can contain Parent cycles.
    for _ in 0..64 {
        if let Ok(value) = node.get(key) {
            return Some(resolve(doc, value));
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_object(parent).ok()?.as_dict().ok()?;
    }
    None
}

pub(crate) fn save_document(doc: &mut Document) -> Result<Vec<u8>, PdfEditError> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfEditError::Operation(format!("Failed to save PDF: {}", e)))?;
    Ok(buffer)
}

pub(crate) fn real(value: f64) -> Object {
    Object::Real(value as _)
}

/// zlib-compress for a `/FlateDecode` stream.
pub(crate) fn deflate(data: &[u8]) -> Result<Vec<u8>, PdfEditError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .map_err(|e| PdfEditError::Operation(format!("Compression failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{blank_pdf, operands_of, page_pdf, page_operations, standard_font};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_open_rejects_garbage() {
        let err = PdfDocument::open(b"not a pdf").unwrap_err();
        assert!(matches!(err, PdfEditError::Format(_)));
    }

    #[test]
    fn test_page_lookup_and_size() {
        let doc = PdfDocument::open(&blank_pdf(3)).unwrap();
        assert_eq!(doc.page_count(), 3);
        assert_eq!(doc.page_size(2).unwrap(), (612.0, 792.0));
        assert!(matches!(doc.page_id(3), Err(PdfEditError::Range(_))));
    }

    #[test]
    fn test_rotation_roundtrip() {
        let mut doc = PdfDocument::open(&blank_pdf(1)).unwrap();
        assert_eq!(doc.rotation(0).unwrap(), 0);
        doc.set_rotation(0, 450).unwrap();
        assert_eq!(doc.rotation(0).unwrap(), 90);
    }

    #[test]
    fn test_drawing_wraps_existing_content_once() {
        let mut doc = PdfDocument::from_document(page_pdf(
            "BT /F1 12 Tf 72 700 Td (Hello) Tj ET",
            vec![("F1", standard_font("Helvetica"))],
        ));
        doc.draw_filled_rect(
            0,
            PageRect {
                x0: 10.0,
                y0: 20.0,
                x1: 110.0,
                y1: 40.0,
            },
            Rgb::WHITE,
        )
        .unwrap();
        doc.draw_filled_rect(
            0,
            PageRect {
                x0: 0.0,
                y0: 0.0,
                x1: 1.0,
                y1: 1.0,
            },
            Rgb::BLACK,
        )
        .unwrap();

        let ops = page_operations(&doc, 0);
        assert_eq!(ops[0].operator, "q");
        assert_eq!(ops.iter().filter(|op| op.operator == "Tj").count(), 1);
        // y = 792 - 40 in user space.
        assert_eq!(operands_of(&ops, "re")[0], vec![10.0, 752.0, 100.0, 20.0]);
        let page_id = doc.page_id(0).unwrap();
        let contents = doc
            .inner()
            .get_dictionary(page_id)
            .unwrap()
            .get(b"Contents")
            .unwrap()
            .as_array()
            .unwrap()
            .len();
        assert_eq!(contents, 5);
    }

    #[test]
    fn test_draw_text_registers_font_resource() {
        let mut doc = PdfDocument::open(&blank_pdf(1)).unwrap();
        let font = doc.builtin_font("Helvetica");
        assert_eq!(font.name(), "helv");
        doc.draw_text(
            0,
            Point { x: 72.0, y: 92.0 },
            "Hi",
            &font,
            12.0,
            Rgb::BLACK,
        )
        .unwrap();

        // The fixture page paints its own "Page 1" first; the drawn text comes last.
        let ops = page_operations(&doc, 0);
        let tf = ops.iter().rev().find(|op| op.operator == "Tf").unwrap();
        assert!(matches!(&tf.operands[0], Object::Name(name) if name == b"helv"));
        assert_eq!(operands_of(&ops, "Td").last().unwrap(), &vec![72.0, 700.0]);

        let layout = doc.structured_text(0).unwrap();
        let run = layout.runs().find(|run| run.text.contains("Hi")).unwrap();
        assert_eq!(run.text, "Hi");
        assert_eq!(run.font, "Helvetica");
    }

    #[test]
    fn test_resource_name_clash_gets_suffix() {
        let mut doc = PdfDocument::from_document(page_pdf(
            "",
            vec![("helv", standard_font("Courier"))],
        ));
        let font = doc.builtin_font("Helvetica");
        let name = doc.add_page_resource(0, b"Font", font.name(), font.object_id()).unwrap();
        assert_eq!(name, "helv1");
        let again = doc.add_page_resource(0, b"Font", font.name(), font.object_id()).unwrap();
        assert_eq!(again, "helv1");
    }

    #[test]
    fn test_builtin_font_is_registered_once() {
        let mut doc = PdfDocument::open(&blank_pdf(1)).unwrap();
        let a = doc.builtin_font("Courier");
        let b = doc.builtin_font("Courier");
        assert_eq!(a, b);
        assert!(!a.is_embedded());
        assert!((a.text_width("abc", 10.0) - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_embed_font_rejects_non_font_bytes() {
        let mut doc = PdfDocument::open(&blank_pdf(1)).unwrap();
        let err = doc.embed_font("matchfont", b"definitely not a font").unwrap_err();
        assert!(matches!(err, PdfEditError::Font(_)));
    }

    #[test]
    fn test_inherited_media_box() {
        let mut raw = page_pdf("", vec![]);
        let page_id = *raw.get_pages().get(&1).unwrap();
        let parent = raw
            .get_dictionary(page_id)
            .unwrap()
            .get(b"Parent")
            .unwrap()
            .as_reference()
            .unwrap();
        raw.get_object_mut(page_id)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .remove(b"MediaBox");
        raw.get_object_mut(parent)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set("MediaBox", vec![0.into(), 0.into(), 595.into(), 842.into()]);

        let doc = PdfDocument::from_document(raw);
        assert_eq!(doc.page_size(0).unwrap(), (595.0, 842.0));
    }
}
