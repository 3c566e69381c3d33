//! Text and image watermarks stamped on every page

use lopdf::content::Operation;
use lopdf::{dictionary, Object, ObjectId, Stream, StringFormat};
use tracing::{debug, info};

use crate::document::{deflate, real, PdfDocument, Rgb};
use crate::encoding::encode_win_ansi;
use crate::error::PdfEditError;
use crate::geometry::centered_box;

const WATERMARK_FONT: &str = "Helvetica";
const WATERMARK_GRAY: f64 = 0.5;

/// Rotated text centered on each page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextWatermark {
    pub text: String,
    pub opacity: f64,
    /// Counter-clockwise, in degrees.
    pub rotation: f64,
    pub font_size: f64,
}

impl TextWatermark {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            opacity: 0.3,
            rotation: 45.0,
            font_size: 50.0,
        }
    }
}

/// Translucent image centered on each page.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageWatermark {
    /// PNG or JPEG bytes.
    pub image: Vec<u8>,
    pub opacity: f64,
    /// Fraction of the page width the image spans.
    pub scale: f64,
}

impl ImageWatermark {
    pub fn new(image: Vec<u8>) -> Self {
        Self {
            image,
            opacity: 0.3,
            scale: 0.5,
        }
    }
}

fn check_opacity(opacity: f64) -> Result<f64, PdfEditError> {
    if opacity.is_finite() {
        Ok(opacity.clamp(0.0, 1.0))
    } else {
        Err(PdfEditError::Input(format!("Invalid opacity: {}", opacity)))
    }
}

fn transparency_state(doc: &mut PdfDocument, opacity: f64) -> ObjectId {
    doc.inner_mut().add_object(dictionary! {
        "Type" => "ExtGState",
        "ca" => real(opacity),
        "CA" => real(opacity),
    })
}

/// Stamp `watermark` on every page.
pub fn watermark_text(pdf: &[u8], watermark: &TextWatermark) -> Result<Vec<u8>, PdfEditError> {
    let opacity = check_opacity(watermark.opacity)?;
    if !(watermark.font_size > 0.0) || !watermark.font_size.is_finite() {
        return Err(PdfEditError::Input(format!(
            "Invalid font size: {}",
            watermark.font_size
        )));
    }
    if !watermark.rotation.is_finite() {
        return Err(PdfEditError::Input("Invalid rotation".into()));
    }

    let mut doc = PdfDocument::open(pdf)?;
    let font = doc.builtin_font(WATERMARK_FONT);
    let state_id = transparency_state(&mut doc, opacity);

    let half_width = font.text_width(&watermark.text, watermark.font_size) / 2.0;
    let (sin, cos) = watermark.rotation.to_radians().sin_cos();

    for index in 0..doc.page_count() {
        let mb = doc.media_box(index)?;
        let center_x = (mb[0] + mb[2]) / 2.0;
        let center_y = (mb[1] + mb[3]) / 2.0;
        let state = doc.add_page_resource(index, b"ExtGState", "GSwm", state_id)?;
        let font_name = doc.add_page_resource(index, b"Font", font.name(), font.object_id())?;

        doc.append_content(
            index,
            vec![
                Operation::new("q", vec![]),
                Operation::new("gs", vec![Object::Name(state.into_bytes())]),
                Rgb::gray(WATERMARK_GRAY).operation(),
                Operation::new(
                    "cm",
                    vec![
                        real(1.0),
                        real(0.0),
                        real(0.0),
                        real(1.0),
                        real(center_x),
                        real(center_y),
                    ],
                ),
                Operation::new(
                    "cm",
                    vec![
                        real(cos),
                        real(sin),
                        real(-sin),
                        real(cos),
                        real(0.0),
                        real(0.0),
                    ],
                ),
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![
                        Object::Name(font_name.into_bytes()),
                        real(watermark.font_size),
                    ],
                ),
                Operation::new("Td", vec![real(-half_width), real(0.0)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        encode_win_ansi(&watermark.text),
                        StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
                Operation::new("Q", vec![]),
            ],
        )?;
    }

    info!(
        "Text watermark '{}' on {} pages (opacity {}, {}°)",
        watermark.text,
        doc.page_count(),
        opacity,
        watermark.rotation
    );
    doc.serialize()
}

/// Decode the image into an RGB image XObject whose grayscale soft mask
/// is the constant `255 * opacity`. The source alpha channel is replaced,
/// so transparent pixels show at the watermark opacity too.
fn image_xobject(
    doc: &mut PdfDocument,
    image: &[u8],
    opacity: f64,
) -> Result<(ObjectId, u32, u32), PdfEditError> {
    let decoded = image::load_from_memory(image)
        .map_err(|e| PdfEditError::Image(e.to_string()))?
        .to_rgba8();
    let (width, height) = decoded.dimensions();
    if width == 0 || height == 0 {
        return Err(PdfEditError::Image("Image has no pixels".into()));
    }

    let pixels = (width * height) as usize;
    let mut rgb = Vec::with_capacity(pixels * 3);
    for pixel in decoded.pixels() {
        let [r, g, b, _] = pixel.0;
        rgb.extend_from_slice(&[r, g, b]);
    }
    let alpha = vec![(255.0 * opacity) as u8; pixels];

    let mask = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        deflate(&alpha)?,
    );
    let mask_id = doc.inner_mut().add_object(mask);

    let picture = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
            "SMask" => Object::Reference(mask_id),
        },
        deflate(&rgb)?,
    );
    let id = doc.inner_mut().add_object(picture);
    debug!("Image watermark {}x{} as {:?}", width, height, id);
    Ok((id, width, height))
}

/// Draw `watermark` centered on every page.
pub fn watermark_image(
    pdf: &[u8],
    watermark: &ImageWatermark,
) -> Result<Vec<u8>, PdfEditError> {
    let opacity = check_opacity(watermark.opacity)?;
    if !(watermark.scale > 0.0) || !watermark.scale.is_finite() {
        return Err(PdfEditError::Input(format!(
            "Invalid scale: {}",
            watermark.scale
        )));
    }

    let mut doc = PdfDocument::open(pdf)?;
    let (image_id, image_width, image_height) = image_xobject(&mut doc, &watermark.image, opacity)?;

    for index in 0..doc.page_count() {
        let mb = doc.media_box(index)?;
        let (page_width, page_height) = doc.page_size(index)?;
        let placement = centered_box(
            page_width,
            page_height,
            image_width as f64,
            image_height as f64,
            watermark.scale,
        );
        let name = doc.add_page_resource(index, b"XObject", "WmImg", image_id)?;

        doc.append_content(
            index,
            vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        real(placement.width()),
                        real(0.0),
                        real(0.0),
                        real(placement.height()),
                        real(placement.x1 + mb[0]),
                        real(placement.y1 + mb[1]),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(name.into_bytes())]),
                Operation::new("Q", vec![]),
            ],
        )?;
    }

    info!(
        "Image watermark on {} pages (opacity {}, scale {})",
        doc.page_count(),
        opacity,
        watermark.scale
    );
    doc.serialize()
}
