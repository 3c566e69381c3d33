//! In-memory fixture documents for unit tests.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

use crate::document::PdfDocument;
use crate::layout::number;

/// Dictionary for one of the standard 14 fonts.
pub fn standard_font(base_font: &str) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => Object::Name(base_font.as_bytes().to_vec()),
        "Encoding" => "WinAnsiEncoding",
    }
}

/// One Letter page with the given content stream and named font resources.
pub fn page_pdf(content: &str, fonts: Vec<(&str, Dictionary)>) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut font_dict = Dictionary::new();
    for (name, font) in fonts {
        let font_id = doc.add_object(font);
        font_dict.set(name, Object::Reference(font_id));
    }

    let content_id = doc.add_object(Stream::new(
        Dictionary::new(),
        content.as_bytes().to_vec(),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => Object::Reference(content_id),
        "Resources" => dictionary! { "Font" => font_dict },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc
}

/// `num_pages` Letter pages, each showing "Page N" in Helvetica.
pub fn numbered_pdf(num_pages: u32) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(standard_font("Helvetica"));

    let mut kids = Vec::new();
    for i in 0..num_pages {
        let content = format!("BT /F1 12 Tf 100 700 Td (Page {}) Tj ET", i + 1);
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => num_pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc
}

pub fn save(doc: &mut Document) -> Vec<u8> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Serialized [`numbered_pdf`].
pub fn blank_pdf(num_pages: u32) -> Vec<u8> {
    save(&mut numbered_pdf(num_pages))
}

/// Text of every page, in page order.
pub fn page_texts(bytes: &[u8]) -> Vec<String> {
    let doc = PdfDocument::open(bytes).unwrap();
    (0..doc.page_count())
        .map(|i| doc.structured_text(i).unwrap().text())
        .collect()
}

/// Decoded content stream of one page.
pub fn page_operations(doc: &PdfDocument, index: usize) -> Vec<Operation> {
    let page_id = doc.page_id(index).unwrap();
    let data = doc.inner().get_page_content(page_id).unwrap();
    Content::decode(&data).unwrap().operations
}

/// Numeric operands of every occurrence of `operator`.
pub fn operands_of(operations: &[Operation], operator: &str) -> Vec<Vec<f64>> {
    operations
        .iter()
        .filter(|op| op.operator == operator)
        .map(|op| {
            op.operands
                .iter()
                .filter_map(number)
                .map(|v| (v * 1000.0).round() / 1000.0)
                .collect()
        })
        .collect()
}
