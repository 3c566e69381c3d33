//! Structured text extraction
//!
//! Interprets a page content stream and groups the text it paints into runs
//! (one font, size and color on one baseline), lines and blocks, in the order
//! the content stream paints them. Boxes are reported in page space: origin at
//! the top-left of the MediaBox, y growing downward.

use std::collections::HashMap;
use std::rc::Rc;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId};
use serde::Serialize;
use tracing::debug;

use crate::encoding::{decode_win_ansi, ToUnicodeMap};
use crate::error::PdfEditError;
use crate::geometry::PageRect;
use crate::metrics::{StandardFamily, ASCENT, DESCENT};

/// Nesting limit for form XObjects painting other form XObjects.
const MAX_FORM_DEPTH: usize = 8;

/// Smallest style-homogeneous piece of text on a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextRun {
    pub text: String,
    /// Base font name as written in the document, subset prefix included.
    pub font: String,
    /// Effective size in points (font size scaled by the text and CTM matrices).
    pub size: f64,
    /// Fill color packed as 0xRRGGBB.
    pub color: u32,
    pub bbox: PageRect,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLine {
    pub runs: Vec<TextRun>,
    pub bbox: PageRect,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBlock {
    pub lines: Vec<TextLine>,
    pub bbox: PageRect,
}

/// Layout tree of one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredText {
    pub width: f64,
    pub height: f64,
    pub blocks: Vec<TextBlock>,
}

impl StructuredText {
    /// Interpret the content of `page_id`. `media_box` is `[x0, y0, x1, y1]` in user space.
    pub fn extract(
        doc: &Document,
        page_id: ObjectId,
        media_box: [f64; 4],
        resources: Option<&Dictionary>,
    ) -> Result<Self, PdfEditError> {
        let content = doc
            .get_page_content(page_id)
            .map_err(|e| PdfEditError::Format(format!("Unreadable page content: {}", e)))?;
        let content = Content::decode(&content)
            .map_err(|e| PdfEditError::Format(format!("Malformed content stream: {}", e)))?;

        let mut interpreter = Interpreter::new(doc, media_box);
        interpreter.run(&content.operations, resources, GraphicsState::default(), 0);
        debug!(
            "Page {:?}: {} text pieces painted",
            page_id,
            interpreter.pieces.len()
        );

        Ok(Self {
            width: media_box[2] - media_box[0],
            height: media_box[3] - media_box[1],
            blocks: group_pieces(interpreter.pieces),
        })
    }

    /// Runs in reading order: blocks, then lines, then runs. Lazy and restartable.
    pub fn runs(&self) -> impl Iterator<Item = &TextRun> + '_ {
        self.blocks
            .iter()
            .flat_map(|block| block.lines.iter())
            .flat_map(|line| line.runs.iter())
    }

    /// Plain text: runs concatenated, lines separated by newlines, blocks by blank lines.
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .map(|block| {
                block
                    .lines
                    .iter()
                    .map(|line| line.runs.iter().map(|r| r.text.as_str()).collect::<String>())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn from_operands(operands: &[Object]) -> Option<Self> {
        let values: Vec<f64> = operands.iter().filter_map(number).collect();
        if values.len() != 6 {
            return None;
        }
        Some(Matrix {
            a: values[0],
            b: values[1],
            c: values[2],
            d: values[3],
            e: values[4],
            f: values[5],
        })
    }

    fn translation(tx: f64, ty: f64) -> Self {
        Matrix {
            e: tx,
            f: ty,
            ..Matrix::IDENTITY
        }
    }

    /// `self × other` in the PDF row-vector convention.
    fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    fill: u32,
    font: Option<Rc<FontInfo>>,
    font_size: f64,
    char_spacing: f64,
    word_spacing: f64,
    horizontal_scale: f64,
    leading: f64,
    rise: f64,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            fill: 0,
            font: None,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

/// What the interpreter needs to know about a font to decode and measure text.
#[derive(Debug)]
struct FontInfo {
    base_font: String,
    composite: bool,
    to_unicode: Option<ToUnicodeMap>,
    first_char: u32,
    widths: Vec<f64>,
    cid_widths: HashMap<u32, f64>,
    default_width: f64,
    family: StandardFamily,
}

struct Glyph {
    text: String,
    width: f64,
    is_space: bool,
}

impl FontInfo {
    fn load(doc: &Document, font: &Dictionary) -> Self {
        let base_font = name_of(doc, font.get(b"BaseFont").ok()).unwrap_or_default();
        let composite = name_of(doc, font.get(b"Subtype").ok()).as_deref() == Some("Type0");

        let to_unicode = font
            .get(b"ToUnicode")
            .ok()
            .and_then(|obj| stream_bytes(doc, obj))
            .map(|data| ToUnicodeMap::parse(&data))
            .filter(|map| !map.is_empty());

        let first_char = font
            .get(b"FirstChar")
            .ok()
            .and_then(|o| number(resolve(doc, o)))
            .unwrap_or(0.0) as u32;
        let widths = font
            .get(b"Widths")
            .ok()
            .and_then(|o| resolve(doc, o).as_array().ok())
            .map(|arr| {
                arr.iter()
                    .map(|w| number(resolve(doc, w)).unwrap_or(0.0))
                    .collect()
            })
            .unwrap_or_default();

        let mut cid_widths = HashMap::new();
        let mut default_width = 1000.0;
        if composite {
            let descendant = font
                .get(b"DescendantFonts")
                .ok()
                .and_then(|o| resolve(doc, o).as_array().ok())
                .and_then(|arr| arr.first())
                .and_then(|o| resolve(doc, o).as_dict().ok());
            if let Some(descendant) = descendant {
                if let Some(dw) = descendant
                    .get(b"DW")
                    .ok()
                    .and_then(|o| number(resolve(doc, o)))
                {
                    default_width = dw;
                }
                if let Ok(w) = descendant.get(b"W") {
                    if let Ok(entries) = resolve(doc, w).as_array() {
                        cid_widths = parse_cid_widths(doc, entries);
                    }
                }
            }
        }

        let family = StandardFamily::for_font(&base_font);
        Self {
            base_font,
            composite,
            to_unicode,
            first_char,
            widths,
            cid_widths,
            default_width,
            family,
        }
    }

    fn decode(&self, bytes: &[u8]) -> Vec<Glyph> {
        let code_width = if self.composite {
            self.to_unicode.as_ref().map_or(2, |m| m.code_width()).clamp(1, 4)
        } else {
            1
        };

        bytes
            .chunks(code_width)
            .map(|chunk| {
                let code = chunk.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b));
                let text = match self.to_unicode.as_ref().and_then(|m| m.get(code)) {
                    Some(mapped) => mapped.to_string(),
                    None if self.composite => char::from_u32(code)
                        .filter(|c| !c.is_control())
                        .unwrap_or('\u{FFFD}')
                        .to_string(),
                    None => decode_win_ansi(code as u8).to_string(),
                };
                let width = self.glyph_width(code, &text);
                Glyph {
                    is_space: chunk.len() == 1 && code == 32,
                    text,
                    width,
                }
            })
            .collect()
    }

    /// Width in thousandths of the font size.
    fn glyph_width(&self, code: u32, text: &str) -> f64 {
        if self.composite {
            return self
                .cid_widths
                .get(&code)
                .copied()
                .unwrap_or(self.default_width);
        }
        if code >= self.first_char {
            if let Some(&w) = self.widths.get((code - self.first_char) as usize) {
                if w > 0.0 {
                    return w;
                }
            }
        }
        text.chars().map(|c| self.family.char_width(c)).sum()
    }
}

fn parse_cid_widths(doc: &Document, entries: &[Object]) -> HashMap<u32, f64> {
    let mut widths = HashMap::new();
    let mut i = 0;
    while i < entries.len() {
        let Some(first) = number(resolve(doc, &entries[i])) else {
            i += 1;
            continue;
        };
        match entries.get(i + 1).map(|o| resolve(doc, o)) {
            Some(Object::Array(list)) => {
                for (offset, w) in list.iter().enumerate() {
                    let cid = (first as u32).checked_add(offset as u32);
                    if let (Some(cid), Some(w)) = (cid, number(resolve(doc, w))) {
                        widths.insert(cid, w);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let last = number(last).unwrap_or(first);
                let w = entries
                    .get(i + 2)
                    .and_then(|o| number(resolve(doc, o)))
                    .unwrap_or(1000.0);
                let first = first as u32;
                for cid in first..=(last as u32).min(first.saturating_add(0xFFFF)) {
                    widths.insert(cid, w);
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}

/// Text painted by one show operator.
#[derive(Debug, Clone)]
struct Piece {
    text: String,
    font: String,
    size: f64,
    color: u32,
    bbox: PageRect,
    baseline: f64,
}

struct Interpreter<'a> {
    doc: &'a Document,
    media_box: [f64; 4],
    fonts: HashMap<ObjectId, Rc<FontInfo>>,
    pieces: Vec<Piece>,
}

impl<'a> Interpreter<'a> {
    fn new(doc: &'a Document, media_box: [f64; 4]) -> Self {
        Self {
            doc,
            media_box,
            fonts: HashMap::new(),
            pieces: Vec::new(),
        }
    }

    fn run(
        &mut self,
        operations: &[Operation],
        resources: Option<&Dictionary>,
        initial: GraphicsState,
        depth: usize,
    ) {
        let mut state = initial;
        let mut stack: Vec<GraphicsState> = Vec::new();
        let mut tm = Matrix::IDENTITY;
        let mut tlm = Matrix::IDENTITY;

        for op in operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "q" => stack.push(state.clone()),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        state = saved;
                    }
                }
                "cm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        state.ctm = m.then(&state.ctm);
                    }
                }
                "BT" => {
                    tm = Matrix::IDENTITY;
                    tlm = Matrix::IDENTITY;
                }
                "Tf" => {
                    if let (Some(Object::Name(name)), Some(size)) =
                        (operands.first(), operands.get(1).and_then(number))
                    {
                        state.font = self.font(resources, name);
                        state.font_size = size;
                    }
                }
                "Tc" => set_number(&mut state.char_spacing, operands),
                "Tw" => set_number(&mut state.word_spacing, operands),
                "TL" => set_number(&mut state.leading, operands),
                "Ts" => set_number(&mut state.rise, operands),
                "Tz" => {
                    if let Some(scale) = operands.first().and_then(number) {
                        state.horizontal_scale = scale / 100.0;
                    }
                }
                "Td" | "TD" => {
                    if let (Some(tx), Some(ty)) = (
                        operands.first().and_then(number),
                        operands.get(1).and_then(number),
                    ) {
                        if op.operator == "TD" {
                            state.leading = -ty;
                        }
                        tlm = Matrix::translation(tx, ty).then(&tlm);
                        tm = tlm;
                    }
                }
                "Tm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        tlm = m;
                        tm = m;
                    }
                }
                "T*" => {
                    tlm = Matrix::translation(0.0, -state.leading).then(&tlm);
                    tm = tlm;
                }
                "Tj" => {
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        self.show(&state, &mut tm, &[TextItem::Bytes(bytes)]);
                    }
                }
                "'" => {
                    tlm = Matrix::translation(0.0, -state.leading).then(&tlm);
                    tm = tlm;
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        self.show(&state, &mut tm, &[TextItem::Bytes(bytes)]);
                    }
                }
                "\"" => {
                    set_number(&mut state.word_spacing, operands);
                    if let Some(ac) = operands.get(1).and_then(number) {
                        state.char_spacing = ac;
                    }
                    tlm = Matrix::translation(0.0, -state.leading).then(&tlm);
                    tm = tlm;
                    if let Some(Object::String(bytes, _)) = operands.get(2) {
                        self.show(&state, &mut tm, &[TextItem::Bytes(bytes)]);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        let items: Vec<TextItem<'_>> = items
                            .iter()
                            .filter_map(|item| match item {
                                Object::String(bytes, _) => Some(TextItem::Bytes(bytes)),
                                other => number(other).map(TextItem::Adjust),
                            })
                            .collect();
                        self.show(&state, &mut tm, &items);
                    }
                }
                "g" => {
                    if let Some(gray) = operands.first().and_then(number) {
                        state.fill = pack_rgb(gray, gray, gray);
                    }
                }
                "rg" => {
                    if let Some(color) = rgb_operands(operands) {
                        state.fill = color;
                    }
                }
                "k" => {
                    if let Some(color) = cmyk_operands(operands) {
                        state.fill = color;
                    }
                }
                "sc" | "scn" => {
                    let values: Vec<f64> = operands.iter().filter_map(number).collect();
                    match values.len() {
                        1 => state.fill = pack_rgb(values[0], values[0], values[0]),
                        3 => state.fill = pack_rgb(values[0], values[1], values[2]),
                        4 => {
                            if let Some(color) = cmyk_operands(operands) {
                                state.fill = color;
                            }
                        }
                        _ => {}
                    }
                }
                "cs" => state.fill = 0,
                "Do" if depth < MAX_FORM_DEPTH => {
                    if let Some(Object::Name(name)) = operands.first() {
                        self.paint_form(resources, name, &state, depth);
                    }
                }
                _ => {}
            }
        }
    }

    fn font(&mut self, resources: Option<&Dictionary>, name: &[u8]) -> Option<Rc<FontInfo>> {
        let doc = self.doc;
        let fonts = resources?.get(b"Font").ok().map(|o| resolve(doc, o))?;
        let entry = fonts.as_dict().ok()?.get(name).ok()?;

        if let Object::Reference(id) = entry {
            if let Some(info) = self.fonts.get(id) {
                return Some(Rc::clone(info));
            }
            let dict = doc.get_object(*id).ok()?.as_dict().ok()?;
            let info = Rc::new(FontInfo::load(doc, dict));
            self.fonts.insert(*id, Rc::clone(&info));
            return Some(info);
        }

        entry
            .as_dict()
            .ok()
            .map(|dict| Rc::new(FontInfo::load(doc, dict)))
    }

    fn paint_form(
        &mut self,
        resources: Option<&Dictionary>,
        name: &[u8],
        state: &GraphicsState,
        depth: usize,
    ) {
        let doc = self.doc;
        let Some(xobjects) = resources
            .and_then(|r| r.get(b"XObject").ok())
            .and_then(|o| resolve(doc, o).as_dict().ok())
        else {
            return;
        };
        let Some(Object::Stream(stream)) = xobjects.get(name).ok().map(|o| resolve(doc, o)) else {
            return;
        };
        if name_of(doc, stream.dict.get(b"Subtype").ok()).as_deref() != Some("Form") {
            return;
        }

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());
        let Ok(content) = Content::decode(&data) else {
            debug!("Skipping undecodable form XObject");
            return;
        };

        let matrix = stream
            .dict
            .get(b"Matrix")
            .ok()
            .and_then(|o| resolve(doc, o).as_array().ok())
            .and_then(|arr| Matrix::from_operands(arr))
            .unwrap_or(Matrix::IDENTITY);
        let form_resources = stream
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|o| resolve(doc, o).as_dict().ok())
            .or(resources);

        let mut inner = state.clone();
        inner.ctm = matrix.then(&state.ctm);
        self.run(&content.operations, form_resources, inner, depth + 1);
    }

    fn show(&mut self, state: &GraphicsState, tm: &mut Matrix, items: &[TextItem<'_>]) {
        let Some(font) = state.font.clone() else {
            return;
        };
        let size = state.font_size;
        let h_scale = state.horizontal_scale;

        let start = tm.then(&state.ctm);
        let mut text = String::new();
        for item in items {
            match item {
                TextItem::Bytes(bytes) => {
                    for glyph in font.decode(bytes) {
                        let mut advance = glyph.width / 1000.0 * size + state.char_spacing;
                        if glyph.is_space {
                            advance += state.word_spacing;
                        }
                        *tm = Matrix::translation(advance * h_scale, 0.0).then(tm);
                        text.push_str(&glyph.text);
                    }
                }
                TextItem::Adjust(amount) => {
                    if *amount < -200.0 && !text.is_empty() && !text.ends_with(' ') {
                        text.push(' ');
                    }
                    let advance = -amount / 1000.0 * size * h_scale;
                    *tm = Matrix::translation(advance, 0.0).then(tm);
                }
            }
        }
        if text.is_empty() {
            return;
        }
        let end = tm.then(&state.ctm);

        // Text space to user space for the baseline start and end points.
        let (sx, sy) = start.apply(0.0, state.rise);
        let (ex, ey) = end.apply(0.0, state.rise);
        let up = (start.c * size, start.d * size);
        let effective_size = up.0.hypot(up.1);

        let corners = [
            (sx + up.0 * ASCENT, sy + up.1 * ASCENT),
            (sx - up.0 * DESCENT, sy - up.1 * DESCENT),
            (ex + up.0 * ASCENT, ey + up.1 * ASCENT),
            (ex - up.0 * DESCENT, ey - up.1 * DESCENT),
        ];
        let (x0_user, y1_page_top) = (self.media_box[0], self.media_box[3]);
        let to_page = |(x, y): (f64, f64)| (x - x0_user, y1_page_top - y);
        let page_corners: Vec<(f64, f64)> = corners.iter().copied().map(to_page).collect();

        let bbox = PageRect {
            x0: page_corners.iter().map(|c| c.0).fold(f64::INFINITY, f64::min),
            y0: page_corners.iter().map(|c| c.1).fold(f64::INFINITY, f64::min),
            x1: page_corners.iter().map(|c| c.0).fold(f64::NEG_INFINITY, f64::max),
            y1: page_corners.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max),
        };

        self.pieces.push(Piece {
            text,
            font: font.base_font.clone(),
            size: effective_size,
            color: state.fill,
            bbox,
            baseline: to_page((sx, sy)).1,
        });
    }
}

enum TextItem<'b> {
    Bytes(&'b [u8]),
    Adjust(f64),
}

/// Group painted pieces into runs, lines and blocks.
fn group_pieces(pieces: Vec<Piece>) -> Vec<TextBlock> {
    let mut lines: Vec<(f64, TextLine)> = Vec::new();

    for piece in pieces {
        let tolerance = piece.size * 0.5;
        let continues_line = lines.last().is_some_and(|(baseline, line)| {
            (baseline - piece.baseline).abs() <= tolerance
                && piece.bbox.x0 >= line.bbox.x1 - tolerance
        });

        if !continues_line {
            lines.push((
                piece.baseline,
                TextLine {
                    bbox: piece.bbox,
                    runs: vec![piece.into_run()],
                },
            ));
            continue;
        }

        let Some((_, line)) = lines.last_mut() else {
            continue;
        };
        line.bbox = line.bbox.union(&piece.bbox);
        match line.runs.last_mut() {
            Some(run) if same_style(run, &piece) && piece.bbox.x0 - run.bbox.x1 <= piece.size => {
                let gap = piece.bbox.x0 - run.bbox.x1;
                if gap > piece.size * 0.25 && !run.text.ends_with(' ') && !piece.text.starts_with(' ')
                {
                    run.text.push(' ');
                }
                run.text.push_str(&piece.text);
                run.bbox = run.bbox.union(&piece.bbox);
            }
            _ => line.runs.push(piece.into_run()),
        }
    }

    let mut blocks: Vec<TextBlock> = Vec::new();
    for (_, line) in lines {
        let joins_block = blocks.last().is_some_and(|block| {
            block.lines.last().is_some_and(|prev| {
                let gap = line.bbox.y0 - prev.bbox.y1;
                line.bbox.y0 >= prev.bbox.y0 && gap <= prev.bbox.height() * 0.8
            })
        });
        match blocks.last_mut() {
            Some(block) if joins_block => {
                block.bbox = block.bbox.union(&line.bbox);
                block.lines.push(line);
            }
            _ => blocks.push(TextBlock {
                bbox: line.bbox,
                lines: vec![line],
            }),
        }
    }
    blocks
}

fn same_style(run: &TextRun, piece: &Piece) -> bool {
    run.font == piece.font && (run.size - piece.size).abs() < 0.01 && run.color == piece.color
}

impl Piece {
    fn into_run(self) -> TextRun {
        TextRun {
            text: self.text,
            font: self.font,
            size: self.size,
            color: self.color,
            bbox: self.bbox,
        }
    }
}

/// Numeric value of an integer or real object.
pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

/// Follow one level of indirection.
pub(crate) fn resolve<'d>(doc: &'d Document, obj: &'d Object) -> &'d Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

fn name_of(doc: &Document, obj: Option<&Object>) -> Option<String> {
    match resolve(doc, obj?) {
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

fn stream_bytes(doc: &Document, obj: &Object) -> Option<Vec<u8>> {
    match resolve(doc, obj) {
        Object::Stream(stream) => Some(
            stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone()),
        ),
        _ => None,
    }
}

fn set_number(target: &mut f64, operands: &[Object]) {
    if let Some(value) = operands.first().and_then(number) {
        *target = value;
    }
}

fn rgb_operands(operands: &[Object]) -> Option<u32> {
    let values: Vec<f64> = operands.iter().filter_map(number).collect();
    (values.len() == 3).then(|| pack_rgb(values[0], values[1], values[2]))
}

fn cmyk_operands(operands: &[Object]) -> Option<u32> {
    let values: Vec<f64> = operands.iter().filter_map(number).collect();
    if values.len() != 4 {
        return None;
    }
    let k = values[3];
    Some(pack_rgb(
        (1.0 - values[0]) * (1.0 - k),
        (1.0 - values[1]) * (1.0 - k),
        (1.0 - values[2]) * (1.0 - k),
    ))
}

fn pack_rgb(r: f64, g: f64, b: f64) -> u32 {
    let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
    (channel(r) << 16) | (channel(g) << 8) | channel(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{page_pdf, standard_font};
    use pretty_assertions::assert_eq;

    fn layout_of(content: &str) -> StructuredText {
        let doc = page_pdf(content, vec![("F1", standard_font("Helvetica"))]);
        let page_id = *doc.get_pages().get(&1).unwrap();
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let resources = resolve(&doc, page.get(b"Resources").unwrap())
            .as_dict()
            .unwrap();
        StructuredText::extract(&doc, page_id, [0.0, 0.0, 612.0, 792.0], Some(resources)).unwrap()
    }

    #[test]
    fn test_single_run_box_and_style() {
        let layout = layout_of("BT /F1 10 Tf 0.2 0.4 0.6 rg 100 700 Td (Total) Tj ET");
        let runs: Vec<&TextRun> = layout.runs().collect();
        assert_eq!(runs.len(), 1);
        let run = runs[0];
        assert_eq!(run.text, "Total");
        assert_eq!(run.font, "Helvetica");
        assert!((run.size - 10.0).abs() < 1e-9);
        assert_eq!(run.color, 0x336699);
        assert!((run.bbox.x0 - 100.0).abs() < 1e-6);
        assert!((run.bbox.x1 - 122.23).abs() < 1e-6);
        // Baseline 700 user space is 92 in page space; ascent 8, descent 2.
        assert!((run.bbox.y0 - 84.0).abs() < 1e-6);
        assert!((run.bbox.y1 - 94.0).abs() < 1e-6);
    }

    #[test]
    fn test_lines_and_blocks_follow_paint_order() {
        let layout = layout_of(
            "BT /F1 12 Tf 72 700 Td (First line) Tj 0 -14 Td (Second line) Tj ET \
             BT /F1 12 Tf 72 400 Td (Far below) Tj ET",
        );
        assert_eq!(layout.blocks.len(), 2);
        assert_eq!(layout.blocks[0].lines.len(), 2);
        assert_eq!(layout.text(), "First line\nSecond line\n\nFar below");
    }

    #[test]
    fn test_adjacent_shows_merge_into_one_run() {
        let layout = layout_of("BT /F1 12 Tf 72 700 Td (Grand ) Tj (Total) Tj ET");
        let runs: Vec<&TextRun> = layout.runs().collect();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "Grand Total");
    }

    #[test]
    fn test_color_change_splits_runs_on_one_line() {
        let layout = layout_of("BT /F1 12 Tf 72 700 Td (Due: ) Tj 1 0 0 rg (42) Tj ET");
        let runs: Vec<&TextRun> = layout.runs().collect();
        assert_eq!(runs.len(), 2);
        assert_eq!(layout.blocks[0].lines.len(), 1);
        assert_eq!(runs[1].text, "42");
        assert_eq!(runs[1].color, 0xFF0000);
    }

    #[test]
    fn test_tj_kerning_gap_becomes_space() {
        let layout = layout_of("BT /F1 12 Tf 72 700 Td [(Hello) -300 (World)] TJ ET");
        assert_eq!(layout.text(), "Hello World");
    }

    #[test]
    fn test_ctm_scales_effective_size() {
        let layout = layout_of("q 2 0 0 2 0 0 cm BT /F1 10 Tf 50 300 Td (Big) Tj ET Q");
        let run = layout.runs().next().unwrap();
        assert!((run.size - 20.0).abs() < 1e-9);
        assert!((run.bbox.x0 - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_runs_iterator_is_restartable() {
        let layout = layout_of("BT /F1 12 Tf 72 700 Td (One) Tj 0 -14 Td (Two) Tj ET");
        let first: Vec<String> = layout.runs().map(|r| r.text.clone()).collect();
        let second: Vec<String> = layout.runs().map(|r| r.text.clone()).collect();
        assert_eq!(first, second);
        assert_eq!(first, vec!["One".to_string(), "Two".to_string()]);
    }

    #[test]
    fn test_text_without_font_is_ignored() {
        let layout = layout_of("BT 72 700 Td (orphan) Tj ET");
        assert!(layout.blocks.is_empty());
    }

    #[test]
    fn test_cid_widths_near_the_top_of_the_cid_range() {
        let doc = Document::with_version("1.7");
        let top = i64::from(u32::MAX);
        let entries = vec![
            Object::Integer(top - 1),
            Object::Integer(top),
            Object::Integer(500),
            Object::Integer(top),
            Object::Array(vec![Object::Integer(600), Object::Integer(700)]),
            Object::Integer(10),
            Object::Array(vec![Object::Integer(250), Object::Integer(300)]),
        ];
        let widths = parse_cid_widths(&doc, &entries);
        assert_eq!(widths.get(&(u32::MAX - 1)), Some(&500.0));
        assert_eq!(widths.get(&u32::MAX), Some(&600.0));
        assert_eq!(widths.get(&10), Some(&250.0));
        assert_eq!(widths.get(&11), Some(&300.0));
        assert_eq!(widths.len(), 4);
    }
}
