//! Character code translation
//!
//! Simple fonts are read and written through WinAnsiEncoding. Composite fonts
//! are read through their `/ToUnicode` CMap.

use std::collections::HashMap;

/// WinAnsiEncoding for codes 0x80..=0x9F, the only block that differs from Latin-1.
const WIN_ANSI_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'),
    None,
    Some('\u{201A}'),
    Some('\u{0192}'),
    Some('\u{201E}'),
    Some('\u{2026}'),
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{02C6}'),
    Some('\u{2030}'),
    Some('\u{0160}'),
    Some('\u{2039}'),
    Some('\u{0152}'),
    None,
    Some('\u{017D}'),
    None,
    None,
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201C}'),
    Some('\u{201D}'),
    Some('\u{2022}'),
    Some('\u{2013}'),
    Some('\u{2014}'),
    Some('\u{02DC}'),
    Some('\u{2122}'),
    Some('\u{0161}'),
    Some('\u{203A}'),
    Some('\u{0153}'),
    None,
    Some('\u{017E}'),
    Some('\u{0178}'),
];

pub fn decode_win_ansi(code: u8) -> char {
    match code {
        0x80..=0x9F => WIN_ANSI_HIGH[(code - 0x80) as usize].unwrap_or('\u{FFFD}'),
        _ => char::from(code),
    }
}

/// Encode `text` for a simple font with WinAnsiEncoding. Unmappable characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| {
            let code = ch as u32;
            if code < 0x80 || (0xA0..=0xFF).contains(&code) {
                return code as u8;
            }
            WIN_ANSI_HIGH
                .iter()
                .position(|mapped| *mapped == Some(ch))
                .map(|i| 0x80 + i as u8)
                .unwrap_or(b'?')
        })
        .collect()
}

/// Code → text mapping parsed from a `/ToUnicode` CMap stream.
#[derive(Debug, Clone, Default)]
pub struct ToUnicodeMap {
    map: HashMap<u32, String>,
    /// Byte width of the source codes seen in the codespace or mappings.
    code_width: usize,
}

impl ToUnicodeMap {
    pub fn parse(data: &[u8]) -> Self {
        let tokens = tokenize(data);
        let mut map = HashMap::new();
        let mut code_width = 0;
        let mut i = 0;

        while i < tokens.len() {
            match &tokens[i] {
                Token::Keyword(kw) if kw == "begincodespacerange" => {
                    i += 1;
                    while i < tokens.len() && !tokens[i].is_keyword("endcodespacerange") {
                        if let Token::Hex(bytes) = &tokens[i] {
                            code_width = code_width.max(bytes.len());
                        }
                        i += 1;
                    }
                }
                Token::Keyword(kw) if kw == "beginbfchar" => {
                    i += 1;
                    while i + 1 < tokens.len() && !tokens[i].is_keyword("endbfchar") {
                        if let (Token::Hex(src), Token::Hex(dst)) = (&tokens[i], &tokens[i + 1]) {
                            code_width = code_width.max(src.len());
                            map.insert(code_value(src), utf16_be(dst));
                            i += 2;
                        } else {
                            i += 1;
                        }
                    }
                }
                Token::Keyword(kw) if kw == "beginbfrange" => {
                    i += 1;
                    while i + 2 < tokens.len() && !tokens[i].is_keyword("endbfrange") {
                        let (Token::Hex(lo), Token::Hex(hi)) = (&tokens[i], &tokens[i + 1]) else {
                            i += 1;
                            continue;
                        };
                        code_width = code_width.max(lo.len());
                        let (lo, hi) = (code_value(lo), code_value(hi));
                        match &tokens[i + 2] {
                            Token::Hex(dst) => {
                                let base = utf16_units(dst);
                                for (offset, code) in (lo..=hi).take(0x10000).enumerate() {
                                    let mut units = base.clone();
                                    if let Some(last) = units.last_mut() {
                                        *last = last.wrapping_add(offset as u16);
                                    }
                                    map.insert(code, String::from_utf16_lossy(&units));
                                }
                                i += 3;
                            }
                            Token::Array(items) => {
                                for (code, dst) in (lo..=hi).zip(items.iter()) {
                                    map.insert(code, utf16_be(dst));
                                }
                                i += 3;
                            }
                            _ => i += 1,
                        }
                    }
                }
                _ => {}
            }
            i += 1;
        }

        Self { map, code_width }
    }

    /// Source code width in bytes, 2 when the CMap gives no hint.
    pub fn code_width(&self) -> usize {
        if self.code_width == 0 {
            2
        } else {
            self.code_width
        }
    }

    pub fn get(&self, code: u32) -> Option<&str> {
        self.map.get(&code).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Hex(Vec<u8>),
    Array(Vec<Vec<u8>>),
    Keyword(String),
}

impl Token {
    fn is_keyword(&self, name: &str) -> bool {
        matches!(self, Token::Keyword(kw) if kw == name)
    }
}

fn tokenize(data: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut array: Option<Vec<Vec<u8>>> = None;
    let mut i = 0;

    while i < data.len() {
        match data[i] {
            b'<' if data.get(i + 1) != Some(&b'<') => {
                let end = data[i + 1..]
                    .iter()
                    .position(|&b| b == b'>')
                    .map_or(data.len(), |p| i + 1 + p);
                let bytes = hex_bytes(&data[i + 1..end]);
                match array.as_mut() {
                    Some(items) => items.push(bytes),
                    None => tokens.push(Token::Hex(bytes)),
                }
                i = end + 1;
            }
            b'[' => {
                array = Some(Vec::new());
                i += 1;
            }
            b']' => {
                if let Some(items) = array.take() {
                    tokens.push(Token::Array(items));
                }
                i += 1;
            }
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
            }
            b if b.is_ascii_alphabetic() => {
                let start = i;
                while i < data.len() && data[i].is_ascii_alphanumeric() {
                    i += 1;
                }
                tokens.push(Token::Keyword(
                    String::from_utf8_lossy(&data[start..i]).into_owned(),
                ));
            }
            _ => i += 1,
        }
    }

    tokens
}

fn hex_bytes(digits: &[u8]) -> Vec<u8> {
    let nibbles: Vec<u8> = digits
        .iter()
        .filter_map(|&b| (b as char).to_digit(16).map(|d| d as u8))
        .collect();
    nibbles
        .chunks(2)
        .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
        .collect()
}

fn code_value(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
}

fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks(2)
        .map(|pair| (u16::from(pair[0]) << 8) | u16::from(pair.get(1).copied().unwrap_or(0)))
        .collect()
}

fn utf16_be(bytes: &[u8]) -> String {
    String::from_utf16_lossy(&utf16_units(bytes))
}
