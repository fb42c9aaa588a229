//! ToUnicode CMap parsing and generation

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Hex(Vec<u8>),
    Name(String),
    Keyword(String),
    Number(i64),
    ArrayStart,
    ArrayEnd,
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn tokenize(data: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < data.len() {
        let b = data[i];
        match b {
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
            }
            b'<' if data.get(i + 1) == Some(&b'<') => i += 2,
            b'>' if data.get(i + 1) == Some(&b'>') => i += 2,
            b'<' => {
                i += 1;
                let mut nibbles = Vec::new();
                while i < data.len() && data[i] != b'>' {
                    if let Some(v) = hex_value(data[i]) {
                        nibbles.push(v);
                    }
                    i += 1;
                }
                i += 1;
                if nibbles.len() % 2 == 1 {
                    nibbles.push(0);
                }
                let bytes = nibbles.chunks(2).map(|p| (p[0] << 4) | p[1]).collect();
                tokens.push(Token::Hex(bytes));
            }
            b'[' => {
                tokens.push(Token::ArrayStart);
                i += 1;
            }
            b']' => {
                tokens.push(Token::ArrayEnd);
                i += 1;
            }
            b'(' => {
                // Literal strings only appear in the CMap header
                let mut depth = 0;
                while i < data.len() {
                    match data[i] {
                        b'\\' => i += 1,
                        b'(' => depth += 1,
                        b')' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    i += 1;
                }
                i += 1;
            }
            b'/' => {
                let start = i + 1;
                i += 1;
                while i < data.len() && !is_delimiter(data[i]) {
                    i += 1;
                }
                tokens.push(Token::Name(
                    String::from_utf8_lossy(&data[start..i]).into_owned(),
                ));
            }
            _ if b.is_ascii_whitespace() => i += 1,
            _ => {
                let start = i;
                while i < data.len() && !is_delimiter(data[i]) {
                    i += 1;
                }
                if start == i {
                    i += 1;
                    continue;
                }
                let word = String::from_utf8_lossy(&data[start..i]).into_owned();
                match word.parse::<i64>() {
                    Ok(n) => tokens.push(Token::Number(n)),
                    Err(_) => tokens.push(Token::Keyword(word)),
                }
            }
        }
    }
    tokens
}

fn is_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace() || matches!(b, b'<' | b'>' | b'[' | b']' | b'(' | b')' | b'/' | b'%')
}

fn code_value(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

/// Decode a UTF-16BE destination string
fn utf16_be(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|c| {
            if c.len() == 2 {
                u16::from_be_bytes([c[0], c[1]])
            } else {
                c[0] as u16
            }
        })
        .collect();
    String::from_utf16_lossy(&units)
}

/// Parsed ToUnicode CMap
#[derive(Debug, Clone, Default)]
pub struct ToUnicodeMap {
    /// Code space ranges as (byte length, low, high)
    codespace: Vec<(usize, u32, u32)>,
    /// (byte length, code) -> text
    map: HashMap<(usize, u32), String>,
}

impl ToUnicodeMap {
    /// Parse CMap stream content
    pub fn parse(data: &[u8]) -> Self {
        let tokens = tokenize(data);
        let mut cmap = ToUnicodeMap::default();
        let mut i = 0;

        while i < tokens.len() {
            match &tokens[i] {
                Token::Keyword(k) if k == "begincodespacerange" => {
                    i += 1;
                    while let (Some(Token::Hex(lo)), Some(Token::Hex(hi))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        cmap.codespace
                            .push((lo.len(), code_value(lo), code_value(hi)));
                        i += 2;
                    }
                }
                Token::Keyword(k) if k == "beginbfchar" => {
                    i += 1;
                    loop {
                        match (tokens.get(i), tokens.get(i + 1)) {
                            (Some(Token::Hex(src)), Some(Token::Hex(dst))) => {
                                cmap.map
                                    .insert((src.len(), code_value(src)), utf16_be(dst));
                                i += 2;
                            }
                            (Some(Token::Hex(src)), Some(Token::Name(name))) => {
                                if let Some(c) = crate::encoding::glyph_name_to_char(name) {
                                    cmap.map.insert((src.len(), code_value(src)), c.to_string());
                                }
                                i += 2;
                            }
                            _ => break,
                        }
                    }
                }
                Token::Keyword(k) if k == "beginbfrange" => {
                    i += 1;
                    while let (Some(Token::Hex(lo)), Some(Token::Hex(hi))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        let len = lo.len();
                        let (lo_v, hi_v) = (code_value(lo), code_value(hi));
                        i += 2;
                        match tokens.get(i) {
                            Some(Token::Hex(dst)) => {
                                let base = utf16_be(dst);
                                for (offset, code) in (lo_v..=hi_v).take(0x10000).enumerate() {
                                    if let Some(text) = increment_last(&base, offset as u32) {
                                        cmap.map.insert((len, code), text);
                                    }
                                }
                                i += 1;
                            }
                            Some(Token::ArrayStart) => {
                                i += 1;
                                let mut code = Some(lo_v);
                                while let Some(Token::Hex(dst)) = tokens.get(i) {
                                    if let Some(c) = code.filter(|c| *c <= hi_v) {
                                        cmap.map.insert((len, c), utf16_be(dst));
                                    }
                                    code = code.and_then(|c| c.checked_add(1));
                                    i += 1;
                                }
                                if let Some(Token::ArrayEnd) = tokens.get(i) {
                                    i += 1;
                                }
                            }
                            _ => break,
                        }
                    }
                }
                _ => i += 1,
            }
        }
        cmap
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Byte length of the code starting at `bytes`, per the code space ranges
    pub fn code_length(&self, bytes: &[u8]) -> Option<usize> {
        self.codespace
            .iter()
            .filter(|(len, _, _)| *len <= bytes.len())
            .find(|(len, lo, hi)| {
                let v = code_value(&bytes[..*len]);
                v >= *lo && v <= *hi
            })
            .map(|(len, _, _)| *len)
    }

    /// True when every code space range uses one-byte codes
    pub fn is_single_byte(&self) -> bool {
        !self.codespace.is_empty() && self.codespace.iter().all(|(len, _, _)| *len == 1)
    }

    /// Look up the text for a code of the given byte length
    pub fn lookup(&self, len: usize, code: u32) -> Option<&str> {
        self.map.get(&(len, code)).map(String::as_str)
    }
}

fn increment_last(base: &str, offset: u32) -> Option<String> {
    let mut chars: Vec<char> = base.chars().collect();
    let last = chars.pop()?;
    chars.push(char::from_u32(last as u32 + offset)?);
    Some(chars.into_iter().collect())
}

/// Build a ToUnicode CMap from (code, character) pairs
///
/// `code_bytes` is 1 for simple fonts and 2 for Identity-H composite fonts.
pub fn build_tounicode_cmap(code_bytes: usize, entries: &[(u32, char)]) -> String {
    let width = code_bytes * 2;
    let mut cmap = String::new();

    cmap.push_str("/CIDInit /ProcSet findresource begin\n");
    cmap.push_str("12 dict begin\n");
    cmap.push_str("begincmap\n");
    cmap.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
    cmap.push_str("/CMapName /Adobe-Identity-UCS def\n");
    cmap.push_str("/CMapType 2 def\n");
    cmap.push_str("1 begincodespacerange\n");
    if code_bytes == 1 {
        cmap.push_str("<00> <FF>\n");
    } else {
        cmap.push_str("<0000> <FFFF>\n");
    }
    cmap.push_str("endcodespacerange\n");

    // At most 100 entries per bfchar section
    for chunk in entries.chunks(100) {
        cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for (code, c) in chunk {
            let mut units = [0u16; 2];
            let hex: String = c
                .encode_utf16(&mut units)
                .iter()
                .map(|u| format!("{u:04X}"))
                .collect();
            cmap.push_str(&format!("<{code:0width$X}> <{hex}>\n"));
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str("endcmap\n");
    cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
    cmap.push_str("end\n");
    cmap.push_str("end\n");
    cmap
}
