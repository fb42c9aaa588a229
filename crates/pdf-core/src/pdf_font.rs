//! Decoding of strings shown with a page's font resources

use crate::cmap::ToUnicodeMap;
use crate::encoding::{dingbat_decode, glyph_name_to_char, BaseEncoding};
use crate::objects::{get, get_array, get_dict, get_name, get_number, number, resolve, stream_bytes};
use crate::standard::Standard14;
use crate::style::StyleFlags;
use lopdf::{Dictionary, Document, Object};
use std::collections::HashMap;
use std::ops::Range;

const DEFAULT_ASCENT: f64 = 800.0;
const DEFAULT_DESCENT: f64 = -200.0;
/// Assumed glyph width when a font gives no widths at all
const UNKNOWN_WIDTH: f64 = 500.0;
/// Largest CID a two-byte code can select
const MAX_CID: u32 = 0xFFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FontKind {
    Simple,
    Composite,
    Type3,
}

/// One glyph decoded from a shown string
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedGlyph {
    /// Byte range of the code within the shown string
    pub bytes: Range<usize>,
    /// Unicode text of the glyph (may be several chars for ligatures)
    pub text: String,
    /// Horizontal displacement in 1/1000 text space units
    pub width: f64,
    /// Single-byte code 32, the only code word spacing applies to
    pub is_word_space: bool,
}

/// A font resource as seen by the content interpreter
#[derive(Debug, Clone)]
pub struct PdfFont {
    /// Base font name with any subset tag removed
    pub name: String,
    kind: FontKind,
    widths: HashMap<u32, f64>,
    default_width: f64,
    widths_known: bool,
    encoding: BaseEncoding,
    differences: HashMap<u8, char>,
    to_unicode: Option<ToUnicodeMap>,
    standard: Option<Standard14>,
    /// Ascent in 1/1000 em
    pub ascent: f64,
    /// Descent in 1/1000 em (negative)
    pub descent: f64,
    pub flags: StyleFlags,
}

/// Remove the `ABCDEF+` subset prefix from a base font name
pub fn strip_subset_tag(name: &str) -> &str {
    match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.chars().all(|c| c.is_ascii_uppercase()) => {
            rest
        }
        _ => name,
    }
}

impl PdfFont {
    /// Stand-in for a font resource that is missing from the page
    pub fn fallback() -> Self {
        Self::standard(Standard14::Helvetica)
    }

    /// A standard 14 font addressed by name only
    pub fn standard(font: Standard14) -> Self {
        let (ascent, descent) = font.ascent_descent();
        let mut flags = StyleFlags::default();
        set_style_from_standard(&mut flags, font);
        PdfFont {
            name: font.base_font().to_string(),
            kind: FontKind::Simple,
            widths: HashMap::new(),
            default_width: UNKNOWN_WIDTH,
            widths_known: true,
            encoding: if font.is_symbolic() {
                BaseEncoding::Symbolic
            } else {
                BaseEncoding::WinAnsi
            },
            differences: HashMap::new(),
            to_unicode: None,
            standard: Some(font),
            ascent,
            descent,
            flags,
        }
    }

    /// Read a font dictionary
    pub fn load(doc: &Document, dict: &Dictionary) -> Self {
        let subtype = get_name(doc, dict, b"Subtype").unwrap_or(&b"Type1"[..]);
        let raw_name = get_name(doc, dict, b"BaseFont")
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .unwrap_or_else(|| "Unnamed".to_string());
        let name = strip_subset_tag(&raw_name).to_string();
        let standard = Standard14::from_name(&name);

        let to_unicode = get(doc, dict, b"ToUnicode")
            .and_then(stream_bytes)
            .map(|bytes| ToUnicodeMap::parse(&bytes))
            .filter(|cmap| !cmap.is_empty());

        let kind = match subtype {
            b"Type0" => FontKind::Composite,
            b"Type3" => FontKind::Type3,
            _ => FontKind::Simple,
        };

        let mut font = PdfFont {
            name,
            kind,
            widths: HashMap::new(),
            default_width: 0.0,
            widths_known: true,
            encoding: BaseEncoding::Standard,
            differences: HashMap::new(),
            to_unicode,
            standard,
            ascent: DEFAULT_ASCENT,
            descent: DEFAULT_DESCENT,
            flags: StyleFlags::default(),
        };

        let descriptor = match kind {
            FontKind::Composite => {
                let descendant = get_array(doc, dict, b"DescendantFonts")
                    .and_then(|a| a.first())
                    .and_then(|o| resolve(doc, o).as_dict().ok());
                if let Some(cid_font) = descendant {
                    font.load_cid_widths(doc, cid_font);
                    get_dict(doc, cid_font, b"FontDescriptor")
                } else {
                    font.default_width = 1000.0;
                    None
                }
            }
            FontKind::Simple | FontKind::Type3 => {
                font.load_simple_widths(doc, dict);
                font.load_encoding(doc, dict);
                get_dict(doc, dict, b"FontDescriptor")
            }
        };

        font.load_metrics(doc, descriptor);
        font
    }

    fn load_simple_widths(&mut self, doc: &Document, dict: &Dictionary) {
        // Type3 widths are in glyph space, scaled by the font matrix
        let scale = if self.kind == FontKind::Type3 {
            get_array(doc, dict, b"FontMatrix")
                .and_then(|m| m.first())
                .and_then(number)
                .map(|a| a * 1000.0)
                .unwrap_or(1.0)
        } else {
            1.0
        };

        let first_char = get_number(doc, dict, b"FirstChar").unwrap_or(0.0) as u32;
        let missing = get_dict(doc, dict, b"FontDescriptor")
            .and_then(|fd| get_number(doc, fd, b"MissingWidth"))
            .unwrap_or(0.0);

        match get_array(doc, dict, b"Widths") {
            Some(widths) => {
                for (i, w) in widths.iter().enumerate() {
                    if let Some(w) = number(resolve(doc, w)) {
                        self.widths.insert(first_char + i as u32, w * scale);
                    }
                }
                self.default_width = missing * scale;
            }
            None if self.standard.is_some() => {
                self.default_width = missing;
            }
            None => {
                self.widths_known = false;
                self.default_width = UNKNOWN_WIDTH;
            }
        }
    }

    fn load_cid_widths(&mut self, doc: &Document, cid_font: &Dictionary) {
        self.default_width = get_number(doc, cid_font, b"DW").unwrap_or(1000.0);
        let Some(w) = get_array(doc, cid_font, b"W") else {
            return;
        };

        let mut i = 0;
        while i < w.len() {
            let Some(first) = number(resolve(doc, &w[i])) else {
                break;
            };
            match w.get(i + 1).map(|o| resolve(doc, o)) {
                Some(Object::Array(list)) => {
                    for (offset, width) in list.iter().enumerate() {
                        let cid = u32::try_from(offset)
                            .ok()
                            .and_then(|o| o.checked_add(first as u32))
                            .filter(|cid| *cid <= MAX_CID);
                        let Some(cid) = cid else {
                            break;
                        };
                        if let Some(width) = number(resolve(doc, width)) {
                            self.widths.insert(cid, width);
                        }
                    }
                    i += 2;
                }
                Some(last) => {
                    let (Some(last), Some(width)) =
                        (number(last), w.get(i + 2).and_then(|o| number(resolve(doc, o))))
                    else {
                        break;
                    };
                    // Ranges past the two-byte CID space are malformed
                    for cid in first as u32..=(last as u32).min(MAX_CID) {
                        self.widths.insert(cid, width);
                    }
                    i += 3;
                }
                None => break,
            }
        }
    }

    fn load_encoding(&mut self, doc: &Document, dict: &Dictionary) {
        self.encoding = match self.standard {
            Some(std) if std.is_symbolic() => BaseEncoding::Symbolic,
            _ => BaseEncoding::Standard,
        };

        match get(doc, dict, b"Encoding") {
            Some(Object::Name(name)) => {
                if let Some(encoding) = BaseEncoding::from_name(name) {
                    self.encoding = encoding;
                }
            }
            Some(Object::Dictionary(enc)) => {
                if let Some(encoding) =
                    get_name(doc, enc, b"BaseEncoding").and_then(BaseEncoding::from_name)
                {
                    self.encoding = encoding;
                }
                if let Some(diffs) = get_array(doc, enc, b"Differences") {
                    let mut code = 0u32;
                    for item in diffs {
                        match resolve(doc, item) {
                            Object::Integer(n) => code = *n as u32,
                            Object::Name(glyph) => {
                                let glyph = String::from_utf8_lossy(glyph);
                                if let (Ok(byte), Some(c)) =
                                    (u8::try_from(code), glyph_name_to_char(&glyph))
                                {
                                    self.differences.insert(byte, c);
                                }
                                code += 1;
                            }
                            _ => {}
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn load_metrics(&mut self, doc: &Document, descriptor: Option<&Dictionary>) {
        if let Some(std) = self.standard {
            (self.ascent, self.descent) = std.ascent_descent();
            set_style_from_standard(&mut self.flags, std);
        }

        if let Some(fd) = descriptor {
            let ascent = get_number(doc, fd, b"Ascent").unwrap_or(0.0);
            let descent = get_number(doc, fd, b"Descent").unwrap_or(0.0);
            if ascent > 0.0 && ascent > descent {
                self.ascent = ascent;
                self.descent = descent.min(0.0);
            }

            let flags = get_number(doc, fd, b"Flags").unwrap_or(0.0) as u32;
            if flags & 1 != 0 {
                self.flags.insert(StyleFlags::MONOSPACE);
            }
            if flags & 2 != 0 {
                self.flags.insert(StyleFlags::SERIF);
            }
            if flags & 64 != 0 {
                self.flags.insert(StyleFlags::ITALIC);
            }
            if flags & (1 << 18) != 0 {
                self.flags.insert(StyleFlags::BOLD);
            }
        }

        let lower = self.name.to_ascii_lowercase();
        if lower.contains("bold") || lower.contains("black") || lower.contains("heavy") {
            self.flags.insert(StyleFlags::BOLD);
        }
        if lower.contains("italic") || lower.contains("oblique") {
            self.flags.insert(StyleFlags::ITALIC);
        }
    }

    /// False when glyph widths had to be guessed
    pub fn has_widths(&self) -> bool {
        self.widths_known
    }

    pub fn is_composite(&self) -> bool {
        self.kind == FontKind::Composite
    }

    fn width_of(&self, code: u32) -> f64 {
        if let Some(w) = self.widths.get(&code) {
            return *w;
        }
        match (self.kind, self.standard) {
            (FontKind::Simple, Some(std)) if self.widths.is_empty() => {
                u8::try_from(code).map(|c| std.code_width(c) as f64).unwrap_or(0.0)
            }
            _ => self.default_width,
        }
    }

    fn text_of(&self, len: usize, code: u32) -> String {
        if let Some(text) = self.to_unicode.as_ref().and_then(|m| m.lookup(len, code)) {
            return text.to_string();
        }
        if self.kind == FontKind::Composite {
            return '\u{FFFD}'.to_string();
        }
        let Ok(byte) = u8::try_from(code) else {
            return '\u{FFFD}'.to_string();
        };
        if let Some(c) = self.differences.get(&byte) {
            return c.to_string();
        }
        if self.standard == Some(Standard14::ZapfDingbats) {
            if let Some(c) = dingbat_decode(byte) {
                return c.to_string();
            }
        }
        self.encoding
            .decode(byte)
            .unwrap_or('\u{FFFD}')
            .to_string()
    }

    /// Split a shown string into glyphs
    pub fn decode(&self, bytes: &[u8]) -> Vec<DecodedGlyph> {
        let mut glyphs = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            let len = match self.kind {
                FontKind::Composite => self
                    .to_unicode
                    .as_ref()
                    .and_then(|m| m.code_length(&bytes[i..]))
                    .unwrap_or(2)
                    .min(bytes.len() - i),
                _ => 1,
            };
            let code = bytes[i..i + len]
                .iter()
                .fold(0u32, |acc, &b| (acc << 8) | b as u32);

            glyphs.push(DecodedGlyph {
                bytes: i..i + len,
                text: self.text_of(len, code),
                width: self.width_of(code),
                is_word_space: len == 1 && code == 32,
            });
            i += len;
        }
        glyphs
    }
}

fn set_style_from_standard(flags: &mut StyleFlags, font: Standard14) {
    if font.is_bold() {
        flags.insert(StyleFlags::BOLD);
    }
    if font.is_italic() {
        flags.insert(StyleFlags::ITALIC);
    }
    if font.is_serif() {
        flags.insert(StyleFlags::SERIF);
    }
    if font.is_monospace() {
        flags.insert(StyleFlags::MONOSPACE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::Stream;
    use pretty_assertions::assert_eq;

    fn texts(font: &PdfFont, bytes: &[u8]) -> Vec<String> {
        font.decode(bytes).into_iter().map(|g| g.text).collect()
    }

    #[test]
    fn test_strip_subset_tag() {
        assert_eq!(strip_subset_tag("ABCDEF+Arial-BoldMT"), "Arial-BoldMT");
        assert_eq!(strip_subset_tag("Arial+Extra"), "Arial+Extra");
        assert_eq!(strip_subset_tag("Helvetica"), "Helvetica");
    }

    #[test]
    fn test_standard_font_without_widths() {
        let doc = Document::with_version("1.5");
        let dict = Dictionary::from_iter(vec![
            ("Type", Object::from("Font")),
            ("Subtype", "Type1".into()),
            ("BaseFont", "Helvetica".into()),
            ("Encoding", "WinAnsiEncoding".into()),
        ]);
        let font = PdfFont::load(&doc, &dict);
        let glyphs = font.decode(b"A _");
        assert_eq!(glyphs.len(), 3);
        assert_eq!(glyphs[0].text, "A");
        assert_eq!(glyphs[0].width, 667.0);
        assert!(glyphs[1].is_word_space);
        assert_eq!(glyphs[2].width, 556.0);
        assert!(font.has_widths());
        assert_eq!(font.ascent, 718.0);
    }

    #[test]
    fn test_simple_font_widths_and_differences() {
        let doc = Document::with_version("1.5");
        let encoding = Dictionary::from_iter(vec![
            ("BaseEncoding", Object::from("WinAnsiEncoding")),
            (
                "Differences",
                vec![Object::Integer(65), "uni2610".into(), "checkbox".into()].into(),
            ),
        ]);
        let dict = Dictionary::from_iter(vec![
            ("Subtype", Object::from("TrueType")),
            ("BaseFont", "QWERTY+SomeFont-Bold".into()),
            ("FirstChar", 65.into()),
            ("Widths", vec![Object::Integer(700), Object::Integer(710)].into()),
            ("Encoding", encoding.into()),
        ]);
        let font = PdfFont::load(&doc, &dict);
        assert_eq!(font.name, "SomeFont-Bold");
        assert!(font.flags.is_bold());
        assert_eq!(texts(&font, b"ABC"), vec!["☐", "☐", "C"]);
        let glyphs = font.decode(b"AC");
        assert_eq!(glyphs[0].width, 700.0);
        assert_eq!(glyphs[1].width, 0.0);
    }

    #[test]
    fn test_unknown_widths_are_flagged() {
        let doc = Document::with_version("1.5");
        let dict = Dictionary::from_iter(vec![
            ("Subtype", Object::from("Type1")),
            ("BaseFont", "MysteryFont".into()),
        ]);
        let font = PdfFont::load(&doc, &dict);
        assert!(!font.has_widths());
        assert_eq!(font.decode(b"x")[0].width, UNKNOWN_WIDTH);
    }

    #[test]
    fn test_composite_font_with_tounicode() {
        let mut doc = Document::with_version("1.5");
        let cmap = crate::cmap::build_tounicode_cmap(2, &[(0x0024, 'A'), (0x0003, ' ')]);
        let cmap_id = doc.add_object(Stream::new(Dictionary::new(), cmap.into_bytes()));
        let cid_font = Dictionary::from_iter(vec![
            ("Subtype", Object::from("CIDFontType2")),
            ("DW", 1000.into()),
            (
                "W",
                vec![
                    Object::Integer(3),
                    vec![Object::Integer(250)].into(),
                    Object::Integer(36),
                    Object::Integer(40),
                    Object::Integer(600),
                ]
                .into(),
            ),
        ]);
        let cid_id = doc.add_object(cid_font);
        let dict = Dictionary::from_iter(vec![
            ("Subtype", Object::from("Type0")),
            ("BaseFont", "Embedded".into()),
            ("DescendantFonts", vec![Object::Reference(cid_id)].into()),
            ("ToUnicode", Object::Reference(cmap_id)),
        ]);
        let font = PdfFont::load(&doc, &dict);
        assert!(font.is_composite());

        let glyphs = font.decode(&[0x00, 0x24, 0x00, 0x03, 0x00, 0x50]);
        assert_eq!(glyphs.len(), 3);
        assert_eq!(glyphs[0].text, "A");
        assert_eq!(glyphs[0].width, 600.0);
        assert_eq!(glyphs[1].width, 250.0);
        // Word spacing never applies to two-byte codes
        assert!(!glyphs[1].is_word_space);
        assert_eq!(glyphs[2].text, "\u{FFFD}");
        assert_eq!(glyphs[2].width, 1000.0);
    }

    #[test]
    fn test_malformed_cid_widths_are_bounded() {
        let mut doc = Document::with_version("1.5");
        let cid_font = Dictionary::from_iter(vec![
            ("Subtype", Object::from("CIDFontType2")),
            (
                "W",
                vec![
                    Object::Integer(4_294_967_295),
                    vec![Object::Integer(500), Object::Integer(500)].into(),
                    Object::Integer(0),
                    Object::Integer(4_000_000_000),
                    Object::Integer(300),
                ]
                .into(),
            ),
        ]);
        let cid_id = doc.add_object(cid_font);
        let dict = Dictionary::from_iter(vec![
            ("Subtype", Object::from("Type0")),
            ("BaseFont", "Broken".into()),
            ("DescendantFonts", vec![Object::Reference(cid_id)].into()),
        ]);

        let font = PdfFont::load(&doc, &dict);
        let glyphs = font.decode(&[0x00, 0x07, 0xFF, 0xFF]);
        assert_eq!(glyphs[0].width, 300.0);
        assert_eq!(glyphs[1].width, 300.0);
    }
}
