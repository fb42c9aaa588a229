//! Fonts used to draw replacement text

use crate::cmap::build_tounicode_cmap;
use crate::encoding::{dingbat_for, win_ansi_encode};
use crate::standard::Standard14;
use crate::{PdfError, Result};
use lopdf::{Dictionary, Object, Stream};
use std::collections::BTreeSet;
use std::sync::Arc;

/// TrueType font program for embedding
#[derive(Debug, Clone)]
pub struct FontData {
    /// Font name/identifier
    pub name: String,
    /// Raw TTF data
    pub ttf_data: Vec<u8>,
    /// Characters drawn with this font so far
    pub used_chars: BTreeSet<char>,
}

/// PDF objects generated for font embedding
pub struct FontObjects {
    /// Type0 font dictionary
    pub type0_font: Dictionary,
    /// CIDFont Type2 dictionary
    pub cid_font: Dictionary,
    /// Font descriptor dictionary
    pub font_descriptor: Dictionary,
    /// Font file stream (TTF data)
    pub font_file_stream: Stream,
    /// ToUnicode CMap stream
    pub tounicode_stream: Stream,
}

impl FontData {
    /// Create font data from TTF bytes
    ///
    /// # Arguments
    /// * `name` - Font identifier
    /// * `ttf_data` - TrueType font file bytes
    pub fn from_ttf(name: &str, ttf_data: &[u8]) -> Result<Self> {
        ttf_parser::Face::parse(ttf_data, 0)
            .map_err(|e| PdfError::FontParseError(format!("{name}: {e}")))?;

        Ok(Self {
            name: name.to_string(),
            ttf_data: ttf_data.to_vec(),
            used_chars: BTreeSet::new(),
        })
    }

    fn face(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.ttf_data, 0).ok()
    }

    pub fn add_chars(&mut self, text: &str) {
        self.used_chars.extend(text.chars());
    }

    /// Get glyph ID for a character
    pub fn glyph_id(&self, c: char) -> Option<u16> {
        self.face()
            .and_then(|face| face.glyph_index(c).map(|id| id.0))
    }

    /// Check if font has a glyph for the given character
    pub fn has_glyph(&self, c: char) -> bool {
        self.glyph_id(c).map(|id| id != 0).unwrap_or(false)
    }

    pub fn glyph_advance(&self, c: char) -> Option<u16> {
        let face = self.face()?;
        let glyph_id = face.glyph_index(c)?;
        face.glyph_hor_advance(glyph_id)
    }

    pub fn units_per_em(&self) -> u16 {
        self.face().map(|face| face.units_per_em()).unwrap_or(1000)
    }

    pub fn ascender(&self) -> i16 {
        self.face().map(|face| face.ascender()).unwrap_or(800)
    }

    pub fn descender(&self) -> i16 {
        self.face().map(|face| face.descender()).unwrap_or(-200)
    }

    /// Scale a value in font units to 1/1000 em
    fn to_thousandths(&self, units: i32) -> i32 {
        units * 1000 / self.units_per_em().max(1) as i32
    }

    /// Calculate text width in points for a given font size
    pub fn text_width_points(&self, text: &str, font_size: f32) -> f32 {
        let width: u32 = text
            .chars()
            .filter_map(|c| self.glyph_advance(c))
            .map(|w| w as u32)
            .sum();
        (width as f32 / self.units_per_em() as f32) * font_size
    }

    /// Generate all PDF objects needed to embed this font
    ///
    /// References between the objects are left as placeholders and are
    /// linked when the objects are added to a document.
    pub fn to_pdf_objects(&self) -> Result<FontObjects> {
        let face = self
            .face()
            .ok_or_else(|| PdfError::FontParseError(self.name.clone()))?;
        let font_name = Object::Name(sanitize_font_name(&self.name).into_bytes());

        let tounicode_content = self.generate_tounicode_cmap();
        let tounicode_stream = Stream::new(Dictionary::new(), tounicode_content.into_bytes());

        let font_file_stream = Stream::new(
            Dictionary::from_iter(vec![("Length1", (self.ttf_data.len() as i64).into())]),
            self.ttf_data.clone(),
        );

        let ascent = self.to_thousandths(self.ascender() as i32);
        let descent = self.to_thousandths(self.descender() as i32);
        let bbox = face.global_bounding_box();
        let font_bbox = vec![
            self.to_thousandths(bbox.x_min as i32).into(),
            self.to_thousandths(bbox.y_min as i32).into(),
            self.to_thousandths(bbox.x_max as i32).into(),
            self.to_thousandths(bbox.y_max as i32).into(),
        ];

        let mut flags = 4; // symbolic
        if face.is_monospaced() {
            flags |= 1;
        }
        if face.is_italic() {
            flags |= 64;
        }

        let font_descriptor = Dictionary::from_iter(vec![
            ("Type", "FontDescriptor".into()),
            ("FontName", font_name.clone()),
            ("Flags", flags.into()),
            ("FontBBox", font_bbox.into()),
            ("ItalicAngle", 0.into()),
            ("Ascent", ascent.into()),
            ("Descent", descent.into()),
            ("CapHeight", ascent.into()),
            ("StemV", 80.into()),
            ("FontFile2", Object::Reference((0, 0))),
        ]);

        let cid_system_info = Dictionary::from_iter(vec![
            ("Registry", Object::string_literal("Adobe")),
            ("Ordering", Object::string_literal("Identity")),
            ("Supplement", 0.into()),
        ]);

        let cid_font = Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", "CIDFontType2".into()),
            ("BaseFont", font_name.clone()),
            ("CIDSystemInfo", cid_system_info.into()),
            ("FontDescriptor", Object::Reference((0, 0))),
            ("CIDToGIDMap", "Identity".into()),
            ("W", self.generate_widths_array().into()),
            ("DW", 1000.into()),
        ]);

        let type0_font = Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", "Type0".into()),
            ("BaseFont", font_name),
            ("Encoding", "Identity-H".into()),
            ("DescendantFonts", vec![Object::Reference((0, 0))].into()),
            ("ToUnicode", Object::Reference((0, 0))),
        ]);

        Ok(FontObjects {
            type0_font,
            cid_font,
            font_descriptor,
            font_file_stream,
            tounicode_stream,
        })
    }

    /// `/W` entries for every used glyph: `[gid [width] ...]`
    pub(crate) fn generate_widths_array(&self) -> Vec<Object> {
        let mut gids: Vec<u16> = self
            .used_chars
            .iter()
            .filter_map(|&c| self.glyph_id(c))
            .collect();
        gids.sort_unstable();
        gids.dedup();

        let Some(face) = self.face() else {
            return Vec::new();
        };
        let mut widths = Vec::with_capacity(gids.len() * 2);
        for gid in gids {
            let advance = face
                .glyph_hor_advance(ttf_parser::GlyphId(gid))
                .unwrap_or(0);
            widths.push((gid as i64).into());
            widths.push(vec![self.to_thousandths(advance as i32).into()].into());
        }
        widths
    }

    pub(crate) fn generate_tounicode_cmap(&self) -> String {
        let entries: Vec<(u32, char)> = self
            .used_chars
            .iter()
            .filter_map(|&c| self.glyph_id(c).map(|gid| (gid as u32, c)))
            .collect();
        build_tounicode_cmap(2, &entries)
    }
}

fn sanitize_font_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_graphic() && !"()<>[]{}/%#".contains(*c))
        .collect()
}

/// A font that can draw replacement text
#[derive(Debug, Clone)]
pub enum FontHandle {
    /// One of the standard 14 fonts, referenced without embedding
    Standard(Standard14),
    /// A TrueType program embedded as a composite font
    Embedded(Arc<FontData>),
}

impl FontHandle {
    /// Key identifying the font within a document
    pub fn key(&self) -> String {
        match self {
            FontHandle::Standard(std) => format!("std:{}", std.base_font()),
            FontHandle::Embedded(data) => format!("ttf:{}", data.name),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FontHandle::Standard(std) => std.base_font(),
            FontHandle::Embedded(data) => &data.name,
        }
    }

    /// Bytes that show `c` in this font, if the font can draw it
    pub fn encode(&self, c: char) -> Option<Vec<u8>> {
        match self {
            FontHandle::Standard(Standard14::ZapfDingbats) => {
                dingbat_for(c).map(|(code, _)| vec![code])
            }
            FontHandle::Standard(Standard14::Symbol) => None,
            FontHandle::Standard(_) => win_ansi_encode(c).map(|code| vec![code]),
            FontHandle::Embedded(data) => data
                .glyph_id(c)
                .filter(|&gid| gid != 0)
                .map(|gid| gid.to_be_bytes().to_vec()),
        }
    }

    pub fn can_encode(&self, c: char) -> bool {
        self.encode(c).is_some()
    }

    /// Advance width of `c` in points
    pub fn char_width(&self, c: char, size: f64) -> f64 {
        let thousandths = match self {
            FontHandle::Standard(Standard14::ZapfDingbats) => {
                dingbat_for(c).map(|(_, w)| w as f64).unwrap_or(0.0)
            }
            FontHandle::Standard(std) => win_ansi_encode(c)
                .map(|code| std.code_width(code) as f64)
                .unwrap_or(0.0),
            FontHandle::Embedded(data) => data
                .glyph_advance(c)
                .map(|w| w as f64 * 1000.0 / data.units_per_em().max(1) as f64)
                .unwrap_or(0.0),
        };
        thousandths / 1000.0 * size
    }

    /// Width of a whole string in points
    pub fn text_width(&self, text: &str, size: f64) -> f64 {
        text.chars().map(|c| self.char_width(c, size)).sum()
    }

    /// Ascent and descent in 1/1000 em
    pub fn ascent_descent(&self) -> (f64, f64) {
        match self {
            FontHandle::Standard(std) => std.ascent_descent(),
            FontHandle::Embedded(data) => {
                let upem = data.units_per_em().max(1) as f64;
                (
                    data.ascender() as f64 * 1000.0 / upem,
                    data.descender() as f64 * 1000.0 / upem,
                )
            }
        }
    }
}
