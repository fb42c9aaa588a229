//! Flat glyph model of a page

use crate::{ReplaceError, Result};
use pdf_core::{Color, PdfDocument, Point, Rect, StyleFlags, TextPage, TextPageOptions, TextSpan};

/// One rendered character
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub c: char,
    pub bbox: Rect,
    /// Baseline origin, when the page reports per-character geometry
    pub origin: Option<Point>,
    pub font: String,
    pub size: f64,
    pub color: Color,
    pub flags: StyleFlags,
}

/// Flatten the spans of a page into glyphs, in span order
///
/// Spans without per-character geometry get their box divided evenly
/// between their characters.
pub fn extract_glyphs(page: &TextPage) -> Vec<Glyph> {
    page.spans().flat_map(span_glyphs).collect()
}

fn span_glyphs(span: &TextSpan) -> Vec<Glyph> {
    let glyph = |c: char, bbox: Rect, origin: Option<Point>| Glyph {
        c,
        bbox,
        origin,
        font: span.font.clone(),
        size: span.size,
        color: span.color,
        flags: span.flags,
    };

    if span.has_char_geometry {
        return span
            .chars
            .iter()
            .map(|ch| glyph(ch.c, ch.bbox, Some(ch.origin)))
            .collect();
    }

    let count = span.text.chars().count().max(1);
    let step = span.bbox.width() / count as f64;
    span.text
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let x0 = span.bbox.x0 + i as f64 * step;
            glyph(c, Rect::new(x0, span.bbox.y0, x0 + step, span.bbox.y1), None)
        })
        .collect()
}

/// Structured text of a page, mapping failures to an unreadable page
pub(crate) fn read_page(
    doc: &PdfDocument,
    page_index: usize,
    options: &TextPageOptions,
) -> Result<TextPage> {
    doc.text_page(page_index, options)
        .map_err(|e| ReplaceError::PageUnreadable(page_index, e.to_string()))
}
