//! Structured text of a page: lines, spans and characters

use crate::geometry::{Point, Rect};
use crate::interpret::ShowOp;
use crate::style::{Color, StyleFlags};
use std::ops::Range;

/// Tuning for line assembly
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextPageOptions {
    /// Spans whose baselines differ by less than this × font size share a line
    pub line_merge_ratio: f64,
    /// A horizontal gap wider than this × font size reads as a space
    pub space_gap_ratio: f64,
}

impl Default for TextPageOptions {
    fn default() -> Self {
        Self {
            line_merge_ratio: 0.5,
            space_gap_ratio: 0.25,
        }
    }
}

/// One character with its box and baseline origin
#[derive(Debug, Clone, PartialEq)]
pub struct TextChar {
    pub c: char,
    pub bbox: Rect,
    pub origin: Point,
}

/// A run of characters shown with one font, size and colour
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub bbox: Rect,
    /// Baseline origin of the first character
    pub origin: Point,
    /// Base font name without subset tag
    pub font: String,
    pub size: f64,
    pub color: Color,
    pub flags: StyleFlags,
    pub chars: Vec<TextChar>,
    /// False when character boxes were spread evenly over the span
    pub has_char_geometry: bool,
}

/// A character of a line; synthetic spaces have no span
#[derive(Debug, Clone, PartialEq)]
pub struct LineChar {
    pub c: char,
    pub bbox: Rect,
    pub span: Option<usize>,
}

/// Spans sharing a baseline, characters ordered left to right
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub bbox: Rect,
    pub baseline: f64,
    pub spans: Vec<TextSpan>,
    pub chars: Vec<LineChar>,
}

/// Structured text of one page
#[derive(Debug, Clone, PartialEq)]
pub struct TextPage {
    pub page_index: usize,
    pub rect: Rect,
    pub lines: Vec<TextLine>,
}

fn span_from_show(show: &ShowOp) -> Option<TextSpan> {
    let mut chars = Vec::new();
    for glyph in &show.glyphs {
        let count = glyph.text.chars().count();
        if count == 0 {
            continue;
        }
        // Ligatures split their box evenly
        let step = glyph.bbox.width() / count as f64;
        for (i, c) in glyph.text.chars().enumerate() {
            let x0 = glyph.bbox.x0 + step * i as f64;
            chars.push(TextChar {
                c,
                bbox: Rect::new(x0, glyph.bbox.y0, x0 + step, glyph.bbox.y1),
                origin: Point::new(glyph.origin.x + step * i as f64, glyph.origin.y),
            });
        }
    }

    let first = chars.first()?;
    let origin = first.origin;
    let bbox = chars
        .iter()
        .skip(1)
        .fold(first.bbox, |acc, ch| acc.union(&ch.bbox));
    let has_char_geometry = show.font.has_widths();

    if !has_char_geometry {
        // Only the run extent is trustworthy; spread characters evenly
        let step = bbox.width() / chars.len() as f64;
        for (i, ch) in chars.iter_mut().enumerate() {
            let x0 = bbox.x0 + step * i as f64;
            ch.bbox = Rect::new(x0, bbox.y0, x0 + step, bbox.y1);
            ch.origin = Point::new(x0, origin.y);
        }
    }

    Some(TextSpan {
        text: chars.iter().map(|ch| ch.c).collect(),
        bbox,
        origin,
        font: show.font.name.clone(),
        size: show.size,
        color: show.color,
        flags: show.font.flags,
        chars,
        has_char_geometry,
    })
}

impl TextLine {
    fn new(span: TextSpan) -> Self {
        Self {
            bbox: span.bbox,
            baseline: span.origin.y,
            spans: vec![span],
            chars: Vec::new(),
        }
    }

    fn size(&self) -> f64 {
        self.spans.iter().map(|s| s.size).fold(0.0, f64::max)
    }

    fn assemble(&mut self, space_gap_ratio: f64) {
        let mut chars: Vec<LineChar> = self
            .spans
            .iter()
            .enumerate()
            .flat_map(|(i, span)| {
                span.chars.iter().map(move |ch| LineChar {
                    c: ch.c,
                    bbox: ch.bbox,
                    span: Some(i),
                })
            })
            .collect();
        chars.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));

        let gap_limit = space_gap_ratio * self.size();
        let mut assembled: Vec<LineChar> = Vec::with_capacity(chars.len());
        for ch in chars {
            if let Some(prev) = assembled.last() {
                let gap = ch.bbox.x0 - prev.bbox.x1;
                if gap > gap_limit && prev.c != ' ' && ch.c != ' ' {
                    let bbox = Rect::new(
                        prev.bbox.x1,
                        prev.bbox.y0.min(ch.bbox.y0),
                        ch.bbox.x0,
                        prev.bbox.y1.max(ch.bbox.y1),
                    );
                    assembled.push(LineChar {
                        c: ' ',
                        bbox,
                        span: None,
                    });
                }
            }
            assembled.push(ch);
        }
        self.chars = assembled;
    }

    /// Text of the line, including synthetic spaces
    pub fn text(&self) -> String {
        self.chars.iter().map(|ch| ch.c).collect()
    }

    /// Non-overlapping character ranges where `needle` occurs
    pub fn find(&self, needle: &str) -> Vec<Range<usize>> {
        let needle: Vec<char> = needle.chars().collect();
        let hay: Vec<char> = self.chars.iter().map(|ch| ch.c).collect();
        let mut hits = Vec::new();
        if needle.is_empty() || needle.len() > hay.len() {
            return hits;
        }
        let mut start = 0;
        while start + needle.len() <= hay.len() {
            if hay[start..start + needle.len()] == needle[..] {
                hits.push(start..start + needle.len());
                start += needle.len();
            } else {
                start += 1;
            }
        }
        hits
    }

    /// Box spanning the characters horizontally and the whole line vertically
    pub fn range_rect(&self, range: Range<usize>) -> Option<Rect> {
        let chars = self.chars.get(range)?;
        let x0 = chars.iter().map(|ch| ch.bbox.x0).fold(f64::INFINITY, f64::min);
        let x1 = chars
            .iter()
            .map(|ch| ch.bbox.x1)
            .fold(f64::NEG_INFINITY, f64::max);
        if chars.is_empty() {
            return None;
        }
        Some(Rect::new(x0, self.bbox.y0, x1, self.bbox.y1))
    }

    /// One rectangle per span fragment covered by the range
    pub fn range_fragments(&self, range: Range<usize>) -> Vec<Rect> {
        let mut rects = Vec::new();
        let mut current: Option<(Option<usize>, Rect)> = None;
        for ch in self.chars.get(range).unwrap_or(&[]) {
            current = match current {
                None => Some((ch.span, ch.bbox)),
                Some((span, rect)) => match (span, ch.span) {
                    (Some(a), Some(b)) if a != b => {
                        rects.push(rect);
                        Some((ch.span, ch.bbox))
                    }
                    (None, next) => Some((next, rect.union(&ch.bbox))),
                    (span, _) => Some((span, rect.union(&ch.bbox))),
                },
            };
        }
        if let Some((_, rect)) = current {
            rects.push(rect);
        }
        rects
    }
}

impl TextPage {
    pub(crate) fn from_shows(
        page_index: usize,
        rect: Rect,
        shows: &[ShowOp],
        options: &TextPageOptions,
    ) -> Self {
        let mut spans: Vec<TextSpan> = shows.iter().filter_map(span_from_show).collect();
        spans.sort_by(|a, b| {
            a.origin
                .y
                .total_cmp(&b.origin.y)
                .then(a.origin.x.total_cmp(&b.origin.x))
        });

        let mut lines: Vec<TextLine> = Vec::new();
        for span in spans {
            let target = lines.iter_mut().find(|line| {
                let tolerance = options.line_merge_ratio * line.size().max(span.size);
                (line.baseline - span.origin.y).abs() <= tolerance
            });
            match target {
                Some(line) => {
                    line.bbox = line.bbox.union(&span.bbox);
                    line.spans.push(span);
                }
                None => lines.push(TextLine::new(span)),
            }
        }

        for line in &mut lines {
            line.assemble(options.space_gap_ratio);
        }
        lines.sort_by(|a, b| {
            a.baseline
                .total_cmp(&b.baseline)
                .then(a.bbox.x0.total_cmp(&b.bbox.x0))
        });

        TextPage {
            page_index,
            rect,
            lines,
        }
    }

    /// Every span of the page in line order
    pub fn spans(&self) -> impl Iterator<Item = &TextSpan> {
        self.lines.iter().flat_map(|line| line.spans.iter())
    }

    /// Page text, one line per row
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(TextLine::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Case-sensitive substring search
    ///
    /// Every hit contributes one rectangle per span fragment it covers, so a
    /// phrase interrupted by a differently styled glyph yields several
    /// rectangles. Results are ordered top to bottom, then left to right.
    pub fn search(&self, needle: &str) -> Vec<Rect> {
        self.lines
            .iter()
            .flat_map(|line| {
                line.find(needle)
                    .into_iter()
                    .flat_map(move |range| line.range_fragments(range))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpret::Interpreter;
    use lopdf::content::Content;
    use lopdf::Document;
    use pretty_assertions::assert_eq;

    fn page_for(content: &str) -> TextPage {
        let doc = Document::with_version("1.5");
        let ops = Content::decode(content.as_bytes()).unwrap().operations;
        let media_box = Rect::new(0.0, 0.0, 612.0, 792.0);
        let shows = Interpreter::new(&doc, None, media_box).run(&ops);
        TextPage::from_shows(0, media_box, &shows, &TextPageOptions::default())
    }

    #[test]
    fn test_lines_group_by_baseline() {
        let page = page_for(
            "BT /F1 12 Tf 72 700 Td (Second) Tj ET \
             BT /F1 12 Tf 72 720 Td (First) Tj ET \
             BT /F1 12 Tf 150 700.5 Td (line) Tj ET",
        );
        assert_eq!(page.lines.len(), 2);
        assert_eq!(page.lines[0].text(), "First");
        assert_eq!(page.lines[1].text(), "Second line");
        assert_eq!(page.lines[1].spans.len(), 2);
        assert_eq!(page.lines[1].chars[6].span, None);
    }

    #[test]
    fn test_chars_sorted_by_x_across_spans() {
        let page = page_for(
            "BT /F1 10 Tf 100 700 Td (world) Tj ET \
             BT /F1 10 Tf 72 700 Td (Hello ) Tj ET",
        );
        assert_eq!(page.text(), "Hello world");
    }

    #[test]
    fn test_search_returns_rect_per_hit() {
        let page = page_for("BT /F1 10 Tf 72 700 Td (Name: ____ Date: ____) Tj ET");
        let hits = page.search("____");
        assert_eq!(hits.len(), 2);
        assert!(hits[0].x1 <= hits[1].x0);
        // Helvetica widths of "Name: " at 10pt
        let name_width = (722.0 + 556.0 + 833.0 + 556.0 + 278.0 + 278.0) / 100.0;
        assert!((hits[0].x0 - (72.0 + name_width)).abs() < 1e-6);
        assert!(page.search("missing").is_empty());
    }

    #[test]
    fn test_search_splits_on_span_fragments() {
        let page = page_for(
            "BT /F1 10 Tf 72 700 Td (I agree ) Tj /F2 10 Tf (X) Tj /F1 10 Tf ( to terms) Tj ET",
        );
        let hits = page.search("agree X to");
        assert_eq!(hits.len(), 3);
        let line = &page.lines[0];
        let range = line.find("agree X to")[0].clone();
        let rect = line.range_rect(range).unwrap();
        assert!((rect.x0 - hits[0].x0).abs() < 1e-9);
        assert!((rect.x1 - hits[2].x1).abs() < 1e-9);
    }

    #[test]
    fn test_find_is_non_overlapping() {
        let page = page_for("BT /F1 10 Tf 72 700 Td (aaaa) Tj ET");
        assert_eq!(page.lines[0].find("aa"), vec![0..2, 2..4]);
        assert!(page.lines[0].find("").is_empty());
    }
}
