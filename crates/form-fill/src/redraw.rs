//! Redaction and re-drawing of one occurrence

use crate::config::{BaselineOptions, ReplaceOptions};
use crate::cursor::Cursor;
use crate::fonts::FontResolver;
use crate::glyph::{extract_glyphs, read_page, Glyph};
use crate::locate::Occurrence;
use crate::sanitize::sanitize_for_pdf;
use crate::Result;
use pdf_core::{dingbat_for, Color, FontHandle, PdfDocument, PlacedChar, Point, Standard14, StyleFlags};

/// Box and check mark symbols whose vertical metrics differ from text
const CHECKBOX_CHARS: [char; 7] = ['□', '■', '☐', '☑', '☒', '⬜', '⬛'];

pub fn is_checkbox_char(c: char) -> bool {
    CHECKBOX_CHARS.contains(&c)
}

/// Estimate the baseline the glyphs were drawn on
///
/// Glyph boxes usually include the descent, so the lowest bottom sits below
/// the real baseline. It is moved up by part of the excess height, more
/// gently when checkbox glyphs share the run. Checkbox glyphs are ignored
/// unless the run has nothing else.
pub fn estimate_baseline(glyphs: &[&Glyph], options: &BaselineOptions) -> Option<f64> {
    let text: Vec<&Glyph> = glyphs
        .iter()
        .copied()
        .filter(|g| !is_checkbox_char(g.c))
        .collect();
    let mixed = !text.is_empty() && text.len() < glyphs.len();
    let selected: &[&Glyph] = if text.is_empty() { glyphs } else { &text };

    let size = selected.first()?.size;
    let bottom = selected
        .iter()
        .map(|g| g.bbox.y1)
        .fold(f64::NEG_INFINITY, f64::max);
    let top = selected
        .iter()
        .map(|g| g.bbox.y0)
        .fold(f64::INFINITY, f64::min);
    let excess = (bottom - top - size).max(0.0);

    let shift = if mixed {
        (excess * options.mixed_factor).min(size * options.mixed_cap)
    } else {
        (excess * options.text_factor).min(size * options.text_cap)
    };
    let estimated = bottom - shift;

    if options.use_glyph_origins {
        let origins: Option<Vec<f64>> = selected.iter().map(|g| g.origin.map(|o| o.y)).collect();
        if let Some(origins) = origins {
            let exact = origins.into_iter().fold(f64::NEG_INFINITY, f64::max);
            tracing::debug!(estimated, exact, "baseline from glyph origins");
            return Some(exact);
        }
    }
    Some(estimated)
}

/// Font, size and colour of the most frequent font among glyphs
#[derive(Debug, Clone, PartialEq)]
pub struct DominantStyle {
    pub font: String,
    pub size: f64,
    pub color: Color,
    pub flags: StyleFlags,
}

/// Most frequent font name; ties go to the font seen first
pub fn dominant_style(glyphs: &[&Glyph]) -> Option<DominantStyle> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for glyph in glyphs {
        match counts.iter_mut().find(|(font, _)| *font == glyph.font) {
            Some((_, count)) => *count += 1,
            None => counts.push((glyph.font.as_str(), 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (font, count) in counts {
        if best.map_or(true, |(_, n)| count > n) {
            best = Some((font, count));
        }
    }
    let (font, _) = best?;

    let representative = glyphs.iter().find(|g| g.font == font)?;
    Some(DominantStyle {
        font: font.to_string(),
        size: representative.size,
        color: representative.color,
        flags: representative.flags,
    })
}

/// Pick the font that draws `c`, substituting `?` when nothing can
fn font_for(resolved: &FontHandle, c: char) -> (FontHandle, char) {
    if resolved.can_encode(c) {
        return (resolved.clone(), c);
    }
    if dingbat_for(c).is_some() {
        return (FontHandle::Standard(Standard14::ZapfDingbats), c);
    }

    tracing::warn!(character = %c, font = resolved.name(), "no glyph for character, drawing '?'");
    if resolved.can_encode('?') {
        (resolved.clone(), '?')
    } else {
        (FontHandle::Standard(Standard14::Helvetica), '?')
    }
}

/// Characters drawn with one font
#[derive(Debug, Clone)]
struct GlyphRun {
    font: FontHandle,
    glyphs: Vec<PlacedChar>,
}

impl GlyphRun {
    fn text(&self) -> String {
        self.glyphs.iter().map(|g| g.c).collect()
    }
}

/// Lay `text` out from `x` along `baseline`, split where the font changes
fn layout_runs(font: &FontHandle, text: &str, x: f64, baseline: f64, size: f64) -> Vec<GlyphRun> {
    let mut runs: Vec<GlyphRun> = Vec::new();
    let mut pen = x;
    for c in text.chars() {
        let (glyph_font, c) = font_for(font, c);
        let placed = PlacedChar {
            c,
            origin: Point::new(pen, baseline),
        };
        pen += glyph_font.char_width(c, size);
        match runs.last_mut() {
            Some(run) if run.font.key() == glyph_font.key() => run.glyphs.push(placed),
            _ => runs.push(GlyphRun {
                font: glyph_font,
                glyphs: vec![placed],
            }),
        }
    }
    runs
}

/// Redact the occurrence, then draw `runs`
///
/// Every font is registered on the page first, so a font that cannot be
/// embedded fails the call with the placeholder still in place.
fn paint(
    doc: &mut PdfDocument,
    occurrence: &Occurrence,
    runs: &[GlyphRun],
    style: &DominantStyle,
    fill: Option<Color>,
) -> Result<()> {
    for run in runs {
        doc.register_font(occurrence.page, &run.font, &run.text())?;
    }
    doc.apply_redaction(occurrence.page, &occurrence.rect, fill)?;
    for run in runs {
        doc.draw_glyph_run(occurrence.page, &run.font, style.size, style.color, &run.glyphs)?;
    }
    Ok(())
}

/// Blank an occurrence and draw `replacement` in its place
///
/// Returns the cursor after the occurrence, or `None` when no glyph of the
/// page intersects it (nothing is changed then).
pub fn replace_occurrence(
    doc: &mut PdfDocument,
    occurrence: &Occurrence,
    replacement: &str,
    fonts: &mut FontResolver,
    options: &ReplaceOptions,
) -> Result<Option<Cursor>> {
    let page = read_page(doc, occurrence.page, &options.text_page_options())?;
    let glyphs = extract_glyphs(&page);
    let targets: Vec<&Glyph> = glyphs
        .iter()
        .filter(|g| g.bbox.intersects(&occurrence.rect))
        .collect();

    let (Some(baseline), Some(style)) = (
        estimate_baseline(&targets, &options.baseline),
        dominant_style(&targets),
    ) else {
        tracing::debug!(page = occurrence.page, rect = ?occurrence.rect, "no glyphs intersect occurrence");
        return Ok(None);
    };

    let font = fonts.resolve(doc, &style.font);
    let text = sanitize_for_pdf(replacement);
    let runs = layout_runs(&font, &text, occurrence.rect.x0, baseline, style.size);
    paint(doc, occurrence, &runs, &style, options.fill_color())?;

    tracing::debug!(
        page = occurrence.page,
        font = font.name(),
        size = style.size,
        baseline,
        runs = runs.len(),
        "replacement drawn"
    );
    Ok(Some(occurrence.end_cursor()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::find_occurrence;
    use crate::test_support::{lines_content, single_page};
    use crate::ReplaceError;
    use pdf_core::{FontData, Rect};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn glyph(c: char, font: &str, bbox: Rect) -> Glyph {
        Glyph {
            c,
            bbox,
            origin: None,
            font: font.to_string(),
            size: 10.0,
            color: Color::black(),
            flags: StyleFlags::default(),
        }
    }

    #[test]
    fn test_baseline_pure_text_shift_is_capped() {
        // 14 units tall at size 10: excess 4, shift min(7.2, 2.0)
        let a = glyph('a', "F", Rect::new(0.0, 86.0, 5.0, 100.0));
        let b = glyph('b', "F", Rect::new(5.0, 88.0, 10.0, 99.0));
        let baseline = estimate_baseline(&[&a, &b], &BaselineOptions::default()).unwrap();
        assert!((baseline - 98.0).abs() < 1e-9);
    }

    #[test]
    fn test_baseline_small_excess() {
        // 10.5 units tall at size 10: excess 0.5, shift 0.9
        let a = glyph('a', "F", Rect::new(0.0, 89.5, 5.0, 100.0));
        let baseline = estimate_baseline(&[&a], &BaselineOptions::default()).unwrap();
        assert!((baseline - 99.1).abs() < 1e-9);
    }

    #[test]
    fn test_baseline_ignores_checkbox_metrics() {
        let text = glyph('Y', "F", Rect::new(10.0, 88.0, 15.0, 100.0));
        let boxed = glyph('☐', "Z", Rect::new(0.0, 80.0, 10.0, 104.0));
        // Text only: excess 2, mixed shift min(1.0, 1.0)
        let baseline = estimate_baseline(&[&boxed, &text], &BaselineOptions::default()).unwrap();
        assert!((baseline - 99.0).abs() < 1e-9);

        // Checkbox only: falls back to all glyphs with the text shift
        let baseline = estimate_baseline(&[&boxed], &BaselineOptions::default()).unwrap();
        assert!((baseline - 102.0).abs() < 1e-9);
    }

    #[test]
    fn test_baseline_prefers_origins() {
        let mut a = glyph('a', "F", Rect::new(0.0, 86.0, 5.0, 100.0));
        a.origin = Some(Point::new(0.0, 97.5));
        let baseline = estimate_baseline(&[&a], &BaselineOptions::default()).unwrap();
        assert_eq!(baseline, 97.5);

        let options = BaselineOptions {
            use_glyph_origins: false,
            ..BaselineOptions::default()
        };
        let baseline = estimate_baseline(&[&a], &options).unwrap();
        assert!((baseline - 98.0).abs() < 1e-9);
    }

    #[test]
    fn test_baseline_empty() {
        assert_eq!(estimate_baseline(&[], &BaselineOptions::default()), None);
    }

    #[test]
    fn test_dominant_style() {
        let r = Rect::new(0.0, 0.0, 1.0, 1.0);
        let mut bold = glyph('x', "Arial-Bold", r);
        bold.size = 14.0;
        let regular = glyph('y', "Arial", r);
        let glyphs = [&regular, &bold, &bold, &regular, &bold];

        let style = dominant_style(&glyphs).unwrap();
        assert_eq!(style.font, "Arial-Bold");
        assert_eq!(style.size, 14.0);
        assert_eq!(dominant_style(&[]), None);

        let tie = dominant_style(&[&regular, &bold]).unwrap();
        assert_eq!(tie.font, "Arial");
    }

    #[test]
    fn test_font_for_falls_back() {
        let helvetica = FontHandle::Standard(Standard14::Helvetica);
        assert_eq!(font_for(&helvetica, 'A').1, 'A');

        let (font, c) = font_for(&helvetica, '☑');
        assert_eq!(c, '☑');
        assert_eq!(font.name(), "ZapfDingbats");

        let (font, c) = font_for(&helvetica, 'ก');
        assert_eq!(c, '?');
        assert_eq!(font.name(), "Helvetica");
    }

    #[test]
    fn test_replace_keeps_baseline_and_style() {
        let mut doc = single_page("BT /F2 11 Tf 0.2 0.4 0.6 rg 90 600 Td (Id: ######) Tj ET");
        let options = ReplaceOptions::default();
        let mut fonts = FontResolver::offline();

        let occurrence = find_occurrence(&doc, "######", None, &options)
            .unwrap()
            .unwrap();
        let cursor = replace_occurrence(&mut doc, &occurrence, "42", &mut fonts, &options)
            .unwrap()
            .unwrap();
        assert_eq!(cursor, occurrence.end_cursor());

        let page = doc.text_page(0, &options.text_page_options()).unwrap();
        assert_eq!(page.text(), "Id: 42");

        let glyphs = extract_glyphs(&page);
        let four = glyphs.iter().find(|g| g.c == '4').unwrap();
        assert_eq!(four.font, "Times-Roman");
        assert_eq!(four.size, 11.0);
        assert_eq!(four.color, Color::rgb(0.2, 0.4, 0.6));
        assert!((four.origin.unwrap().y - 192.0).abs() < 1e-6);
        assert!((four.bbox.x0 - occurrence.rect.x0).abs() < 1e-6);
    }

    #[test]
    fn test_no_intersecting_glyphs_is_noop() {
        let mut doc = single_page(&lines_content(&[(700.0, "Name: ____")]));
        let options = ReplaceOptions::default();
        let mut fonts = FontResolver::offline();
        let nowhere = Occurrence {
            page: 0,
            rects: vec![Rect::new(300.0, 300.0, 320.0, 310.0)],
            rect: Rect::new(300.0, 300.0, 320.0, 310.0),
            bottom: 310.0,
        };

        let result = replace_occurrence(&mut doc, &nowhere, "x", &mut fonts, &options).unwrap();
        assert_eq!(result, None);
        let page = doc.text_page(0, &options.text_page_options()).unwrap();
        assert_eq!(page.text(), "Name: ____");
    }

    #[test]
    fn test_runs_split_on_font_change() {
        let helvetica = FontHandle::Standard(Standard14::Helvetica);
        let runs = layout_runs(&helvetica, "ok \u{2611} done", 72.0, 100.0, 10.0);

        let texts: Vec<String> = runs.iter().map(GlyphRun::text).collect();
        assert_eq!(texts, vec!["ok ", "\u{2611}", " done"]);
        assert_eq!(runs[1].font.name(), "ZapfDingbats");
        assert_eq!(runs[0].glyphs[0].origin, Point::new(72.0, 100.0));
        let after_check = runs[1].glyphs[0].origin.x + runs[1].font.char_width('\u{2611}', 10.0);
        assert!((runs[2].glyphs[0].origin.x - after_check).abs() < 1e-9);
    }

    #[test]
    fn test_unembeddable_font_leaves_placeholder() {
        let mut doc = single_page(&lines_content(&[(700.0, "Name: ____")]));
        let options = ReplaceOptions::default();
        let occurrence = find_occurrence(&doc, "____", None, &options)
            .unwrap()
            .unwrap();
        let broken = FontHandle::Embedded(Arc::new(FontData {
            name: "Broken".to_string(),
            ttf_data: vec![0; 16],
            used_chars: Default::default(),
        }));
        let runs = vec![GlyphRun {
            font: broken,
            glyphs: vec![PlacedChar {
                c: 'A',
                origin: Point::new(occurrence.rect.x0, 92.0),
            }],
        }];
        let style = DominantStyle {
            font: "Helvetica".to_string(),
            size: 12.0,
            color: Color::black(),
            flags: StyleFlags::default(),
        };

        let result = paint(&mut doc, &occurrence, &runs, &style, options.fill_color());
        assert!(matches!(result, Err(ReplaceError::Pdf(_))));
        let page = doc.text_page(0, &options.text_page_options()).unwrap();
        assert_eq!(page.text(), "Name: ____");
    }
}
