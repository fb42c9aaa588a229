//! Occurrence lookup respecting the replacement cursor

use crate::config::ReplaceOptions;
use crate::cursor::{admitted, Cursor};
use crate::glyph::read_page;
use crate::{ReplaceError, Result};
use pdf_core::{PdfDocument, Rect, TextPage};

/// A located match of a search string
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    pub page: usize,
    /// Constituent rectangles of the match
    pub rects: Vec<Rect>,
    /// Union of `rects`; the area that gets redacted
    pub rect: Rect,
    /// Lowest edge of the matched glyphs, the reference compared against
    /// cursors
    pub bottom: f64,
}

impl Occurrence {
    fn new(page: usize, rects: Vec<Rect>, rect: Rect) -> Self {
        let bottom = fragments_bottom(&rects).unwrap_or(rect.y1);
        Self {
            page,
            rects,
            bottom,
            rect,
        }
    }

    /// Cursor placed right after this occurrence
    pub fn end_cursor(&self) -> Cursor {
        Cursor::new(self.page, self.bottom, self.rect.x1)
    }
}

pub(crate) fn validate_search(search: &str) -> Result<()> {
    if search.trim().is_empty() {
        return Err(ReplaceError::InvalidInput(
            "search string must not be empty or whitespace".to_string(),
        ));
    }
    Ok(())
}

/// Find the first occurrence of `search` after `after`
///
/// Pages before the cursor's page are not searched. Unreadable pages are
/// logged and skipped. `Ok(None)` means there is no eligible occurrence.
pub fn find_occurrence(
    doc: &PdfDocument,
    search: &str,
    after: Option<&Cursor>,
    options: &ReplaceOptions,
) -> Result<Option<Occurrence>> {
    validate_search(search)?;

    let text_options = options.text_page_options();
    let first_page = after.map_or(0, |c| c.page);

    for page_index in first_page..doc.page_count() {
        let page = match read_page(doc, page_index, &text_options) {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(page = page_index, error = %e, "skipping unreadable page");
                continue;
            }
        };

        let rects = page.search(search);
        if rects.is_empty() {
            continue;
        }

        if rects.len() > 1 {
            if let Some(found) = line_occurrence(&page, search, after, options) {
                return Ok(Some(found));
            }
        }

        if let Some(found) = merged_occurrence(page_index, &rects, after, options) {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// Locate-only query: the cursor right after the next occurrence
pub fn find_position(
    doc: &PdfDocument,
    search: &str,
    after: Option<&Cursor>,
    options: &ReplaceOptions,
) -> Result<Option<Cursor>> {
    Ok(find_occurrence(doc, search, after, options)?.map(|occ| occ.end_cursor()))
}

/// Lowest edge of the matched glyphs, never the line box
fn fragments_bottom(rects: &[Rect]) -> Option<f64> {
    rects.iter().map(|r| r.y1).reduce(f64::max)
}

/// One rectangle covering the match horizontally and its line vertically
///
/// Handles matches the page search splits into several rectangles, such as
/// a phrase interrupted by a checkbox glyph in another font.
fn line_occurrence(
    page: &TextPage,
    search: &str,
    after: Option<&Cursor>,
    options: &ReplaceOptions,
) -> Option<Occurrence> {
    let tolerance = options.locate.same_line_tolerance;
    page.lines.iter().find_map(|line| {
        line.find(search).into_iter().find_map(|range| {
            let rect = line.range_rect(range.clone())?;
            let rects = line.range_fragments(range);
            let bottom = fragments_bottom(&rects)?;
            if !admitted(after, page.page_index, bottom, rect.x0, tolerance) {
                return None;
            }
            Some(Occurrence::new(page.page_index, rects, rect))
        })
    })
}

/// First eligible rectangle unioned with the following ones on its line
fn merged_occurrence(
    page_index: usize,
    rects: &[Rect],
    after: Option<&Cursor>,
    options: &ReplaceOptions,
) -> Option<Occurrence> {
    let band = options.locate.hit_merge_tolerance;
    let tolerance = options.locate.same_line_tolerance;

    let start = rects
        .iter()
        .position(|r| admitted(after, page_index, r.y1, r.x0, tolerance))?;
    let first = rects[start];

    let mut hit = vec![first];
    for follower in &rects[start + 1..] {
        let cy = follower.center().y;
        if first.y0 - band <= cy && cy <= first.y1 + band {
            hit.push(*follower);
        } else {
            break;
        }
    }

    let union = hit.iter().skip(1).fold(first, |acc, r| acc.union(r));
    Some(Occurrence::new(page_index, hit, union))
}
