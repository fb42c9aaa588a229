//! Replacement cursor

/// Horizontal slack when comparing positions on one line
const X_EPSILON: f64 = 0.01;

/// Position below or right of which the next occurrence must start
///
/// `y` is the bottom reference of the last handled occurrence in page
/// coordinates (top-left origin). `x` is its right edge; an infinite `x`
/// admits nothing more on the same line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub page: usize,
    pub y: f64,
    pub x: f64,
}

impl Cursor {
    pub fn new(page: usize, y: f64, x: f64) -> Self {
        Self { page, y, x }
    }

    /// A cursor admitting only occurrences strictly below `y`
    pub fn below(page: usize, y: f64) -> Self {
        Self {
            page,
            y,
            x: f64::INFINITY,
        }
    }

    /// Whether an occurrence with bottom `y` and left edge `x0` on `page`
    /// lies after this cursor
    pub fn admits(&self, page: usize, y: f64, x0: f64, same_line_tolerance: f64) -> bool {
        if page != self.page {
            return page > self.page;
        }
        if self.x.is_infinite() {
            return y > self.y;
        }

        let dy = y - self.y;
        if dy > same_line_tolerance {
            true
        } else if dy.abs() <= same_line_tolerance {
            x0 >= self.x - X_EPSILON
        } else {
            false
        }
    }
}

/// Whether `cursor` (if any) admits the position
pub(crate) fn admitted(
    cursor: Option<&Cursor>,
    page: usize,
    y: f64,
    x0: f64,
    same_line_tolerance: f64,
) -> bool {
    cursor.map_or(true, |c| c.admits(page, y, x0, same_line_tolerance))
}
