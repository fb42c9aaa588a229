//! Form Fill - Layout-preserving text replacement for flat PDF forms
//!
//! This crate provides:
//! - Glyph extraction from a page's structured text
//! - Occurrence lookup that respects a monotonically advancing cursor
//! - Redaction and re-drawing in the original font, size, colour and baseline
//! - Font resolution with a fallback ladder that never fails
//! - A sequential multi-line driver that saves once per edit session
//!
//! # Example
//!
//! ```ignore
//! use form_fill::{replace_lines, ReplaceOptions};
//!
//! let outcome = replace_lines(
//!     "form.pdf",
//!     &["Name: ____", "Date: ____"],
//!     &["Name: Alice", "Date: 2024-01-01"],
//!     None,
//!     None,
//!     &ReplaceOptions::default(),
//! )?;
//! println!("saved {}", outcome.path.display());
//! ```

mod cancel;
mod config;
mod cursor;
mod driver;
mod entries;
pub mod fonts;
mod glyph;
mod locate;
mod redraw;
mod sanitize;

#[cfg(test)]
mod test_support;

pub use cancel::{CancelFlag, CancelRegistry};
pub use config::{BaselineOptions, LayoutOptions, LocateOptions, ReplaceOptions};
pub use cursor::Cursor;
pub use driver::{
    default_output_path, replace_lines, BatchReport, EditSession, LinePairs, ReplaceOutcome,
};
pub use entries::{
    document_lines, fill_flat_pdf_with_entries, toggle_checkbox, CheckboxEntry, Continuation,
    DocumentLine, FillEntry, FillReport,
};
pub use fonts::FontResolver;
pub use glyph::{extract_glyphs, Glyph};
pub use locate::{find_occurrence, find_position, Occurrence};
pub use redraw::{dominant_style, estimate_baseline, is_checkbox_char, replace_occurrence, DominantStyle};
pub use sanitize::sanitize_for_pdf;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while editing a document
#[derive(Debug, Error)]
pub enum ReplaceError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("PDF error: {0}")]
    Pdf(#[from] pdf_core::PdfError),

    #[error("Page {0} unreadable: {1}")]
    PageUnreadable(usize, String),

    #[error("Failed to save {}: {}", .0.display(), .1)]
    Save(PathBuf, String),

    #[error("Edit of {} was cancelled", .0.display())]
    Cancelled(PathBuf),

    #[error("Font provider error: {0}")]
    FontProvider(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for replacement operations
pub type Result<T> = std::result::Result<T, ReplaceError>;
