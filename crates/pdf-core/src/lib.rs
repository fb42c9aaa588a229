//! PDF Core - Low-level PDF inspection and editing
//!
//! This crate provides functionality for:
//! - Opening and saving PDF documents
//! - Extracting positioned text (lines, spans, characters)
//! - Removing glyphs inside a rectangle without moving their neighbours
//! - Drawing glyph runs with standard or embedded TrueType fonts
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{Color, PdfDocument, TextPageOptions};
//!
//! let mut doc = PdfDocument::open("form.pdf")?;
//! let page = doc.text_page(0, &TextPageOptions::default())?;
//! for rect in page.search("____") {
//!     doc.apply_redaction(0, &rect, Some(Color::white()))?;
//! }
//! doc.save("output.pdf")?;
//! ```

mod cmap;
mod document;
mod encoding;
mod font;
mod form;
mod geometry;
mod interpret;
mod objects;
mod pdf_font;
mod redact;
mod standard;
mod stext;
mod style;
mod text;

pub use cmap::{build_tounicode_cmap, ToUnicodeMap};
pub use document::{PdfDocument, PlacedChar};
pub use encoding::{dingbat_for, win_ansi_encode};
pub use font::{FontData, FontHandle, FontObjects};
pub use form::{read_form_fields, FieldKind, FormField, InteractiveFieldsResult};
pub use geometry::{Matrix, Point, Rect};
pub use pdf_font::strip_subset_tag;
pub use standard::Standard14;
pub use stext::{LineChar, TextChar, TextLine, TextPage, TextPageOptions, TextSpan};
pub use style::{Color, StyleFlags};
pub use text::{format_number, generate_glyph_run_operators, EncodedGlyph, TextRenderContext};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to open PDF: {0}")]
    OpenError(String),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Failed to parse font: {0}")]
    FontParseError(String),

    #[error("Invalid page index: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("PDF parsing error: {0}")]
    ParseError(String),

    #[error("Content stream error: {0}")]
    ContentError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;
