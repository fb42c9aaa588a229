//! Text rendering utilities

use crate::style::Color;

/// Context for rendering a run of glyphs
pub struct TextRenderContext {
    /// PDF font resource name (e.g., "FF1")
    pub font_name: String,
    /// Font size in points
    pub font_size: f64,
    /// Text color (RGB)
    pub color: Color,
}

/// A glyph code placed at a baseline origin in PDF user space
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedGlyph {
    pub code: Vec<u8>,
    pub x: f64,
    pub y: f64,
}

/// Format a number the way content streams usually carry them
pub fn format_number(value: f64) -> String {
    let text = format!("{value:.3}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "" | "-0" => "0".to_string(),
        _ => text.to_string(),
    }
}

fn hex_string(code: &[u8]) -> String {
    let hex: String = code.iter().map(|b| format!("{b:02X}")).collect();
    format!("<{hex}>")
}

/// Generate PDF operators for a glyph run
///
/// Creates one `BT`..`ET` block that sets colour and font once and then
/// places every glyph with its own text matrix, so each glyph lands exactly
/// at its computed origin.
pub fn generate_glyph_run_operators(glyphs: &[EncodedGlyph], ctx: &TextRenderContext) -> Vec<u8> {
    let mut ops = String::new();

    ops.push_str("BT\n");
    ops.push_str(&format!(
        "{} {} {} rg\n",
        format_number(ctx.color.r as f64),
        format_number(ctx.color.g as f64),
        format_number(ctx.color.b as f64)
    ));
    ops.push_str(&format!(
        "/{} {} Tf\n",
        ctx.font_name,
        format_number(ctx.font_size)
    ));

    for glyph in glyphs {
        ops.push_str(&format!(
            "1 0 0 1 {} {} Tm\n",
            format_number(glyph.x),
            format_number(glyph.y)
        ));
        ops.push_str(&format!("{} Tj\n", hex_string(&glyph.code)));
    }

    ops.push_str("ET\n");
    ops.into_bytes()
}
