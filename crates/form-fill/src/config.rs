//! Tunable options for locating and re-drawing text

use crate::{ReplaceError, Result};
use pdf_core::{Color, TextPageOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Baseline estimation parameters
///
/// The raw baseline (lowest glyph bottom) is moved up by
/// `min(excess * factor, size * cap)`, where `excess` is how much taller the
/// glyph boxes are than the font size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineOptions {
    /// Shift factor for plain text
    pub text_factor: f64,
    /// Shift cap for plain text, as a fraction of the font size
    pub text_cap: f64,
    /// Shift factor when checkbox glyphs are mixed with text
    pub mixed_factor: f64,
    /// Shift cap when checkbox glyphs are mixed with text
    pub mixed_cap: f64,
    /// Use exact glyph origins when every selected glyph has one
    pub use_glyph_origins: bool,
}

impl Default for BaselineOptions {
    fn default() -> Self {
        Self {
            text_factor: 1.8,
            text_cap: 0.2,
            mixed_factor: 0.5,
            mixed_cap: 0.1,
            use_glyph_origins: true,
        }
    }
}

/// Occurrence lookup parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocateOptions {
    /// Vertical band around a hit's first rectangle absorbing split rectangles
    pub hit_merge_tolerance: f64,
    /// Vertical distance within which two positions count as one line
    pub same_line_tolerance: f64,
}

impl Default for LocateOptions {
    fn default() -> Self {
        Self {
            hit_merge_tolerance: 2.0,
            same_line_tolerance: 2.0,
        }
    }
}

/// Line assembly parameters, as fractions of the font size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    pub line_merge_ratio: f64,
    pub space_gap_ratio: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        let defaults = TextPageOptions::default();
        Self {
            line_merge_ratio: defaults.line_merge_ratio,
            space_gap_ratio: defaults.space_gap_ratio,
        }
    }
}

/// Options for one edit session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplaceOptions {
    pub baseline: BaselineOptions,
    pub locate: LocateOptions,
    pub layout: LayoutOptions,
    /// RGB fill for blanked rectangles; `None` removes glyphs without painting
    pub redaction_fill: Option<[f32; 3]>,
    /// Deflate streams on save
    pub compress: bool,
}

impl Default for ReplaceOptions {
    fn default() -> Self {
        Self {
            baseline: BaselineOptions::default(),
            locate: LocateOptions::default(),
            layout: LayoutOptions::default(),
            redaction_fill: Some([1.0, 1.0, 1.0]),
            compress: true,
        }
    }
}

impl ReplaceOptions {
    /// Parse and validate options from JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Reject negative tolerances and factors, and colours outside [0, 1]
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("baseline.text_factor", self.baseline.text_factor),
            ("baseline.text_cap", self.baseline.text_cap),
            ("baseline.mixed_factor", self.baseline.mixed_factor),
            ("baseline.mixed_cap", self.baseline.mixed_cap),
            ("locate.hit_merge_tolerance", self.locate.hit_merge_tolerance),
            ("locate.same_line_tolerance", self.locate.same_line_tolerance),
            ("layout.line_merge_ratio", self.layout.line_merge_ratio),
            ("layout.space_gap_ratio", self.layout.space_gap_ratio),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ReplaceError::InvalidInput(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        if let Some(fill) = self.redaction_fill {
            if fill.iter().any(|c| !(0.0..=1.0).contains(c)) {
                return Err(ReplaceError::InvalidInput(format!(
                    "redaction_fill components must be within [0, 1], got {fill:?}"
                )));
            }
        }
        Ok(())
    }

    pub fn text_page_options(&self) -> TextPageOptions {
        TextPageOptions {
            line_merge_ratio: self.layout.line_merge_ratio,
            space_gap_ratio: self.layout.space_gap_ratio,
        }
    }

    pub fn fill_color(&self) -> Option<Color> {
        self.redaction_fill.map(|[r, g, b]| Color::rgb(r, g, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let options = ReplaceOptions::default();
        assert_eq!(options.baseline.text_factor, 1.8);
        assert_eq!(options.baseline.mixed_cap, 0.1);
        assert_eq!(options.locate.hit_merge_tolerance, 2.0);
        assert_eq!(options.fill_color(), Some(Color::white()));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options =
            ReplaceOptions::from_json(r#"{"baseline": {"text_factor": 1.2}, "compress": false}"#)
                .unwrap();
        assert_eq!(options.baseline.text_factor, 1.2);
        assert_eq!(options.baseline.text_cap, 0.2);
        assert_eq!(options.layout, LayoutOptions::default());
        assert!(!options.compress);
    }

    #[test]
    fn test_null_fill_disables_painting() {
        let options = ReplaceOptions::from_json(r#"{"redaction_fill": null}"#).unwrap();
        assert_eq!(options.fill_color(), None);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let result = ReplaceOptions::from_json(r#"{"locate": {"same_line_tolerance": -1}}"#);
        assert!(matches!(result, Err(ReplaceError::InvalidInput(_))));

        let result = ReplaceOptions::from_json(r#"{"redaction_fill": [1.0, 2.0, 0.0]}"#);
        assert!(matches!(result, Err(ReplaceError::InvalidInput(_))));

        let result = ReplaceOptions::from_json("not json");
        assert!(matches!(result, Err(ReplaceError::Json(_))));
    }

    #[test]
    fn test_text_page_options() {
        let options = ReplaceOptions::default();
        assert_eq!(options.text_page_options(), TextPageOptions::default());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(&path, r#"{"locate": {"same_line_tolerance": 3.5}}"#).unwrap();

        let options = ReplaceOptions::from_file(&path).unwrap();
        assert_eq!(options.locate.same_line_tolerance, 3.5);

        let missing = ReplaceOptions::from_file(dir.path().join("absent.json"));
        assert!(matches!(missing, Err(ReplaceError::Io(_))));
    }
}
