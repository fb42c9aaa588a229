//! Fill and checkbox entries applied to a flat PDF in one session

use crate::cancel::CancelRegistry;
use crate::config::ReplaceOptions;
use crate::driver::{default_output_path, BatchReport, EditSession, LinePairs};
use crate::glyph::read_page;
use crate::Result;
use once_cell::sync::Lazy;
use pdf_core::{InteractiveFieldsResult, PdfDocument};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

static CHECKBOX_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[ Xx]?\]|\([ Xx]?\)|[☐☑☒□■○◯●]").unwrap());

/// Lines of a form region and the same lines with values filled in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillEntry {
    pub lines: String,
    pub filled_lines: String,
}

/// A group of checkboxes and which of them to check
///
/// Index `n` in `checked_indices` is the `n`-th checkbox pattern in `lines`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckboxEntry {
    pub lines: String,
    pub checked_indices: Vec<usize>,
    /// Option text of each checkbox, in order
    pub checkbox_values: Vec<String>,
    pub context_key: Option<String>,
}

impl CheckboxEntry {
    /// `lines` with every checkbox checked or unchecked by index
    pub fn toggled_lines(&self) -> String {
        let mut index = 0;
        CHECKBOX_PATTERN
            .replace_all(&self.lines, |caps: &Captures| {
                let check = self.checked_indices.contains(&index);
                index += 1;
                toggle_checkbox(&caps[0], check)
            })
            .into_owned()
    }
}

/// Checked or unchecked form of one checkbox pattern
///
/// Patterns already in the requested state, and unknown text, are returned
/// unchanged.
pub fn toggle_checkbox(pattern: &str, check: bool) -> String {
    let toggled = if check {
        match pattern {
            "[ ]" | "[]" => "[X]",
            "( )" | "()" => "(X)",
            "☐" => "☑",
            "□" => "■",
            "○" | "◯" => "●",
            other => other,
        }
    } else {
        match pattern {
            "[X]" | "[x]" => "[ ]",
            "(X)" | "(x)" => "( )",
            "☑" | "☒" => "☐",
            "■" => "□",
            "○" | "◯" | "●" => "○",
            other => other,
        }
    };
    toggled.to_string()
}

/// Where the checkbox batch starts searching
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Continuation {
    /// From the top of the document; checkbox groups may precede text fields
    #[default]
    FromTop,
    /// From the cursor the text batch ended at
    AfterTextBatch,
}

/// Result of [`fill_flat_pdf_with_entries`]
#[derive(Debug, Clone, PartialEq)]
pub struct FillReport {
    pub path: PathBuf,
    pub text: BatchReport,
    pub checkbox: BatchReport,
}

/// Apply fill entries, then checkbox entries, to the PDF at `form_path`
///
/// Both batches run against one in-memory document that is saved once, to
/// `out_path` or `<stem>_filled.pdf`. Line counts are checked for both
/// batches before anything is edited.
pub fn fill_flat_pdf_with_entries<P: AsRef<Path>>(
    fill_entries: &[FillEntry],
    checkbox_entries: &[CheckboxEntry],
    form_path: P,
    out_path: Option<&Path>,
    continuation: Continuation,
    options: &ReplaceOptions,
) -> Result<FillReport> {
    let form_path = form_path.as_ref();

    let search: Vec<&str> = fill_entries.iter().flat_map(|e| e.lines.lines()).collect();
    let filled: Vec<&str> = fill_entries
        .iter()
        .flat_map(|e| e.filled_lines.lines())
        .collect();
    let text_pairs = LinePairs::new(&search, &filled)?;

    let toggled: Vec<String> = checkbox_entries
        .iter()
        .map(CheckboxEntry::toggled_lines)
        .collect();
    let boxes: Vec<&str> = checkbox_entries
        .iter()
        .flat_map(|e| e.lines.lines())
        .collect();
    let toggled: Vec<&str> = toggled.iter().flat_map(|t| t.lines()).collect();
    let checkbox_pairs = LinePairs::new(&boxes, &toggled)?;

    let mut session = EditSession::open(form_path, options.clone())?
        .with_cancel_flag(CancelRegistry::global().flag_for(form_path));

    if let InteractiveFieldsResult::Interactive(fields) = session.document().form_kind() {
        tracing::info!(
            path = %form_path.display(),
            fields = fields.len(),
            "document has interactive fields, editing page content anyway"
        );
    }

    let text = session.replace_lines(&text_pairs, None)?;
    let start = match continuation {
        Continuation::FromTop => None,
        Continuation::AfterTextBatch => text.cursor,
    };
    let checkbox = session.replace_lines(&checkbox_pairs, start)?;

    let out_path = out_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(form_path));
    let path = session.commit(&out_path)?;

    Ok(FillReport {
        path,
        text,
        checkbox,
    })
}

/// One line of page text with its position
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLine {
    pub page: usize,
    /// Baseline, top-left origin
    pub y: f64,
    pub x: f64,
    pub text: String,
}

/// Every text line of the document, by page, then top to bottom, then left
/// to right
///
/// Unreadable pages are logged and skipped.
pub fn document_lines(doc: &PdfDocument, options: &ReplaceOptions) -> Vec<DocumentLine> {
    let text_options = options.text_page_options();
    let mut lines = Vec::new();
    for page_index in 0..doc.page_count() {
        let page = match read_page(doc, page_index, &text_options) {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(page = page_index, error = %e, "skipping unreadable page");
                continue;
            }
        };
        lines.extend(page.lines.iter().map(|line| DocumentLine {
            page: page_index,
            y: line.baseline,
            x: line.bbox.x0,
            text: line.text(),
        }));
    }
    lines.sort_by(|a, b| {
        a.page
            .cmp(&b.page)
            .then(a.y.total_cmp(&b.y))
            .then(a.x.total_cmp(&b.x))
    });
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{lines_content, pages};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_toggle_checkbox() {
        assert_eq!(toggle_checkbox("[ ]", true), "[X]");
        assert_eq!(toggle_checkbox("[]", true), "[X]");
        assert_eq!(toggle_checkbox("()", true), "(X)");
        assert_eq!(toggle_checkbox("☐", true), "☑");
        assert_eq!(toggle_checkbox("□", true), "■");
        assert_eq!(toggle_checkbox("◯", true), "●");
        assert_eq!(toggle_checkbox("[X]", true), "[X]");

        assert_eq!(toggle_checkbox("[x]", false), "[ ]");
        assert_eq!(toggle_checkbox("(X)", false), "( )");
        assert_eq!(toggle_checkbox("☒", false), "☐");
        assert_eq!(toggle_checkbox("■", false), "□");
        assert_eq!(toggle_checkbox("●", false), "○");
        assert_eq!(toggle_checkbox("( )", false), "( )");
    }

    #[test]
    fn test_toggled_lines_by_index() {
        let entry = CheckboxEntry {
            lines: "Sex: [ ] Male [ ] Female\nSmoker: ☐ Yes ☑ No".to_string(),
            checked_indices: vec![1, 2],
            ..CheckboxEntry::default()
        };
        assert_eq!(
            entry.toggled_lines(),
            "Sex: [ ] Male [X] Female\nSmoker: ☑ Yes ☐ No"
        );
    }

    #[test]
    fn test_checkbox_entry_from_json() {
        let entry: CheckboxEntry =
            serde_json::from_str(r#"{"lines": "[ ] A", "checked_indices": [0]}"#).unwrap();
        assert_eq!(entry.toggled_lines(), "[X] A");
        assert_eq!(entry.context_key, None);

        let continuation: Continuation = serde_json::from_str(r#""after_text_batch""#).unwrap();
        assert_eq!(continuation, Continuation::AfterTextBatch);
    }

    #[test]
    fn test_document_lines_order() {
        let doc = pages(&[
            &lines_content(&[(600.0, "second"), (700.0, "first")]),
            &lines_content(&[(700.0, "third")]),
        ]);
        let lines = document_lines(&doc, &ReplaceOptions::default());
        let texts: Vec<(usize, &str)> = lines.iter().map(|l| (l.page, l.text.as_str())).collect();
        assert_eq!(texts, vec![(0, "first"), (0, "second"), (1, "third")]);
        assert!(lines[0].y < lines[1].y);
        assert!((lines[0].x - 72.0).abs() < 1e-6);
    }
}
