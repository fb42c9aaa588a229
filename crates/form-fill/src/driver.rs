//! Sequential multi-line replacement over one edit session

use crate::cancel::{CancelFlag, CancelRegistry};
use crate::config::ReplaceOptions;
use crate::cursor::Cursor;
use crate::fonts::FontResolver;
use crate::locate::{self, Occurrence};
use crate::redraw;
use crate::{ReplaceError, Result};
use pdf_core::PdfDocument;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Ordered (search, replacement) line pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinePairs {
    pairs: Vec<(String, String)>,
}

impl LinePairs {
    /// Pair up two equally long lists
    pub fn new<A: AsRef<str>, B: AsRef<str>>(search: &[A], replacement: &[B]) -> Result<Self> {
        if search.len() != replacement.len() {
            return Err(ReplaceError::InvalidInput(format!(
                "{} search lines but {} replacement lines",
                search.len(),
                replacement.len()
            )));
        }
        let pairs = search
            .iter()
            .zip(replacement)
            .map(|(s, r)| (s.as_ref().to_string(), r.as_ref().to_string()))
            .collect();
        Ok(Self { pairs })
    }

    /// Pair the lines of two multi-line strings
    pub fn from_text(search: &str, replacement: &str) -> Result<Self> {
        let search: Vec<&str> = search.lines().collect();
        let replacement: Vec<&str> = replacement.lines().collect();
        Self::new(&search, &replacement)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(s, r)| (s.as_str(), r.as_str()))
    }

    /// The pairs a batch actually processes
    ///
    /// Blank searches are dropped. Of the rest, only pairs whose search text
    /// is changed by at least one pair are kept; unchanged pairs of such a
    /// search stay in place so they still consume an occurrence.
    pub fn effective(&self) -> Vec<(&str, &str)> {
        let candidates: Vec<(&str, &str)> = self
            .iter()
            .filter(|(search, _)| !search.trim().is_empty())
            .collect();
        let changing: HashSet<&str> = candidates
            .iter()
            .filter(|(search, replacement)| search != replacement)
            .map(|(search, _)| *search)
            .collect();
        candidates
            .into_iter()
            .filter(|(search, _)| changing.contains(search))
            .collect()
    }
}

/// Counts of what a batch did, and where it stopped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub replaced: usize,
    /// Unchanged pairs whose occurrence was skipped over
    pub advanced: usize,
    pub not_found: usize,
    /// Pairs that hit a page or drawing error
    pub failed: usize,
    /// Cursor after the last handled occurrence, for a following batch
    pub cursor: Option<Cursor>,
}

enum Step {
    Replaced(Cursor),
    Advanced(Cursor),
    NotFound,
    NothingToReplace,
}

/// One document being edited in memory, saved once by [`EditSession::commit`]
pub struct EditSession {
    source: PathBuf,
    doc: PdfDocument,
    fonts: FontResolver,
    options: ReplaceOptions,
    cancel: Option<CancelFlag>,
}

impl EditSession {
    pub fn open<P: AsRef<Path>>(path: P, options: ReplaceOptions) -> Result<Self> {
        options.validate()?;
        let doc = PdfDocument::open(path.as_ref())?;
        Ok(Self::from_document(doc, path, options))
    }

    /// Edit an already loaded document; `source` names it in errors and
    /// cancellation
    pub fn from_document<P: AsRef<Path>>(mut doc: PdfDocument, source: P, options: ReplaceOptions) -> Self {
        doc.set_compress(options.compress);
        Self {
            source: source.as_ref().to_path_buf(),
            doc,
            fonts: FontResolver::with_default_provider(),
            options,
            cancel: None,
        }
    }

    pub fn with_font_resolver(mut self, fonts: FontResolver) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn document(&self) -> &PdfDocument {
        &self.doc
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn options(&self) -> &ReplaceOptions {
        &self.options
    }

    pub fn find_occurrence(&self, search: &str, after: Option<&Cursor>) -> Result<Option<Occurrence>> {
        locate::find_occurrence(&self.doc, search, after, &self.options)
    }

    pub fn find_position(&self, search: &str, after: Option<&Cursor>) -> Result<Option<Cursor>> {
        locate::find_position(&self.doc, search, after, &self.options)
    }

    pub fn replace_occurrence(&mut self, occurrence: &Occurrence, replacement: &str) -> Result<Option<Cursor>> {
        redraw::replace_occurrence(
            &mut self.doc,
            occurrence,
            replacement,
            &mut self.fonts,
            &self.options,
        )
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
            tracing::info!(path = %self.source.display(), "edit cancelled");
            return Err(ReplaceError::Cancelled(self.source.clone()));
        }
        Ok(())
    }

    fn step(&mut self, search: &str, replacement: &str, cursor: Option<&Cursor>) -> Result<Step> {
        if search == replacement {
            return Ok(match self.find_position(search, cursor)? {
                Some(next) => Step::Advanced(next),
                None => Step::NotFound,
            });
        }

        let Some(occurrence) = self.find_occurrence(search, cursor)? else {
            return Ok(Step::NotFound);
        };
        Ok(match self.replace_occurrence(&occurrence, replacement)? {
            Some(next) => Step::Replaced(next),
            None => Step::NothingToReplace,
        })
    }

    /// Process the effective pairs in order, advancing the cursor
    ///
    /// A pair that is not found, or that fails on its page, leaves the
    /// cursor where it was and the batch goes on. Cancellation is checked
    /// before every pair.
    pub fn replace_lines(&mut self, pairs: &LinePairs, start: Option<Cursor>) -> Result<BatchReport> {
        let mut report = BatchReport {
            cursor: start,
            ..BatchReport::default()
        };

        for (search, replacement) in pairs.effective() {
            self.check_cancelled()?;

            match self.step(search, replacement, report.cursor.as_ref()) {
                Ok(Step::Replaced(next)) => {
                    report.replaced += 1;
                    report.cursor = Some(next);
                }
                Ok(Step::Advanced(next)) => {
                    report.advanced += 1;
                    report.cursor = Some(next);
                }
                Ok(Step::NotFound) => {
                    tracing::debug!(search, "no matching occurrence");
                    report.not_found += 1;
                }
                Ok(Step::NothingToReplace) => report.failed += 1,
                Err(e) => {
                    tracing::warn!(search, error = %e, "replacement failed, continuing");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            path = %self.source.display(),
            replaced = report.replaced,
            advanced = report.advanced,
            not_found = report.not_found,
            failed = report.failed,
            "batch finished"
        );
        Ok(report)
    }

    /// Write the document to `out_path` through a temp file in its directory
    ///
    /// The font cache directory is removed whether or not saving succeeds.
    pub fn commit<P: AsRef<Path>>(self, out_path: P) -> Result<PathBuf> {
        let out_path = out_path.as_ref();
        let Self { mut doc, fonts, .. } = self;
        fonts.close();

        let save_error = |reason: String| ReplaceError::Save(out_path.to_path_buf(), reason);

        let bytes = doc.to_bytes().map_err(|e| save_error(e.to_string()))?;
        let dir = match out_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| save_error(e.to_string()))?;
        tmp.write_all(&bytes)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| save_error(e.to_string()))?;
        tmp.persist(out_path)
            .map_err(|e| save_error(e.error.to_string()))?;

        tracing::info!(path = %out_path.display(), bytes = bytes.len(), "document saved");
        Ok(out_path.to_path_buf())
    }
}

/// `<stem>_filled.pdf` next to the input
pub fn default_output_path<P: AsRef<Path>>(input: P) -> PathBuf {
    let input = input.as_ref();
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    input.with_file_name(format!("{stem}_filled.pdf"))
}

/// Where a batch saved its document, and what it did
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceOutcome {
    pub path: PathBuf,
    pub report: BatchReport,
}

/// Replace `search` lines with `replacement` lines in the PDF at `path`
///
/// The document is saved once, to `out_path` or `<stem>_filled.pdf` next to
/// the input. `start` continues from a previous batch. The edit honours
/// cancellation requests registered for `path` in
/// [`CancelRegistry::global`]; clearing the request is up to the caller.
pub fn replace_lines<P, A, B>(
    path: P,
    search: &[A],
    replacement: &[B],
    out_path: Option<&Path>,
    start: Option<Cursor>,
    options: &ReplaceOptions,
) -> Result<ReplaceOutcome>
where
    P: AsRef<Path>,
    A: AsRef<str>,
    B: AsRef<str>,
{
    let path = path.as_ref();
    let pairs = LinePairs::new(search, replacement)?;

    let mut session = EditSession::open(path, options.clone())?
        .with_cancel_flag(CancelRegistry::global().flag_for(path));
    let report = session.replace_lines(&pairs, start)?;

    let out_path = out_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(path));
    let path = session.commit(&out_path)?;
    Ok(ReplaceOutcome { path, report })
}
