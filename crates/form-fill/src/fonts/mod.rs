//! Font resolution for replacement text
//!
//! A PDF font name is resolved to something that can draw new text by
//! trying, in order:
//!
//! 1. a standard 14 font of that name, or a complete program embedded in
//!    the document
//! 2. a standard 14 stand-in for well-known families
//! 3. a [`FontProvider`], which may find a TrueType file or a better name
//! 4. Helvetica
//!
//! Resolution never fails. Results are memoized per name for the lifetime
//! of the resolver.

pub mod names;
mod provider;
#[cfg(feature = "web-fonts")]
mod web;

pub use provider::{ChainProvider, FontProvider, LocalFontProvider, NoFontProvider, ProvidedFont};
#[cfg(feature = "web-fonts")]
pub use web::WebFontProvider;

use pdf_core::{strip_subset_tag, FontData, FontHandle, PdfDocument, Standard14};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Lowercase name prefixes of families with a close standard 14 substitute
const FAMILY_SUBSTITUTES: [(&str, Standard14); 10] = [
    ("lmroman", Standard14::TimesRoman),
    ("cmr", Standard14::TimesRoman),
    ("times", Standard14::TimesRoman),
    ("arial", Standard14::Helvetica),
    ("helvetica", Standard14::Helvetica),
    ("lmsans", Standard14::Helvetica),
    ("cmss", Standard14::Helvetica),
    ("courier", Standard14::Courier),
    ("lmmono", Standard14::Courier),
    ("cmtt", Standard14::Courier),
];

/// Standard 14 substitute for a font name, by family prefix
pub fn family_substitute(name: &str) -> Option<Standard14> {
    let lower = strip_subset_tag(name).to_ascii_lowercase();
    FAMILY_SUBSTITUTES
        .iter()
        .find(|(prefix, _)| lower.starts_with(prefix))
        .map(|(_, font)| *font)
}

/// Memoizing font resolver owning a scratch directory for provided files
pub struct FontResolver {
    cache: HashMap<String, FontHandle>,
    provider: Box<dyn FontProvider>,
    cache_dir: Option<TempDir>,
}

impl FontResolver {
    pub fn new(provider: Box<dyn FontProvider>) -> Self {
        Self {
            cache: HashMap::new(),
            provider,
            cache_dir: None,
        }
    }

    /// A resolver that never looks outside the document
    pub fn offline() -> Self {
        Self::new(Box::new(NoFontProvider))
    }

    /// Local font directories, then the web when `web-fonts` is enabled
    pub fn with_default_provider() -> Self {
        #[allow(unused_mut)]
        let mut providers: Vec<Box<dyn FontProvider>> = vec![Box::new(LocalFontProvider::system())];

        #[cfg(feature = "web-fonts")]
        {
            match WebFontProvider::new() {
                Ok(web) => providers.push(Box::new(web)),
                Err(e) => tracing::warn!(error = %e, "web font provider unavailable"),
            }
        }

        Self::new(Box::new(ChainProvider::new(providers)))
    }

    /// Resolve `name` to a drawable font
    pub fn resolve(&mut self, doc: &PdfDocument, name: &str) -> FontHandle {
        if let Some(font) = self.cache.get(name) {
            return font.clone();
        }

        let font = self.resolve_uncached(doc, name);
        tracing::debug!(requested = name, resolved = font.name(), "font resolved");
        self.cache.insert(name.to_string(), font.clone());
        font
    }

    fn resolve_uncached(&mut self, doc: &PdfDocument, name: &str) -> FontHandle {
        let stripped = strip_subset_tag(name);
        if let Some(std) = Standard14::from_name(stripped) {
            return FontHandle::Standard(std);
        }
        if let Some(program) = doc.embedded_font_program(name) {
            return FontHandle::Embedded(Arc::new(program));
        }

        if let Some(std) = family_substitute(stripped) {
            tracing::info!(font = name, substitute = std.base_font(), "using standard font for family");
            return FontHandle::Standard(std);
        }

        if let Some(font) = self.from_provider(name) {
            return font;
        }

        tracing::info!(font = name, "no match, using Helvetica");
        FontHandle::Standard(Standard14::Helvetica)
    }

    fn from_provider(&mut self, name: &str) -> Option<FontHandle> {
        let cache_dir = match self.cache_dir() {
            Ok(dir) => dir.to_path_buf(),
            Err(e) => {
                tracing::warn!(error = %e, "cannot create font cache directory");
                return None;
            }
        };

        let found = match self.provider.locate(name, &cache_dir) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(font = name, error = %e, "font provider failed");
                return None;
            }
        };

        if let Some(path) = &found.path {
            match load_ttf(&found.name, path) {
                Ok(data) => return Some(FontHandle::Embedded(Arc::new(data))),
                Err(e) => {
                    tracing::warn!(font = name, path = %path.display(), error = %e, "provided font unusable")
                }
            }
        }

        let lower = found.name.to_ascii_lowercase();
        if lower.contains("times") {
            Some(FontHandle::Standard(Standard14::TimesRoman))
        } else if lower.contains("arial") || lower.contains("helvetica") {
            Some(FontHandle::Standard(Standard14::Helvetica))
        } else {
            Standard14::from_name(&found.name).map(FontHandle::Standard)
        }
    }

    fn cache_dir(&mut self) -> std::io::Result<&Path> {
        if self.cache_dir.is_none() {
            let dir = tempfile::Builder::new().prefix("pdf_fonts_").tempdir()?;
            self.cache_dir = Some(dir);
        }
        match &self.cache_dir {
            Some(dir) => Ok(dir.path()),
            None => Err(std::io::Error::other("font cache directory missing")),
        }
    }

    /// Remove the scratch directory, logging failures
    pub fn close(mut self) {
        if let Some(dir) = self.cache_dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove font cache");
            }
        }
    }
}

impl Default for FontResolver {
    fn default() -> Self {
        Self::with_default_provider()
    }
}

fn load_ttf(name: &str, path: &Path) -> crate::Result<FontData> {
    let bytes = std::fs::read(path)?;
    let font_name: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(FontData::from_ttf(&font_name, &bytes)?)
}
