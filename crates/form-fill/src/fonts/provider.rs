//! Sources of font files for names the document cannot resolve

use super::names::{compact, family_name, split_style};
use crate::{ReplaceError, Result};
use std::path::{Path, PathBuf};

/// How deep font directories are searched
const MAX_SEARCH_DEPTH: usize = 4;

/// Outcome of a provider lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvidedFont {
    /// The name the provider resolved the request to
    pub name: String,
    /// A TrueType file in the session cache, when one was found
    pub path: Option<PathBuf>,
}

impl ProvidedFont {
    pub fn name_only(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
        }
    }
}

/// Finds a font file matching a PDF font name
pub trait FontProvider {
    /// Look up `font_name`, placing any file in `cache_dir`
    fn locate(&self, font_name: &str, cache_dir: &Path) -> Result<ProvidedFont>;
}

/// Resolves names without files
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFontProvider;

impl FontProvider for NoFontProvider {
    fn locate(&self, font_name: &str, _cache_dir: &Path) -> Result<ProvidedFont> {
        Ok(ProvidedFont::name_only(family_name(font_name)))
    }
}

/// Tries providers in order; the first that yields a file wins
pub struct ChainProvider {
    providers: Vec<Box<dyn FontProvider>>,
}

impl ChainProvider {
    pub fn new(providers: Vec<Box<dyn FontProvider>>) -> Self {
        Self { providers }
    }
}

impl FontProvider for ChainProvider {
    fn locate(&self, font_name: &str, cache_dir: &Path) -> Result<ProvidedFont> {
        let mut resolved: Option<ProvidedFont> = None;
        let mut last_error = None;

        for provider in &self.providers {
            match provider.locate(font_name, cache_dir) {
                Ok(found) if found.path.is_some() => return Ok(found),
                Ok(found) => {
                    resolved.get_or_insert(found);
                }
                Err(e) => last_error = Some(e),
            }
        }

        match (resolved, last_error) {
            (Some(found), _) => Ok(found),
            (None, Some(e)) => Err(e),
            (None, None) => Ok(ProvidedFont::name_only(family_name(font_name))),
        }
    }
}

/// Searches font directories on this machine
///
/// A file matches when its compacted stem equals the compacted family name,
/// with or without the style suffix ("Arial-Bold" matches `arialbold.ttf`
/// before `arial.ttf`).
#[derive(Debug, Clone)]
pub struct LocalFontProvider {
    dirs: Vec<PathBuf>,
}

impl LocalFontProvider {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// The usual system and per-user font directories
    pub fn system() -> Self {
        let mut dirs: Vec<PathBuf> = [
            dirs::font_dir(),
            dirs::home_dir().map(|home| home.join(".fonts")),
            dirs::data_dir().map(|data| data.join("fonts")),
        ]
        .into_iter()
        .flatten()
        .collect();
        dirs.extend(
            [
                "/usr/share/fonts",
                "/usr/local/share/fonts",
                "/Library/Fonts",
                "/System/Library/Fonts",
                "C:\\Windows\\Fonts",
            ]
            .into_iter()
            .map(PathBuf::from),
        );
        Self { dirs }
    }

    fn candidates(font_name: &str) -> Vec<String> {
        let family = compact(&family_name(font_name));
        let mut keys = Vec::new();
        if let (_, Some(style)) = split_style(font_name) {
            let style = compact(style.trim_end_matches("MT"));
            if !style.is_empty() && style != "regular" {
                keys.push(format!("{family}{style}"));
            }
        }
        keys.push(family.clone());
        keys.push(format!("{family}regular"));
        keys
    }

    fn find_file(&self, keys: &[String]) -> Option<PathBuf> {
        let mut files = Vec::new();
        for dir in &self.dirs {
            collect_font_files(dir, 0, &mut files);
        }
        keys.iter().find_map(|key| {
            files
                .iter()
                .find(|path| {
                    path.file_stem()
                        .and_then(|s| s.to_str())
                        .is_some_and(|stem| compact(stem) == *key)
                })
                .cloned()
        })
    }
}

fn collect_font_files(dir: &Path, depth: usize, out: &mut Vec<PathBuf>) {
    if depth > MAX_SEARCH_DEPTH {
        return;
    }
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_font_files(&path, depth + 1, out);
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("ttf"))
        {
            out.push(path);
        }
    }
}

impl FontProvider for LocalFontProvider {
    fn locate(&self, font_name: &str, cache_dir: &Path) -> Result<ProvidedFont> {
        let name = family_name(font_name);
        let Some(source) = self.find_file(&Self::candidates(font_name)) else {
            return Ok(ProvidedFont::name_only(name));
        };

        let file_name = source
            .file_name()
            .ok_or_else(|| ReplaceError::FontProvider(format!("bad font path {}", source.display())))?;
        let target = cache_dir.join(file_name);
        std::fs::copy(&source, &target).map_err(|e| {
            ReplaceError::FontProvider(format!("copying {}: {e}", source.display()))
        })?;

        tracing::debug!(font = font_name, path = %target.display(), "found local font file");
        Ok(ProvidedFont {
            name,
            path: Some(target),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Failing;

    impl FontProvider for Failing {
        fn locate(&self, _font_name: &str, _cache_dir: &Path) -> Result<ProvidedFont> {
            Err(ReplaceError::FontProvider("offline".to_string()))
        }
    }

    #[test]
    fn test_no_provider_resolves_family() {
        let found = NoFontProvider
            .locate("ABCDEF+TimesNewRomanPS-BoldMT", Path::new("."))
            .unwrap();
        assert_eq!(found, ProvidedFont::name_only("Times New Roman"));
    }

    #[test]
    fn test_chain_prefers_names_over_errors() {
        let chain = ChainProvider::new(vec![Box::new(Failing), Box::new(NoFontProvider)]);
        let found = chain.locate("ArialMT", Path::new(".")).unwrap();
        assert_eq!(found.name, "Arial");

        let chain = ChainProvider::new(vec![Box::new(Failing)]);
        assert!(chain.locate("ArialMT", Path::new(".")).is_err());
    }

    #[test]
    fn test_local_provider_copies_matching_file() {
        let fonts = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(fonts.path().join("truetype")).unwrap();
        std::fs::write(fonts.path().join("truetype/OpenSans-Bold.ttf"), b"bold").unwrap();
        std::fs::write(fonts.path().join("truetype/OpenSans.ttf"), b"regular").unwrap();

        let provider = LocalFontProvider::new(vec![fonts.path().to_path_buf()]);

        let bold = provider.locate("OpenSans-Bold", cache.path()).unwrap();
        assert_eq!(bold.name, "Open Sans");
        let path = bold.path.unwrap();
        assert!(path.starts_with(cache.path()));
        assert_eq!(std::fs::read(path).unwrap(), b"bold");

        let regular = provider.locate("OpenSans", cache.path()).unwrap();
        assert_eq!(std::fs::read(regular.path.unwrap()).unwrap(), b"regular");

        let missing = provider.locate("Garamond", cache.path()).unwrap();
        assert_eq!(missing, ProvidedFont::name_only("Garamond"));
    }

    #[test]
    fn test_candidates() {
        assert_eq!(
            LocalFontProvider::candidates("Arial-BoldMT"),
            vec!["arialbold", "arial", "arialregular"]
        );
    }
}
