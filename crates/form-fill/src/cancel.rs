//! Cooperative cancellation of edits, keyed by document path

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Shared flag checked between replacements
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

static GLOBAL: Lazy<CancelRegistry> = Lazy::new(CancelRegistry::new);

/// Cancellation requests for documents being edited
///
/// Paths are normalised (home expansion, made absolute, `.` and `..`
/// resolved lexically), so differently spelled paths to one file share a
/// flag.
#[derive(Debug, Default)]
pub struct CancelRegistry {
    flags: Mutex<HashMap<PathBuf, CancelFlag>>,
}

impl CancelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry
    pub fn global() -> &'static CancelRegistry {
        &GLOBAL
    }

    fn flags(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, CancelFlag>> {
        self.flags.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The flag for `path`, created uncancelled if absent
    pub fn flag_for(&self, path: impl AsRef<Path>) -> CancelFlag {
        self.flags()
            .entry(normalize_path(path.as_ref()))
            .or_default()
            .clone()
    }

    /// Request cancellation of edits to `path`
    pub fn cancel(&self, path: impl AsRef<Path>) {
        let key = normalize_path(path.as_ref());
        tracing::info!(path = %key.display(), "cancellation requested");
        self.flags().entry(key).or_default().cancel();
    }

    pub fn is_cancelled(&self, path: impl AsRef<Path>) -> bool {
        self.flags()
            .get(&normalize_path(path.as_ref()))
            .is_some_and(CancelFlag::is_cancelled)
    }

    /// Forget any request for `path`
    pub fn clear(&self, path: impl AsRef<Path>) {
        if let Some(flag) = self.flags().remove(&normalize_path(path.as_ref())) {
            flag.reset();
        }
    }

    /// Paths with a pending cancellation, sorted
    pub fn list(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .flags()
            .iter()
            .filter(|(_, flag)| flag.is_cancelled())
            .map(|(path, _)| path.clone())
            .collect();
        paths.sort();
        paths
    }
}

/// Absolute, lexically cleaned form of `path` with `~` expanded
pub fn normalize_path(path: &Path) -> PathBuf {
    let expanded = match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    };

    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(expanded),
            Err(_) => expanded,
        }
    };

    let mut cleaned = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}
