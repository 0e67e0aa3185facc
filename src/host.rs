//! Host integration seams: debug detection and virtual path mapping.

use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::utils::path::{lexical_normalize, route::trim_virtual_root};

// ============================================================================
// Debug Status
// ============================================================================

/// Reports whether the host is running in debug mode.
pub trait DebugStatus: Send + Sync {
    fn is_debugging(&self) -> bool;
}

/// Debug status fixed at construction, switchable at runtime.
#[derive(Debug, Default)]
pub struct StaticDebugStatus(AtomicBool);

impl StaticDebugStatus {
    pub fn new(debugging: bool) -> Self {
        Self(AtomicBool::new(debugging))
    }

    pub fn set(&self, debugging: bool) {
        self.0.store(debugging, Ordering::SeqCst);
    }
}

impl DebugStatus for StaticDebugStatus {
    fn is_debugging(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Debug status read from an environment variable on every call.
///
/// `1`, `true`, `yes` and `on` (any case) mean debugging.
#[derive(Debug, Clone)]
pub struct EnvDebugStatus {
    var: String,
}

impl EnvDebugStatus {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl DebugStatus for EnvDebugStatus {
    fn is_debugging(&self) -> bool {
        std::env::var(&self.var).is_ok_and(|v| {
            matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
    }
}

// ============================================================================
// Path Translation
// ============================================================================

/// Maps web-facing virtual paths to filesystem paths and back.
pub trait PathTranslator: Send + Sync {
    fn to_file_system_path(&self, virtual_path: &str) -> PathBuf;
    fn to_virtual_path(&self, path: &Path) -> String;
}

/// Translator rooted at a single web root directory.
///
/// `~/css/a.css`, `/css/a.css` and `css/a.css` all map to `<root>/css/a.css`.
/// Query strings are not part of the physical path and are dropped.
#[derive(Debug, Clone)]
pub struct RootPathTranslator {
    root: PathBuf,
}

impl RootPathTranslator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PathTranslator for RootPathTranslator {
    fn to_file_system_path(&self, virtual_path: &str) -> PathBuf {
        let path = virtual_path.split(['?', '#']).next().unwrap_or_default();
        let path = trim_virtual_root(path).trim_start_matches(['/', '\\']);
        lexical_normalize(&self.root.join(path))
    }

    fn to_virtual_path(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let parts: Vec<_> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => part.to_str(),
                _ => None,
            })
            .collect();
        format!("/{}", parts.join("/"))
    }
}
