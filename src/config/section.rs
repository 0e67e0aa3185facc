//! `[stitch]`, `[css]`, `[js]` and `[[preprocessor]]` sections.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::bundle::{BundleKind, DEFAULT_HASH_KEY, PreprocessorScope};
use crate::hash::HashAlgorithm;
use crate::minify::MinifierKind;

// ============================================================================
// [stitch]
// ============================================================================

/// Bundler-wide settings.
///
/// # Example
///
/// ```toml
/// [stitch]
/// root = "public"
/// debug_env = "STITCH_DEBUG"
/// hash = "blake3"
/// base_href = "https://cdn.example.com"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Web root that virtual paths are resolved against, relative to the
    /// config file.
    pub root: PathBuf,

    /// Debug mode when `debug_env` is unset.
    pub debug: bool,

    /// Environment variable consulted on every render for debug mode.
    pub debug_env: Option<String>,

    pub hash: HashAlgorithm,

    /// Query-string key for revision hashes.
    pub hash_key: String,

    /// Prefix for release web paths.
    pub base_href: Option<String>,

    /// Serialize renders of one output across processes.
    pub cross_process_locking: bool,

    /// Lock file directory, relative to the config file.
    pub lock_dir: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            debug: false,
            debug_env: None,
            hash: HashAlgorithm::default(),
            hash_key: DEFAULT_HASH_KEY.to_string(),
            base_href: None,
            cross_process_locking: true,
            lock_dir: None,
        }
    }
}

// ============================================================================
// [css] / [js]
// ============================================================================

/// Per-type defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KindConfig {
    /// Bundle-wide minifier; unset means the built-in one for the type.
    pub minifier: Option<MinifierKind>,
}

impl KindConfig {
    /// Configured minifier, falling back to the built-in for `kind`.
    pub fn minifier_for(&self, kind: BundleKind) -> MinifierKind {
        self.minifier.unwrap_or(match kind {
            BundleKind::Css => MinifierKind::Lightningcss,
            BundleKind::JavaScript => MinifierKind::Oxc,
        })
    }
}

// ============================================================================
// [[preprocessor]]
// ============================================================================

/// External command registered as a preprocessor.
///
/// ```toml
/// [[preprocessor]]
/// name = "sass"
/// scope = "css"
/// extensions = ["scss", "sass"]
/// command = ["sass", "--stdin", "--load-path=$DIR"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessorConfig {
    pub name: String,
    #[serde(default = "default_scope")]
    pub scope: PreprocessorScope,
    pub extensions: Vec<String>,
    pub command: Vec<String>,
}

const fn default_scope() -> PreprocessorScope {
    PreprocessorScope::Global
}
