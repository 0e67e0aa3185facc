//! Bundle error types.
//!
//! Every render and registration path reports failures through [`BundleError`].
//! Messages embed the offending path or name verbatim.

use std::path::PathBuf;
use thiserror::Error;

/// Library result alias.
pub type Result<T, E = BundleError> = std::result::Result<T, E>;

/// Errors raised while configuring or rendering a bundle.
#[derive(Debug, Error)]
pub enum BundleError {
    /// A declared local asset does not exist at render time (release only).
    #[error("missing source file `{}`", path.display())]
    MissingSource { path: PathBuf },

    /// `render_named` / `render_cached` called for a name never registered.
    #[error("no bundle registered under name `{name}`")]
    UnregisteredName { name: String },

    /// A preprocessor needs a native capability the host does not provide.
    #[error("{feature} is not supported on this platform: {detail}")]
    UnsupportedPlatform { feature: String, detail: String },

    /// Misconfiguration caught at configuration time.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("IO error on `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch `{url}`: {detail}")]
    Remote { url: String, detail: String },

    #[error("preprocessing `{}` failed: {detail}", path.display())]
    Preprocess { path: PathBuf, detail: String },
}

impl BundleError {
    /// Wrap an IO error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means the host lacks a required capability.
    ///
    /// Host code uses this to degrade gracefully (e.g. skip a `.less` bundle).
    pub fn is_unsupported_platform(&self) -> bool {
        matches!(self, Self::UnsupportedPlatform { .. })
    }
}
