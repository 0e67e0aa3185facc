//! Minifiers for aggregated CSS and JavaScript.
//!
//! Uses lightningcss for CSS and oxc for JavaScript. Minifiers that cannot
//! parse their input return it unchanged, so a syntax error in one source
//! never breaks the whole bundle.

mod css;
mod js;

pub use css::CssMinifier;
pub use js::JsMinifier;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Whitespace/structure-reducing transform.
pub trait Minifier: Send + Sync {
    fn minify(&self, content: &str) -> String;

    /// Identity used in bundle fingerprints.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Whether this minifier leaves content untouched.
    ///
    /// Files added with `add_minified*` fall back to the built-in minifier
    /// when the bundle's minifier is the identity.
    fn is_identity(&self) -> bool {
        false
    }
}

/// Identity transform.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMinifier;

impl Minifier for NullMinifier {
    fn minify(&self, content: &str) -> String {
        content.to_string()
    }

    fn is_identity(&self) -> bool {
        true
    }
}

/// Minifier selection in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinifierKind {
    #[serde(alias = "null")]
    None,
    Lightningcss,
    Oxc,
}

impl MinifierKind {
    /// Whether this minifier understands the given bundle extension.
    pub const fn supports(self, extension: &str) -> bool {
        match self {
            Self::None => true,
            Self::Lightningcss => matches!(extension.as_bytes(), b"css"),
            Self::Oxc => matches!(extension.as_bytes(), b"js"),
        }
    }

    pub fn build(self) -> Arc<dyn Minifier> {
        match self {
            Self::None => Arc::new(NullMinifier),
            Self::Lightningcss => Arc::new(CssMinifier),
            Self::Oxc => Arc::new(JsMinifier),
        }
    }
}
