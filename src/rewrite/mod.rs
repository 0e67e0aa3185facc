//! CSS path rewriting.
//!
//! Aggregated CSS is served from the output file's directory, not from each
//! source's own directory, so relative `url()` references are re-based:
//!
//! - [`RelativePathAdapter`] does the directory math
//! - [`CssRewriter`] finds and rewrites `url()` references
//! - [`ImportInliner`] replaces local `@import` rules with file content

mod css_url;
mod imports;
mod relative;

pub use css_url::{AssetHashing, CssRewriter, absolutize_remote};
pub use imports::ImportInliner;
pub use relative::RelativePathAdapter;

use std::path::PathBuf;

/// A piece of CSS on its way into the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Raw text still to be rewritten relative to `source`.
    Pending { css: String, source: PathBuf },
    /// Text already rewritten for the output location.
    Rewritten(String),
}
