//! Content resolvers: turn a declared [`Asset`] into concrete files.
//!
//! | Kind               | Resolver            | Content source                  |
//! |--------------------|---------------------|---------------------------------|
//! | `File`             | [`FileResolver`]    | translated virtual path         |
//! | `Directory`        | [`DirectoryResolver`] | jwalk enumeration (sorted)    |
//! | `Remote` (bundled) | [`HttpResolver`]    | download, memoized temp file    |
//! | `EmbeddedResource` | [`EmbeddedResolver`] | resource provider, temp file   |
//!
//! Inline strings and pass-through assets (dynamic, non-bundled remote) never
//! reach a resolver.

mod directory;
mod embedded;
mod file;
mod remote;
mod temp;

pub use directory::DirectoryResolver;
pub use embedded::{EmbeddedResolver, ResourceProvider, StaticResources};
pub use file::FileResolver;
pub use remote::HttpResolver;
pub use temp::TempStore;

use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::asset::{Asset, AssetKind};
use crate::error::{BundleError, Result};
use crate::host::PathTranslator;

/// One concrete source file with its raw content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    /// Logical location of the content (drives URL rewriting and dedup).
    pub path: PathBuf,
    pub content: String,
}

/// Resolves one asset kind to its files.
pub trait Resolver: Send + Sync {
    fn resolve(&self, asset: &Asset, ctx: &ResolveContext<'_>) -> Result<Vec<ResolvedFile>>;
}

/// Per-render inputs shared by all resolvers.
pub struct ResolveContext<'a> {
    pub translator: &'a dyn PathTranslator,
    pub filter: &'a ExtensionFilter,
}

// ============================================================================
// Extension Filter
// ============================================================================

/// Decides which files a directory asset contributes.
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    own: String,
    allowed: FxHashSet<String>,
}

impl ExtensionFilter {
    /// Accept the bundle's own extension plus `extra` (preprocessor tags).
    pub fn new(own: &str, extra: impl IntoIterator<Item = String>) -> Self {
        let own = own.to_ascii_lowercase();
        let mut allowed: FxHashSet<String> =
            extra.into_iter().map(|e| e.to_ascii_lowercase()).collect();
        allowed.insert(own.clone());
        Self { own, allowed }
    }

    pub fn own_extension(&self) -> &str {
        &self.own
    }

    /// Whether `path` belongs in the bundle.
    ///
    /// Debug artifacts written next to preprocessed sources
    /// (`site.less.debug.css`) are never picked up again.
    pub fn accepts(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(&format!(".debug.{}", self.own)) {
            return false;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.allowed.contains(&ext.to_ascii_lowercase()))
    }
}

/// Name of the debug artifact written for a preprocessed source.
pub fn debug_artifact_path(source: &Path, own_ext: &str) -> PathBuf {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    source.with_file_name(format!("{name}.debug.{own_ext}"))
}

// ============================================================================
// Resolver Set
// ============================================================================

/// Every resolver the renderer dispatches to.
pub struct Resolvers {
    pub file: FileResolver,
    pub directory: DirectoryResolver,
    pub remote: Arc<dyn Resolver>,
    pub embedded: EmbeddedResolver,
}

impl Resolvers {
    pub fn new(remote: Arc<dyn Resolver>, embedded: EmbeddedResolver) -> Self {
        Self {
            file: FileResolver,
            directory: DirectoryResolver,
            remote,
            embedded,
        }
    }

    /// Resolve any bundled asset kind.
    pub fn resolve(&self, asset: &Asset, ctx: &ResolveContext<'_>) -> Result<Vec<ResolvedFile>> {
        match asset.kind {
            AssetKind::File => self.file.resolve(asset, ctx),
            AssetKind::Directory => self.directory.resolve(asset, ctx),
            AssetKind::Remote => self.remote.resolve(asset, ctx),
            AssetKind::EmbeddedResource => self.embedded.resolve(asset, ctx),
            AssetKind::ArbitraryString | AssetKind::Dynamic => {
                Err(BundleError::InvalidConfiguration(format!(
                    "{} assets are not resolved from storage",
                    asset.kind.as_str()
                )))
            }
        }
    }
}
