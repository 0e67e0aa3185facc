//! Directory resolution.
//!
//! Files are listed by jwalk with sorting enabled, which is the enumerator's
//! natural order; the bundler never re-sorts them afterwards.

use jwalk::WalkDir;
use std::path::{Path, PathBuf};

use super::{ExtensionFilter, ResolveContext, ResolvedFile, Resolver};
use crate::asset::Asset;
use crate::error::{BundleError, Result};
use crate::utils::io;

/// Expands a directory asset into its matching files.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryResolver;

impl DirectoryResolver {
    /// Matching files under `dir`, in enumeration order.
    pub fn files(dir: &Path, recursive: bool, filter: &ExtensionFilter) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(BundleError::MissingSource {
                path: dir.to_path_buf(),
            });
        }
        let depth = if recursive { usize::MAX } else { 1 };
        let files = WalkDir::new(dir)
            .sort(true)
            .max_depth(depth)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.path())
            .filter(|path| filter.accepts(path))
            .collect();
        Ok(files)
    }

    /// `dir` and, when `recursive`, every directory below it.
    ///
    /// Adding or removing a file bumps its parent's mtime, so these are the
    /// paths whose change means the listing from [`Self::files`] is stale.
    pub fn directories(dir: &Path, recursive: bool) -> Vec<PathBuf> {
        if !recursive {
            return vec![dir.to_path_buf()];
        }
        WalkDir::new(dir)
            .sort(true)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_dir())
            .map(|entry| entry.path())
            .collect()
    }
}

impl Resolver for DirectoryResolver {
    fn resolve(&self, asset: &Asset, ctx: &ResolveContext<'_>) -> Result<Vec<ResolvedFile>> {
        let dir = ctx.translator.to_file_system_path(&asset.source);
        Self::files(&dir, asset.recursive, ctx.filter)?
            .into_iter()
            .map(|path| {
                let content = io::read_to_string(&path)?;
                Ok(ResolvedFile { path, content })
            })
            .collect()
    }
}
