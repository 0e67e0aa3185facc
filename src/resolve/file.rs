//! Single-file resolution.

use super::{ResolveContext, ResolvedFile, Resolver};
use crate::asset::Asset;
use crate::error::{BundleError, Result};
use crate::utils::io;

/// Reads one file addressed by virtual path.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileResolver;

impl Resolver for FileResolver {
    fn resolve(&self, asset: &Asset, ctx: &ResolveContext<'_>) -> Result<Vec<ResolvedFile>> {
        let path = ctx.translator.to_file_system_path(&asset.source);
        if !path.is_file() {
            return Err(BundleError::MissingSource { path });
        }
        let content = io::read_to_string(&path)?;
        Ok(vec![ResolvedFile { path, content }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::RootPathTranslator;
    use crate::resolve::ExtensionFilter;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_existing_file() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("css")).unwrap();
        fs::write(dir.path().join("css/a.css"), "a{}").unwrap();

        let translator = RootPathTranslator::new(dir.path());
        let filter = ExtensionFilter::new("css", []);
        let ctx = ResolveContext {
            translator: &translator,
            filter: &filter,
        };

        let files = FileResolver.resolve(&Asset::file("~/css/a.css"), &ctx).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].content, "a{}");
        assert_eq!(files[0].path, dir.path().join("css/a.css"));
    }

    #[test]
    fn test_missing_file_names_path() {
        let dir = TempDir::new().unwrap();
        let translator = RootPathTranslator::new(dir.path());
        let filter = ExtensionFilter::new("css", []);
        let ctx = ResolveContext {
            translator: &translator,
            filter: &filter,
        };

        let err = FileResolver
            .resolve(&Asset::file("/css/missing.css"), &ctx)
            .unwrap_err();
        assert!(matches!(err, BundleError::MissingSource { .. }));
        assert!(err.to_string().contains("missing.css"));
    }
}
