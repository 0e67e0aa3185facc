//! Embedded resources compiled into the host binary.
//!
//! ```ignore
//! let resources = StaticResources::new()
//!     .with("widgets/grid.css", include_bytes!("../assets/grid.css"));
//! ```

use rustc_hash::FxHashMap;
use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;

use super::{ResolveContext, ResolvedFile, Resolver, TempStore};
use crate::asset::Asset;
use crate::error::{BundleError, Result};
use crate::utils::io;

/// Source of embedded resource bytes.
pub trait ResourceProvider: Send + Sync {
    fn get(&self, id: &str) -> Option<Cow<'static, [u8]>>;
}

/// Resources registered from `include_bytes!` / `include_str!`.
#[derive(Debug, Clone, Default)]
pub struct StaticResources {
    entries: FxHashMap<String, &'static [u8]>,
}

impl StaticResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: impl Into<String>, bytes: &'static [u8]) -> Self {
        self.insert(id, bytes);
        self
    }

    pub fn insert(&mut self, id: impl Into<String>, bytes: &'static [u8]) {
        self.entries.insert(id.into(), bytes);
    }
}

impl ResourceProvider for StaticResources {
    fn get(&self, id: &str) -> Option<Cow<'static, [u8]>> {
        self.entries.get(id).map(|bytes| Cow::Borrowed(*bytes))
    }
}

/// Resolves embedded resources through a temp copy.
///
/// The resolved path is the asset's translated virtual path, so relative
/// references inside the resource resolve as if it were served from there.
pub struct EmbeddedResolver {
    provider: Arc<dyn ResourceProvider>,
    store: Arc<TempStore>,
}

impl EmbeddedResolver {
    pub fn new(provider: Arc<dyn ResourceProvider>, store: Arc<TempStore>) -> Self {
        Self { provider, store }
    }

    fn bytes(&self, asset: &Asset) -> Result<Cow<'static, [u8]>> {
        let id = asset.resource_id.as_deref().unwrap_or(&asset.source);
        self.provider
            .get(id)
            .ok_or_else(|| BundleError::MissingSource { path: id.into() })
    }

    /// Write the resource to `target` unless a file is already there.
    ///
    /// Used in debug mode so the per-file tag points at something servable.
    pub fn materialize_at(&self, asset: &Asset, target: &Path) -> Result<()> {
        if target.exists() {
            return Ok(());
        }
        let bytes = self.bytes(asset)?;
        io::write(target, &bytes)
    }
}

impl Resolver for EmbeddedResolver {
    fn resolve(&self, asset: &Asset, ctx: &ResolveContext<'_>) -> Result<Vec<ResolvedFile>> {
        let id = asset.resource_id.as_deref().unwrap_or(&asset.source);
        let key = format!("embedded:{id}");
        let temp = self
            .store
            .get_or_materialize(&key, ctx.filter.own_extension(), || {
                self.bytes(asset).map(Cow::into_owned)
            })?;
        let content = io::read_to_string(&temp)?;
        Ok(vec![ResolvedFile {
            path: ctx.translator.to_file_system_path(&asset.source),
            content,
        }])
    }
}
