//! Bundle builders and rendering.
//!
//! # Module Structure
//!
//! ```text
//! bundle/
//! ├── context.rs  # Bundler, BundlerBuilder, settings
//! ├── state.rs    # BundleState, DebugOverride, fingerprint
//! ├── render.rs   # Debug and release pipelines
//! ├── tags.rs     # <link>/<script>/<style> formatting
//! └── mod.rs      # Bundle<K> fluent builder (this file)
//! ```
//!
//! A [`Bundle`] only records assets and options. Terminal calls (`render`,
//! `as_named`, `as_cached`) hand the recorded state to the [`Bundler`].

mod context;
mod render;
mod state;
mod tags;

#[cfg(test)]
mod tests;

pub use context::{
    Bundler, BundlerBuilder, DEFAULT_HASH_KEY, PreprocessorScope, RegisteredPreprocessors,
    Settings,
};
pub use state::{BundleKind, BundleState, DebugOverride, DebugPredicate};
pub use tags::{TagStyle, apply_base_href};

use std::marker::PhantomData;
use std::sync::Arc;

use crate::asset::Asset;
use crate::error::Result;
use crate::minify::Minifier;
use crate::preprocess::Preprocessor;

/// Marker for the bundle output type.
pub trait AssetType: private::Sealed {
    const KIND: BundleKind;
}

/// Stylesheet bundles.
#[derive(Debug, Clone, Copy)]
pub struct Css;

/// Script bundles.
#[derive(Debug, Clone, Copy)]
pub struct JavaScript;

impl AssetType for Css {
    const KIND: BundleKind = BundleKind::Css;
}

impl AssetType for JavaScript {
    const KIND: BundleKind = BundleKind::JavaScript;
}

mod private {
    pub trait Sealed {}
    impl Sealed for super::Css {}
    impl Sealed for super::JavaScript {}
}

/// Fluent bundle definition bound to a [`Bundler`].
#[derive(Clone)]
pub struct Bundle<'b, K: AssetType> {
    bundler: &'b Bundler,
    state: BundleState,
    _kind: PhantomData<K>,
}

impl<'b, K: AssetType> Bundle<'b, K> {
    pub(crate) fn new(bundler: &'b Bundler) -> Self {
        Self {
            bundler,
            state: BundleState::new(K::KIND),
            _kind: PhantomData,
        }
    }

    pub fn state(&self) -> &BundleState {
        &self.state
    }

    pub fn into_state(self) -> BundleState {
        self.state
    }

    fn push(mut self, asset: Asset) -> Self {
        self.state.assets.push(asset);
        self
    }

    // ========================================================================
    // Assets
    // ========================================================================

    /// Add a file by virtual path.
    pub fn add(self, path: impl Into<String>) -> Self {
        self.push(Asset::file(path))
    }

    /// Add a file that is always minified in release.
    pub fn add_minified(self, path: impl Into<String>) -> Self {
        self.push(Asset::file(path).minified())
    }

    /// Add inline content of this bundle's type.
    pub fn add_string(self, content: impl Into<String>) -> Self {
        self.push(Asset::string(content, None))
    }

    /// Add inline content with an extension hint for preprocessor dispatch.
    pub fn add_string_with_ext(self, content: impl Into<String>, extension: &str) -> Self {
        self.push(Asset::string(content, Some(extension.to_string())))
    }

    pub fn add_minified_string(self, content: impl Into<String>) -> Self {
        self.push(Asset::string(content, None).minified())
    }

    /// Reference `local_path` in debug and `url` in release, never bundled.
    pub fn add_remote(self, local_path: impl Into<String>, url: impl Into<String>) -> Self {
        self.push(Asset::remote(local_path, url))
    }

    /// Download `url` and bundle its content.
    pub fn add_remote_bundled(self, url: impl Into<String>) -> Self {
        self.push(Asset::remote_bundled(url))
    }

    pub fn add_directory(self, path: impl Into<String>, recursive: bool) -> Self {
        self.push(Asset::directory(path, recursive))
    }

    pub fn add_minified_directory(self, path: impl Into<String>, recursive: bool) -> Self {
        self.push(Asset::directory(path, recursive).minified())
    }

    /// Add a resource from the bundler's provider, served at `virtual_path`.
    pub fn add_embedded_resource(
        self,
        virtual_path: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        self.push(Asset::embedded(virtual_path, resource_id))
    }

    /// Reference a path produced at request time, never bundled.
    pub fn add_dynamic(self, path: impl Into<String>) -> Self {
        self.push(Asset::dynamic(path))
    }

    // ========================================================================
    // Options
    // ========================================================================

    /// Set an HTML attribute on every emitted tag.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.state.attributes.set(key, value);
        self
    }

    pub fn with_minifier<M: Minifier + 'static>(mut self, minifier: M) -> Self {
        self.state.minifier = Some(Arc::new(minifier));
        self
    }

    /// Add an instance-scoped preprocessor, replacing one with the same name.
    pub fn with_preprocessor<P: Preprocessor + 'static>(mut self, preprocessor: P) -> Self {
        self.state.preprocessors.upsert(Arc::new(preprocessor));
        self
    }

    /// Prefix web paths (never file paths) with `href`.
    pub fn with_output_base_href(mut self, href: impl Into<String>) -> Self {
        self.state.base_href = Some(href.into());
        self
    }

    pub fn without_revision_hash(mut self) -> Self {
        self.state.revision_hash = false;
        self
    }

    pub fn with_hash_key(mut self, key: impl Into<String>) -> Self {
        self.state.hash_key = Some(key.into());
        self
    }

    pub fn without_type_attribute(mut self) -> Self {
        self.state.typeless = true;
        self
    }

    /// Keep an existing output file instead of rewriting it.
    pub fn render_only_if_output_file_missing(mut self) -> Self {
        self.state.render_only_if_missing = true;
        self
    }

    pub fn force_debug(mut self) -> Self {
        self.state.debug = DebugOverride::Debug;
        self
    }

    pub fn force_release(mut self) -> Self {
        self.state.debug = DebugOverride::Release;
        self
    }

    /// Decide debug mode per render by calling `predicate`.
    pub fn force_debug_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.state.debug = DebugOverride::When(Arc::new(predicate));
        self
    }

    // ========================================================================
    // Terminal calls
    // ========================================================================

    /// Render to `output` (a virtual path, `#` is replaced by the hash).
    pub fn render(&self, output: &str) -> Result<String> {
        self.bundler.render_state(&self.state, output)
    }

    /// Render now and register under `name` for [`Bundler::render_named`].
    pub fn as_named(&self, name: &str, output: &str) -> Result<String> {
        self.bundler.as_named(&self.state, name, output)
    }

    /// Render without writing and register under `name` for
    /// [`Bundler::render_cached`].
    pub fn as_cached(&self, name: &str, output: &str) -> Result<String> {
        self.bundler.as_cached(&self.state, name, output)
    }

    pub fn render_named(&self, name: &str) -> Result<String> {
        self.bundler.render_named(name)
    }

    pub fn render_cached(&self, name: &str) -> Result<String> {
        self.bundler.render_cached(name)
    }

    pub fn render_cached_asset_tag(&self, name: &str) -> Result<String> {
        self.bundler.render_cached_asset_tag(name)
    }

    pub fn clear_cache(&self) {
        self.bundler.clear_cache();
    }
}

impl Bundle<'_, Css> {
    pub fn with_media(self, media: impl Into<String>) -> Self {
        self.with_attribute("media", media)
    }

    /// Inline local `@import` rules.
    pub fn process_imports(mut self) -> Self {
        self.state.process_imports = true;
        self
    }

    /// Append `?r=<hash>` to `url()` references of existing files.
    pub fn append_hash_for_assets(mut self) -> Self {
        self.state.append_hash_for_assets = true;
        self
    }
}

impl Bundle<'_, JavaScript> {
    pub fn with_deferred_load(mut self) -> Self {
        self.state.defer = true;
        self
    }
}
