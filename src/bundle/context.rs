//! The shared bundling context.
//!
//! A [`Bundler`] owns every service and cache bundles render against. Build
//! one at startup and hand out references; bundles never touch globals.
//!
//! ```ignore
//! let bundler = Bundler::builder().root("public").debug(false).build()?;
//! let tag = bundler
//!     .css()
//!     .add("/css/reset.css")
//!     .add("/css/site.css")
//!     .render("/css/site_#.css")?;
//! ```

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use super::render::Renderer;
use super::{Bundle, BundleKind, BundleState, Css, JavaScript};
use crate::cache::{CacheEntry, CacheKey, ContentCache, RegistryEntry, RegistryStore};
use crate::error::{BundleError, Result};
use crate::hash::{DigestHasher, FileHashCache, HashAlgorithm, Hasher};
use crate::host::{DebugStatus, PathTranslator, RootPathTranslator, StaticDebugStatus};
use crate::lock::CriticalSection;
use crate::minify::{CssMinifier, JsMinifier, Minifier};
use crate::preprocess::{Preprocessor, PreprocessorSet};
use crate::resolve::{
    EmbeddedResolver, HttpResolver, ResourceProvider, Resolver, Resolvers, StaticResources,
    TempStore,
};
use crate::writer::{FileWriter, ReleaseWriter};

/// Default query-string key for revision hashes.
pub const DEFAULT_HASH_KEY: &str = "r";

/// Defaults applied to bundles that do not override them.
pub struct Settings {
    pub hash_key: String,
    pub base_href: Option<String>,
    pub css_minifier: Arc<dyn Minifier>,
    pub js_minifier: Arc<dyn Minifier>,
}

impl Settings {
    pub fn default_minifier(&self, kind: BundleKind) -> Arc<dyn Minifier> {
        match kind {
            BundleKind::Css => Arc::clone(&self.css_minifier),
            BundleKind::JavaScript => Arc::clone(&self.js_minifier),
        }
    }

    /// Minifier for forced-minify files when the default is the identity.
    pub fn builtin_minifier(&self, kind: BundleKind) -> Arc<dyn Minifier> {
        match kind {
            BundleKind::Css => Arc::new(CssMinifier),
            BundleKind::JavaScript => Arc::new(JsMinifier),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hash_key: DEFAULT_HASH_KEY.to_string(),
            base_href: None,
            css_minifier: Arc::new(CssMinifier),
            js_minifier: Arc::new(JsMinifier),
        }
    }
}

/// Where a registered preprocessor applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreprocessorScope {
    Global,
    Css,
    #[serde(rename = "js", alias = "javascript")]
    JavaScript,
}

/// Preprocessors registered on the bundler, by scope.
#[derive(Debug, Default)]
pub struct RegisteredPreprocessors {
    pub global: PreprocessorSet,
    pub css: PreprocessorSet,
    pub javascript: PreprocessorSet,
}

impl RegisteredPreprocessors {
    pub fn for_kind(&self, kind: BundleKind) -> &PreprocessorSet {
        match kind {
            BundleKind::Css => &self.css,
            BundleKind::JavaScript => &self.javascript,
        }
    }

    fn scope_mut(&mut self, scope: PreprocessorScope) -> &mut PreprocessorSet {
        match scope {
            PreprocessorScope::Global => &mut self.global,
            PreprocessorScope::Css => &mut self.css,
            PreprocessorScope::JavaScript => &mut self.javascript,
        }
    }
}

// ============================================================================
// Bundler
// ============================================================================

/// Services, registries and caches shared by every bundle.
pub struct Bundler {
    pub(crate) settings: Settings,
    pub(crate) debug_status: Arc<dyn DebugStatus>,
    pub(crate) translator: Arc<dyn PathTranslator>,
    pub(crate) writer: Arc<dyn ReleaseWriter>,
    pub(crate) hasher: Arc<dyn Hasher>,
    pub(crate) resolvers: Resolvers,
    pub(crate) preprocessors: RwLock<RegisteredPreprocessors>,
    pub(crate) cache: ContentCache,
    pub(crate) registry: RegistryStore,
    pub(crate) file_hashes: FileHashCache,
    pub(crate) section: CriticalSection,
}

impl Bundler {
    pub fn builder() -> BundlerBuilder {
        BundlerBuilder::default()
    }

    /// Start a CSS bundle.
    pub fn css(&self) -> Bundle<'_, Css> {
        Bundle::new(self)
    }

    /// Start a JavaScript bundle.
    pub fn javascript(&self) -> Bundle<'_, JavaScript> {
        Bundle::new(self)
    }

    pub fn is_debugging(&self) -> bool {
        self.debug_status.is_debugging()
    }

    pub fn translator(&self) -> &dyn PathTranslator {
        self.translator.as_ref()
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    pub fn registry(&self) -> &RegistryStore {
        &self.registry
    }

    /// Register a preprocessor for every later render.
    ///
    /// A second preprocessor with the same name in one scope is rejected.
    pub fn register_preprocessor(
        &self,
        scope: PreprocessorScope,
        preprocessor: Arc<dyn Preprocessor>,
    ) -> Result<()> {
        self.preprocessors
            .write()
            .scope_mut(scope)
            .register(preprocessor)
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    pub(crate) fn render_state(&self, state: &BundleState, output: &str) -> Result<String> {
        let renderer = Renderer::new(self, state);
        if renderer.is_debugging() {
            return renderer.render_debug();
        }
        let key = CacheKey::output(output, &state.fingerprint(), false);
        Ok(renderer.render_release(output, &key, true)?.tag)
    }

    /// Render now and register the bundle under `name`.
    pub(crate) fn as_named(&self, state: &BundleState, name: &str, output: &str) -> Result<String> {
        let renderer = Renderer::new(self, state);
        let debug = renderer.is_debugging();
        self.cache.invalidate(&CacheKey::named(name, debug).identity);

        let tag = if debug {
            renderer.render_debug()?
        } else {
            renderer
                .render_release(output, &CacheKey::named(name, false), true)?
                .tag
        };
        self.registry.register_named(
            name,
            RegistryEntry {
                debug,
                output: output.to_string(),
                state: state.clone(),
            },
        );
        Ok(tag)
    }

    /// Render without writing a file and register content and tag under `name`.
    pub(crate) fn as_cached(&self, state: &BundleState, name: &str, output: &str) -> Result<String> {
        let debug = Renderer::new(self, state).is_debugging();
        self.cache.invalidate(&CacheKey::cached(name, debug).identity);

        let entry = self.cached_entry(state, name, output, debug)?;
        self.registry.register_cached(
            name,
            RegistryEntry {
                debug,
                output: output.to_string(),
                state: state.clone(),
            },
        );
        Ok(entry.tag)
    }

    fn cached_entry(
        &self,
        state: &BundleState,
        name: &str,
        output: &str,
        debug: bool,
    ) -> Result<CacheEntry> {
        let renderer = Renderer::new(self, state);
        let key = CacheKey::cached(name, debug);
        if !debug {
            return renderer.render_release(output, &key, false);
        }
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }
        let entry = renderer.render_debug_cached(output)?;
        self.cache.insert(key, entry.clone());
        Ok(entry)
    }

    /// Tag of a bundle registered with `as_named`.
    ///
    /// Uses the mode captured at registration, not the current one.
    pub fn render_named(&self, name: &str) -> Result<String> {
        let entry = self.registry.named(name)?;
        let renderer = Renderer::new(self, &entry.state);
        if entry.debug {
            return renderer.render_debug();
        }
        Ok(renderer
            .render_release(&entry.output, &CacheKey::named(name, false), true)?
            .tag)
    }

    /// Content of a bundle registered with `as_cached`.
    pub fn render_cached(&self, name: &str) -> Result<String> {
        let entry = self.registry.cached(name)?;
        Ok(self
            .cached_entry(&entry.state, name, &entry.output, entry.debug)?
            .content)
    }

    /// Tag of a bundle registered with `as_cached`.
    pub fn render_cached_asset_tag(&self, name: &str) -> Result<String> {
        let entry = self.registry.cached(name)?;
        Ok(self
            .cached_entry(&entry.state, name, &entry.output, entry.debug)?
            .tag)
    }

    /// Drop cached renders for `name`; the registration itself stays.
    pub fn invalidate(&self, name: &str) {
        self.cache.invalidate(&CacheKey::named(name, false).identity);
        self.cache.invalidate(&CacheKey::cached(name, false).identity);
    }

    /// Drop every cached render and file hash.
    pub fn clear_cache(&self) {
        self.cache.clear();
        self.file_hashes.clear();
    }

    /// Names registered with `as_named`, sorted.
    pub fn named_bundles(&self) -> Vec<String> {
        self.registry.named_names()
    }

    /// Unregister `name` and drop its cached renders.
    ///
    /// Returns whether a registration existed.
    pub fn forget(&self, name: &str) -> bool {
        self.invalidate(name);
        self.registry.remove(name)
    }

    /// Unregister every bundle and drop all cached state.
    pub fn reset(&self) {
        self.registry.clear();
        self.clear_cache();
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Configures a [`Bundler`].
pub struct BundlerBuilder {
    settings: Settings,
    debug_status: Option<Arc<dyn DebugStatus>>,
    translator: Option<Arc<dyn PathTranslator>>,
    writer: Option<Arc<dyn ReleaseWriter>>,
    hasher: Option<Arc<dyn Hasher>>,
    resources: Option<Arc<dyn ResourceProvider>>,
    remote: Option<Arc<dyn Resolver>>,
    preprocessors: Vec<(PreprocessorScope, Arc<dyn Preprocessor>)>,
    cross_process_locking: bool,
    lock_dir: Option<PathBuf>,
}

impl Default for BundlerBuilder {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            debug_status: None,
            translator: None,
            writer: None,
            hasher: None,
            resources: None,
            remote: None,
            preprocessors: Vec::new(),
            cross_process_locking: true,
            lock_dir: None,
        }
    }
}

impl BundlerBuilder {
    /// Fixed debug status.
    pub fn debug(self, debugging: bool) -> Self {
        self.debug_status(Arc::new(StaticDebugStatus::new(debugging)))
    }

    pub fn debug_status(mut self, status: Arc<dyn DebugStatus>) -> Self {
        self.debug_status = Some(status);
        self
    }

    /// Serve virtual paths from `root`.
    pub fn root(self, root: impl Into<PathBuf>) -> Self {
        self.translator(Arc::new(RootPathTranslator::new(root)))
    }

    pub fn translator(mut self, translator: Arc<dyn PathTranslator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn writer(mut self, writer: Arc<dyn ReleaseWriter>) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn hasher(mut self, hasher: Arc<dyn Hasher>) -> Self {
        self.hasher = Some(hasher);
        self
    }

    pub fn hash_algorithm(self, algorithm: HashAlgorithm) -> Self {
        self.hasher(Arc::new(DigestHasher::new(algorithm)))
    }

    pub fn hash_key(mut self, key: impl Into<String>) -> Self {
        self.settings.hash_key = key.into();
        self
    }

    pub fn base_href(mut self, href: impl Into<String>) -> Self {
        let href = href.into();
        self.settings.base_href = (!href.is_empty()).then_some(href);
        self
    }

    pub fn css_minifier(mut self, minifier: Arc<dyn Minifier>) -> Self {
        self.settings.css_minifier = minifier;
        self
    }

    pub fn js_minifier(mut self, minifier: Arc<dyn Minifier>) -> Self {
        self.settings.js_minifier = minifier;
        self
    }

    pub fn resources(mut self, resources: Arc<dyn ResourceProvider>) -> Self {
        self.resources = Some(resources);
        self
    }

    /// Replace the HTTP resolver used for downloaded remote assets.
    pub fn remote_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.remote = Some(resolver);
        self
    }

    pub fn preprocessor(mut self, scope: PreprocessorScope, preprocessor: Arc<dyn Preprocessor>) -> Self {
        self.preprocessors.push((scope, preprocessor));
        self
    }

    /// Whether renders also lock across processes (default on).
    pub fn cross_process_locking(mut self, enabled: bool) -> Self {
        self.cross_process_locking = enabled;
        self
    }

    /// Directory for cross-process lock files (default `<temp>/stitch-locks`).
    pub fn lock_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.lock_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> Result<Bundler> {
        let mut registered = RegisteredPreprocessors::default();
        for (scope, preprocessor) in self.preprocessors {
            registered.scope_mut(scope).register(preprocessor)?;
        }

        let store = Arc::new(TempStore::new()?);
        let remote: Arc<dyn Resolver> = match self.remote {
            Some(remote) => remote,
            None => Arc::new(HttpResolver::new(Arc::clone(&store))?),
        };
        let resources = self
            .resources
            .unwrap_or_else(|| Arc::new(StaticResources::new()));
        let embedded = EmbeddedResolver::new(resources, store);

        let translator = match self.translator {
            Some(translator) => translator,
            None => {
                let cwd = std::env::current_dir()
                    .map_err(|e| BundleError::io(".", e))?;
                Arc::new(RootPathTranslator::new(cwd))
            }
        };

        let section = match (self.cross_process_locking, self.lock_dir) {
            (true, Some(dir)) => CriticalSection::with_lock_dir(dir),
            (enabled, _) => CriticalSection::new(enabled),
        };

        Ok(Bundler {
            settings: self.settings,
            debug_status: self
                .debug_status
                .unwrap_or_else(|| Arc::new(StaticDebugStatus::new(false))),
            translator,
            writer: self.writer.unwrap_or_else(|| Arc::new(FileWriter)),
            hasher: self
                .hasher
                .unwrap_or_else(|| Arc::new(DigestHasher::new(HashAlgorithm::default()))),
            resolvers: Resolvers::new(remote, embedded),
            preprocessors: RwLock::new(registered),
            cache: ContentCache::new(),
            registry: RegistryStore::new(),
            file_hashes: FileHashCache::new(),
            section,
        })
    }
}
