//! The render pipeline.
//!
//! # Debug
//!
//! One tag per source, in declaration order. Preprocessed sources are
//! compiled next to the original (`site.less` -> `site.less.debug.css`) and
//! the tag points at that artifact. Nothing is concatenated or minified.
//!
//! # Release
//!
//! ```text
//! cache hit? ── yes ──> tag
//!     │ no
//! enter critical section (output path)
//! cache hit? ── yes ──> tag
//!     │ no
//! resolve ─> preprocess ─> rewrite (css) ─> "\n"-join ─> minify
//!     ─> hash ─> write ─> tag ─> cache
//! ```
//!
//! Pass-through assets (dynamic, non-downloaded remote) are emitted as
//! their own tags before the bundle tag. A bundle without local content
//! writes no file and emits only those tags.

use parking_lot::RwLockReadGuard;
use rustc_hash::FxHashSet;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::context::RegisteredPreprocessors;
use super::tags::{TagStyle, apply_base_href};
use super::{BundleKind, BundleState, Bundler};
use crate::asset::{Asset, AssetKind, Attributes};
use crate::cache::{CacheEntry, CacheKey};
use crate::debug;
use crate::error::Result;
use crate::minify::Minifier;
use crate::preprocess::{PreprocessorSet, apply_chain, resolve_chain};
use crate::resolve::{
    DirectoryResolver, ExtensionFilter, ResolveContext, debug_artifact_path,
};
use crate::rewrite::{AssetHashing, CssRewriter, ImportInliner, absolutize_remote};
use crate::utils::io;
use crate::utils::path::lexical_normalize;
use crate::utils::path::route::{append_query, trim_virtual_root};

/// Stand-in for the hash when the output path is needed before hashing.
const HASH_PLACEHOLDER: &str = "[hash]";

/// Local content of a bundle, ready to hash.
#[derive(Debug, Default)]
struct Aggregate {
    content: String,
    has_local: bool,
    dependencies: FxHashSet<PathBuf>,
}

/// Renders one bundle state against a bundler's services.
pub(crate) struct Renderer<'a> {
    bundler: &'a Bundler,
    state: &'a BundleState,
}

impl<'a> Renderer<'a> {
    pub fn new(bundler: &'a Bundler, state: &'a BundleState) -> Self {
        Self { bundler, state }
    }

    pub fn is_debugging(&self) -> bool {
        self.state
            .debug
            .is_debugging(self.bundler.debug_status.as_ref())
    }

    // ========================================================================
    // Debug
    // ========================================================================

    /// One newline-terminated tag per source.
    pub fn render_debug(&self) -> Result<String> {
        let registered = self.bundler.preprocessors.read();
        let scopes = self.scopes(&registered);
        let filter = self.filter(&scopes);
        let translator = self.bundler.translator.as_ref();
        let style = self.style();

        let mut seen: FxHashSet<PathBuf> = FxHashSet::default();
        let mut seen_strings: FxHashSet<&str> = FxHashSet::default();
        let mut tags = String::new();

        for asset in &self.state.assets {
            match asset.kind {
                AssetKind::File => {
                    let path = translator.to_file_system_path(&asset.source);
                    if seen.insert(path.clone()) {
                        let web = trim_virtual_root(&asset.source);
                        tags += &self.debug_file_tag(asset, web, &path, &scopes)?;
                    }
                }
                AssetKind::Directory => {
                    let dir = translator.to_file_system_path(&asset.source);
                    if !dir.is_dir() {
                        debug!("render"; "{} does not exist, no tags emitted", dir.display());
                        continue;
                    }
                    for path in DirectoryResolver::files(&dir, asset.recursive, &filter)? {
                        if seen.insert(path.clone()) {
                            let web = translator.to_virtual_path(&path);
                            tags += &self.debug_file_tag(asset, &web, &path, &scopes)?;
                        }
                    }
                }
                AssetKind::EmbeddedResource => {
                    let target = translator.to_file_system_path(&asset.source);
                    if seen.insert(target.clone()) {
                        self.bundler.resolvers.embedded.materialize_at(asset, &target)?;
                        let web = trim_virtual_root(&asset.source);
                        tags += &style.reference(&self.attributes_for(asset), web);
                        tags.push('\n');
                    }
                }
                AssetKind::Remote | AssetKind::Dynamic => {
                    tags += &self.pass_through_tag(asset, true);
                    tags.push('\n');
                }
                AssetKind::ArbitraryString => {
                    if seen_strings.insert(asset.source.as_str()) {
                        let content = self.preprocess_string(asset, &scopes)?;
                        tags += &style.inline(&content);
                        tags.push('\n');
                    }
                }
            }
        }
        Ok(tags)
    }

    fn debug_file_tag(
        &self,
        asset: &Asset,
        web: &str,
        path: &Path,
        scopes: &[&PreprocessorSet],
    ) -> Result<String> {
        let own_ext = self.state.kind.extension();
        let file_name = file_name(path);
        let chain = resolve_chain(&file_name, own_ext, scopes);

        let web = if chain.is_empty() || !path.is_file() {
            Cow::Borrowed(web)
        } else {
            let content = io::read_to_string(path)?;
            let compiled = apply_chain(&chain, path, content)?;
            let artifact = debug_artifact_path(path, own_ext);
            io::write(&artifact, compiled.as_bytes())?;
            debug!("render"; "compiled {}", artifact.display());
            Cow::Owned(self.bundler.translator.to_virtual_path(&artifact))
        };

        let mut tag = self.style().reference(&self.attributes_for(asset), &web);
        tag.push('\n');
        Ok(tag)
    }

    // ========================================================================
    // Release
    // ========================================================================

    /// Render under `key`, consulting and populating the content cache.
    pub fn render_release(&self, output: &str, key: &CacheKey, write: bool) -> Result<CacheEntry> {
        let cache = &self.bundler.cache;
        if let Some(hit) = cache.get(key) {
            debug!("cache"; "hit {}", key.identity);
            return Ok(hit);
        }

        let lock_path = self.output_file(output, HASH_PLACEHOLDER);
        let _guard = self.bundler.section.enter(&lock_path)?;
        if let Some(hit) = cache.get(key) {
            return Ok(hit);
        }

        let entry = match self.existing_output(output)? {
            Some(entry) => entry,
            None => self.build_release(output, &lock_path, write)?,
        };
        cache.insert(key.clone(), entry.clone());
        Ok(entry)
    }

    /// Debug tags plus the unminified aggregate, for cached bundles.
    pub fn render_debug_cached(&self, output: &str) -> Result<CacheEntry> {
        let tags = self.render_debug()?;
        let aggregate = self.aggregate(&self.output_file(output, HASH_PLACEHOLDER), false)?;
        Ok(CacheEntry::new(
            tags,
            aggregate.content,
            aggregate.dependencies,
        ))
    }

    fn build_release(&self, output: &str, output_file: &Path, write: bool) -> Result<CacheEntry> {
        let aggregate = self.aggregate(output_file, true)?;
        let mut tags = self.pass_through_tags();

        if !aggregate.has_local {
            debug!("render"; "{} has no local content, no file written", output);
            return Ok(CacheEntry::new(
                tags.join("\n"),
                "",
                aggregate.dependencies,
            ));
        }

        let hash = self.bundler.hasher.hash(aggregate.content.as_bytes());
        let file = self.output_file(output, &hash);
        let keep_existing = self.state.render_only_if_missing && self.bundler.writer.exists(&file);
        if write && !keep_existing {
            self.bundler.writer.write(&file, &aggregate.content)?;
        }

        tags.push(self.release_tag(output, &hash));
        Ok(CacheEntry::new(
            tags.join("\n"),
            aggregate.content,
            aggregate.dependencies,
        ))
    }

    /// Short-circuit for `render_only_if_output_file_missing`.
    ///
    /// Only placeholder-free outputs can be found before hashing.
    fn existing_output(&self, output: &str) -> Result<Option<CacheEntry>> {
        if !self.state.render_only_if_missing || output.contains('#') {
            return Ok(None);
        }
        let file = self.output_file(output, "");
        if !self.bundler.writer.exists(&file) {
            return Ok(None);
        }

        let content = self.bundler.writer.read(&file)?;
        let hash = self.bundler.hasher.hash(content.as_bytes());
        debug!("render"; "{} exists, pipeline skipped", file.display());

        let mut tags = self.pass_through_tags();
        tags.push(self.release_tag(output, &hash));
        Ok(Some(CacheEntry::new(tags.join("\n"), content, [file])))
    }

    fn aggregate(&self, output_file: &Path, minify: bool) -> Result<Aggregate> {
        let registered = self.bundler.preprocessors.read();
        let scopes = self.scopes(&registered);
        let filter = self.filter(&scopes);
        let translator = self.bundler.translator.as_ref();
        let ctx = ResolveContext {
            translator,
            filter: &filter,
        };

        let hashing = self.state.append_hash_for_assets.then(|| AssetHashing {
            key: self.hash_key(),
            hasher: self.bundler.hasher.as_ref(),
            cache: &self.bundler.file_hashes,
            translator,
        });
        let rewriter = CssRewriter::new(output_file, hashing);
        let inliner = ImportInliner::new(translator, &rewriter);

        let mut aggregate = Aggregate::default();
        let mut seen: FxHashSet<PathBuf> = FxHashSet::default();
        let mut seen_strings: FxHashSet<&str> = FxHashSet::default();
        // (force_minify, text) runs of consecutive files
        let mut segments: Vec<(bool, String)> = Vec::new();

        for asset in &self.state.assets {
            if asset.is_pass_through() {
                continue;
            }

            let sources = if asset.kind == AssetKind::ArbitraryString {
                if !seen_strings.insert(asset.source.as_str()) {
                    continue;
                }
                let content = self.preprocess_string(asset, &scopes)?;
                vec![(output_file.to_path_buf(), content)]
            } else {
                if asset.kind == AssetKind::Directory {
                    let dir = translator.to_file_system_path(&asset.source);
                    aggregate
                        .dependencies
                        .extend(DirectoryResolver::directories(&dir, asset.recursive));
                }
                let mut sources = Vec::new();
                for file in self.bundler.resolvers.resolve(asset, &ctx)? {
                    if !seen.insert(lexical_normalize(&file.path)) {
                        continue;
                    }
                    if matches!(asset.kind, AssetKind::File | AssetKind::Directory) {
                        aggregate.dependencies.insert(file.path.clone());
                    }
                    let chain = resolve_chain(&file_name(&file.path), filter.own_extension(), &scopes);
                    let content = apply_chain(&chain, &file.path, file.content)?;
                    sources.push((file.path, content));
                }
                sources
            };

            for (path, content) in sources {
                let content = match self.state.kind {
                    // Downloaded CSS has no meaningful location on disk
                    BundleKind::Css if asset.kind == AssetKind::Remote => {
                        let url = asset.remote_url.as_deref().unwrap_or(&asset.source);
                        absolutize_remote(&content, url)
                    }
                    BundleKind::Css if self.state.process_imports => {
                        let fragments =
                            inliner.inline(&content, &path, &mut aggregate.dependencies)?;
                        inliner.finish(fragments)
                    }
                    BundleKind::Css => rewriter.rewrite(&content, &path),
                    BundleKind::JavaScript => content,
                };

                let same_run = segments
                    .last()
                    .is_some_and(|(force, _)| *force == asset.force_minify);
                if !same_run {
                    segments.push((asset.force_minify, String::new()));
                }
                if let Some((_, text)) = segments.last_mut() {
                    text.push_str(&content);
                    text.push('\n');
                }
                aggregate.has_local = true;
            }
        }

        let minifier = self.minifier();
        aggregate.content = segments
            .into_iter()
            .map(|(force, text)| {
                if !minify {
                    text
                } else if force && minifier.is_identity() {
                    self.builtin_minifier().minify(&text)
                } else {
                    minifier.minify(&text)
                }
            })
            .collect();
        Ok(aggregate)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn style(&self) -> TagStyle {
        TagStyle {
            kind: self.state.kind,
            typeless: self.state.typeless,
            defer: self.state.defer,
        }
    }

    fn hash_key(&self) -> &str {
        self.state
            .hash_key
            .as_deref()
            .unwrap_or(&self.bundler.settings.hash_key)
    }

    fn base_href(&self) -> Option<&str> {
        self.state
            .base_href
            .as_deref()
            .or(self.bundler.settings.base_href.as_deref())
    }

    fn minifier(&self) -> Arc<dyn Minifier> {
        match &self.state.minifier {
            Some(minifier) => Arc::clone(minifier),
            None => self.bundler.settings.default_minifier(self.state.kind),
        }
    }

    fn builtin_minifier(&self) -> Arc<dyn Minifier> {
        self.bundler.settings.builtin_minifier(self.state.kind)
    }

    /// Instance, then type, then global preprocessors.
    fn scopes<'s>(
        &'s self,
        registered: &'s RwLockReadGuard<'_, RegisteredPreprocessors>,
    ) -> [&'s PreprocessorSet; 3] {
        [
            &self.state.preprocessors,
            registered.for_kind(self.state.kind),
            &registered.global,
        ]
    }

    /// Own extension plus every tag an applicable preprocessor claims.
    fn filter(&self, scopes: &[&PreprocessorSet]) -> ExtensionFilter {
        let extra = scopes
            .iter()
            .flat_map(|scope| scope.iter())
            .flat_map(|p| p.extensions());
        ExtensionFilter::new(self.state.kind.extension(), extra)
    }

    /// Bundle attributes overlaid with the asset's own.
    fn attributes_for(&self, asset: &Asset) -> Cow<'_, Attributes> {
        if asset.attributes.is_empty() {
            return Cow::Borrowed(&self.state.attributes);
        }
        let mut merged = self.state.attributes.clone();
        for (key, value) in asset.attributes.iter() {
            merged.set(key, value);
        }
        Cow::Owned(merged)
    }

    fn pass_through_tag(&self, asset: &Asset, debug: bool) -> String {
        let path = trim_virtual_root(asset.pass_through_path(debug));
        let path = apply_base_href(self.base_href(), path);
        self.style().reference(&self.attributes_for(asset), &path)
    }

    fn pass_through_tags(&self) -> Vec<String> {
        self.state
            .assets
            .iter()
            .filter(|asset| asset.is_pass_through())
            .map(|asset| self.pass_through_tag(asset, false))
            .collect()
    }

    fn preprocess_string(&self, asset: &Asset, scopes: &[&PreprocessorSet]) -> Result<String> {
        let own_ext = self.state.kind.extension();
        let ext = asset.extension.as_deref().unwrap_or(own_ext);
        let name = format!("inline.{ext}");
        let chain = resolve_chain(&name, own_ext, scopes);
        apply_chain(&chain, Path::new(&name), asset.source.clone())
    }

    /// Filesystem location of `output` with `#` replaced by `hash`.
    fn output_file(&self, output: &str, hash: &str) -> PathBuf {
        self.bundler
            .translator
            .to_file_system_path(&output.replace('#', hash))
    }

    fn release_tag(&self, output: &str, hash: &str) -> String {
        let web = trim_virtual_root(output);
        let web = if web.contains('#') {
            web.replace('#', hash)
        } else if self.state.revision_hash {
            append_query(web, self.hash_key(), hash)
        } else {
            web.to_string()
        };
        let web = apply_base_href(self.base_href(), &web);
        self.style().reference(&self.state.attributes, &web)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
