//! Preprocessor registry and suffix-chain dispatch.
//!
//! A file's suffix tags are the dot segments after its base name, without the
//! bundle's own extension: `site.theme.less.css` in a CSS bundle has tags
//! `theme`, `less`.
//!
//! # Dispatch order
//!
//! Tags are evaluated right to left (the segment nearest the extension
//! describes the current format). For each tag, scopes are searched in order
//! (bundle instance, asset type, global) and within a scope the first
//! registered preprocessor that claims the tag wins. The chain stops at the
//! first tag nobody claims.

mod command;

pub use command::CommandPreprocessor;

use std::path::Path;
use std::sync::Arc;

use crate::error::{BundleError, Result};

/// Source-to-source transform selected by filename suffix tag.
pub trait Preprocessor: Send + Sync {
    /// Suffix tags this preprocessor handles (without dots).
    fn extensions(&self) -> Vec<String>;

    /// Identity used to reject duplicate registration.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn matches(&self, tag: &str) -> bool {
        self.extensions()
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(tag))
    }

    fn process(&self, path: &Path, content: &str) -> Result<String>;
}

// ============================================================================
// Preprocessor Set
// ============================================================================

/// Ordered set of preprocessors for one scope.
#[derive(Clone, Default)]
pub struct PreprocessorSet {
    entries: Vec<Arc<dyn Preprocessor>>,
}

impl PreprocessorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a preprocessor, rejecting a second one with the same name.
    pub fn register(&mut self, preprocessor: Arc<dyn Preprocessor>) -> Result<()> {
        if self.contains(preprocessor.name()) {
            return Err(BundleError::InvalidConfiguration(format!(
                "preprocessor `{}` is already registered",
                preprocessor.name()
            )));
        }
        self.entries.push(preprocessor);
        Ok(())
    }

    /// Register or replace a preprocessor with the same name.
    pub fn upsert(&mut self, preprocessor: Arc<dyn Preprocessor>) {
        match self
            .entries
            .iter_mut()
            .find(|p| p.name() == preprocessor.name())
        {
            Some(slot) => *slot = preprocessor,
            None => self.entries.push(preprocessor),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|p| p.name() == name)
    }

    pub fn find(&self, tag: &str) -> Option<&Arc<dyn Preprocessor>> {
        self.entries.iter().find(|p| p.matches(tag))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Preprocessor>> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl std::fmt::Debug for PreprocessorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|p| p.name()))
            .finish()
    }
}

// ============================================================================
// Chain Resolution
// ============================================================================

/// Suffix tags of `file_name`, right to left, excluding `own_ext`.
pub fn suffix_tags(file_name: &str, own_ext: &str) -> Vec<String> {
    let mut segments: Vec<&str> = file_name.split('.').skip(1).collect();
    if segments
        .last()
        .is_some_and(|last| last.eq_ignore_ascii_case(own_ext))
    {
        segments.pop();
    }
    segments
        .into_iter()
        .rev()
        .filter(|s| !s.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

/// Preprocessors to apply to `file_name`, in application order.
pub fn resolve_chain(
    file_name: &str,
    own_ext: &str,
    scopes: &[&PreprocessorSet],
) -> Vec<Arc<dyn Preprocessor>> {
    let mut chain = Vec::new();
    for tag in suffix_tags(file_name, own_ext) {
        let Some(found) = scopes.iter().find_map(|scope| scope.find(&tag)) else {
            break;
        };
        chain.push(Arc::clone(found));
    }
    chain
}

/// Run `content` through `chain`.
pub fn apply_chain(
    chain: &[Arc<dyn Preprocessor>],
    path: &Path,
    content: String,
) -> Result<String> {
    chain
        .iter()
        .try_fold(content, |acc, preprocessor| preprocessor.process(path, &acc))
}
