//! Declarative description of one bundle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::asset::{Asset, Attributes};
use crate::host::DebugStatus;
use crate::minify::Minifier;
use crate::preprocess::PreprocessorSet;

/// Output type of a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleKind {
    Css,
    #[serde(rename = "js", alias = "javascript")]
    JavaScript,
}

impl BundleKind {
    /// File extension of rendered output.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::JavaScript => "js",
        }
    }
}

/// Deferred debug decision, evaluated at every render.
pub type DebugPredicate = Arc<dyn Fn() -> bool + Send + Sync>;

/// Per-bundle override of the host's debug status.
#[derive(Clone, Default)]
pub enum DebugOverride {
    #[default]
    Inherit,
    Debug,
    Release,
    When(DebugPredicate),
}

impl DebugOverride {
    pub fn is_debugging(&self, oracle: &dyn DebugStatus) -> bool {
        match self {
            Self::Inherit => oracle.is_debugging(),
            Self::Debug => true,
            Self::Release => false,
            Self::When(predicate) => predicate(),
        }
    }

    const fn tag(&self) -> &'static str {
        match self {
            Self::Inherit => "inherit",
            Self::Debug => "debug",
            Self::Release => "release",
            Self::When(_) => "when",
        }
    }
}

impl fmt::Debug for DebugOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Assets and options accumulated by a builder chain.
///
/// Nothing here performs I/O; all work happens at render time.
#[derive(Clone)]
pub struct BundleState {
    pub kind: BundleKind,
    /// Declaration order is concatenation order.
    pub assets: Vec<Asset>,
    pub attributes: Attributes,
    pub debug: DebugOverride,
    /// `None` uses the bundler's default for this kind.
    pub minifier: Option<Arc<dyn Minifier>>,
    /// `None` uses the bundler's default key.
    pub hash_key: Option<String>,
    /// `None` uses the bundler's default base href.
    pub base_href: Option<String>,
    pub typeless: bool,
    pub revision_hash: bool,
    pub render_only_if_missing: bool,
    /// Instance-scoped preprocessors, tried before registered ones.
    pub preprocessors: PreprocessorSet,
    pub process_imports: bool,
    pub append_hash_for_assets: bool,
    pub defer: bool,
}

impl BundleState {
    pub fn new(kind: BundleKind) -> Self {
        Self {
            kind,
            assets: Vec::new(),
            attributes: Attributes::new(),
            debug: DebugOverride::Inherit,
            minifier: None,
            hash_key: None,
            base_href: None,
            typeless: false,
            revision_hash: true,
            render_only_if_missing: false,
            preprocessors: PreprocessorSet::new(),
            process_imports: false,
            append_hash_for_assets: false,
            defer: false,
        }
    }

    /// Digest over every asset and option that can change rendered output.
    ///
    /// The `force_debug_if` predicate itself is not part of it; the mode it
    /// selects is part of the cache key instead.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.kind.extension().as_bytes());
        for asset in &self.assets {
            hasher.update(b"\x01");
            asset.fingerprint_into(&mut hasher);
        }
        for (key, value) in self.attributes.iter() {
            hasher.update(b"\x02");
            hasher.update(key.as_bytes());
            hasher.update(b"=");
            hasher.update(value.as_bytes());
        }

        let options = [
            self.debug.tag(),
            self.minifier.as_ref().map_or("", |m| m.name()),
            self.hash_key.as_deref().unwrap_or("\0"),
            self.base_href.as_deref().unwrap_or("\0"),
            flag(self.typeless),
            flag(self.revision_hash),
            flag(self.render_only_if_missing),
            flag(self.process_imports),
            flag(self.append_hash_for_assets),
            flag(self.defer),
        ];
        for option in options {
            hasher.update(b"\x03");
            hasher.update(&(option.len() as u64).to_le_bytes());
            hasher.update(option.as_bytes());
        }
        for preprocessor in self.preprocessors.iter() {
            hasher.update(b"\x04");
            hasher.update(preprocessor.name().as_bytes());
        }

        hasher.finalize().to_hex()[..16].to_string()
    }
}

const fn flag(on: bool) -> &'static str {
    if on { "1" } else { "0" }
}

impl fmt::Debug for BundleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundleState")
            .field("kind", &self.kind)
            .field("assets", &self.assets.len())
            .field("debug", &self.debug)
            .field("preprocessors", &self.preprocessors)
            .finish_non_exhaustive()
    }
}
