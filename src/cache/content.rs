//! Rendered-bundle cache with mtime-based invalidation.

use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::debug;

/// Identity of one rendered bundle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub identity: String,
    pub debug: bool,
}

impl CacheKey {
    /// Key for an anonymous bundle rendered to `output`.
    pub fn output(output: &str, fingerprint: &str, debug: bool) -> Self {
        Self {
            identity: format!("{output}#{fingerprint}"),
            debug,
        }
    }

    pub fn named(name: &str, debug: bool) -> Self {
        Self {
            identity: format!("named:{name}"),
            debug,
        }
    }

    pub fn cached(name: &str, debug: bool) -> Self {
        Self {
            identity: format!("cached:{name}"),
            debug,
        }
    }
}

/// Cached render result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// HTML emitted for the bundle.
    pub tag: String,
    /// Aggregated content before tag formatting.
    pub content: String,
    dependencies: Vec<(PathBuf, Option<SystemTime>)>,
}

impl CacheEntry {
    /// Snapshot the current mtime of every dependency.
    pub fn new(
        tag: impl Into<String>,
        content: impl Into<String>,
        dependencies: impl IntoIterator<Item = PathBuf>,
    ) -> Self {
        let mut dependencies: Vec<_> = dependencies
            .into_iter()
            .map(|path| {
                let mtime = mtime(&path);
                (path, mtime)
            })
            .collect();
        dependencies.sort();
        Self {
            tag: tag.into(),
            content: content.into(),
            dependencies,
        }
    }

    /// Whether no dependency changed (or disappeared) since the snapshot.
    pub fn is_fresh(&self) -> bool {
        self.dependencies
            .iter()
            .all(|(path, recorded)| mtime(path) == *recorded)
    }
}

fn mtime(path: &Path) -> Option<SystemTime> {
    path.metadata().and_then(|m| m.modified()).ok()
}

/// Thread-safe cache of rendered bundles.
///
/// A stale entry is evicted on access and reported as a miss.
#[derive(Debug, Default)]
pub struct ContentCache {
    entries: DashMap<CacheKey, CacheEntry>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let entry = self.entries.get(key)?.clone();
        if entry.is_fresh() {
            return Some(entry);
        }
        debug!("cache"; "stale entry for {}", key.identity);
        self.entries.remove(key);
        None
    }

    /// Store `entry`, replacing any previous entry for `key`.
    pub fn insert(&self, key: CacheKey, entry: CacheEntry) {
        self.entries.insert(key, entry);
    }

    /// Drop both debug and release entries for `identity`.
    pub fn invalidate(&self, identity: &str) {
        self.entries.retain(|key, _| key.identity != identity);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
