//! Memoized file hashes for referenced assets (images, fonts).

use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::Hasher;
use crate::utils::path::normalize_path;

/// Thread-safe cache of file content hashes, keyed by canonical path.
///
/// An entry is reused only while the file's mtime is unchanged.
pub struct FileHashCache {
    hashes: DashMap<PathBuf, (Option<SystemTime>, String)>,
}

impl FileHashCache {
    pub fn new() -> Self {
        Self {
            hashes: DashMap::new(),
        }
    }

    /// Hash of the file at `path`, or `None` if it cannot be read.
    pub fn get_or_compute(&self, path: &Path, hasher: &dyn Hasher) -> Option<String> {
        let canonical = normalize_path(path);
        let mtime = canonical.metadata().and_then(|m| m.modified()).ok();

        if let Some(entry) = self.hashes.get(&canonical)
            && entry.0 == mtime
        {
            return Some(entry.1.clone());
        }

        let bytes = std::fs::read(&canonical).ok()?;
        let hash = hasher.hash(&bytes);
        self.hashes.insert(canonical, (mtime, hash.clone()));
        Some(hash)
    }

    pub fn clear(&self) {
        self.hashes.clear();
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

impl Default for FileHashCache {
    fn default() -> Self {
        Self::new()
    }
}
