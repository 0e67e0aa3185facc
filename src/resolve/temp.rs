//! Process-lifetime temp storage for materialized sources.

use dashmap::DashMap;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::error::{BundleError, Result};
use crate::hash::fingerprint;
use crate::utils::io;

/// Materializes content under a private temp directory, once per key.
///
/// The directory is removed when the store is dropped.
pub struct TempStore {
    dir: TempDir,
    files: DashMap<String, PathBuf>,
}

impl TempStore {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("stitch-")
            .tempdir()
            .map_err(|e| BundleError::io(std::env::temp_dir(), e))?;
        Ok(Self {
            dir,
            files: DashMap::new(),
        })
    }

    /// Path previously materialized for `key`, if any.
    pub fn get(&self, key: &str) -> Option<PathBuf> {
        self.files.get(key).map(|p| p.clone())
    }

    /// Return the file for `key`, calling `fetch` only on first use.
    ///
    /// `extension` is kept on the temp file so suffix dispatch still works.
    pub fn get_or_materialize(
        &self,
        key: &str,
        extension: &str,
        fetch: impl FnOnce() -> Result<Vec<u8>>,
    ) -> Result<PathBuf> {
        if let Some(path) = self.get(key) {
            return Ok(path);
        }
        let bytes = fetch()?;
        let name = if extension.is_empty() {
            fingerprint(key)
        } else {
            format!("{}.{}", fingerprint(key), extension)
        };
        let path = self.dir.path().join(name);
        io::write(&path, &bytes)?;
        // Racing materializers wrote identical bytes; keep the first entry
        let path = self.files.entry(key.to_string()).or_insert(path).clone();
        Ok(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_materialize_once() {
        let store = TempStore::new().unwrap();
        let calls = Cell::new(0);
        let fetch = || {
            calls.set(calls.get() + 1);
            Ok(b"a{}".to_vec())
        };

        let first = store.get_or_materialize("https://x/a.css", "css", fetch).unwrap();
        let second = store
            .get_or_materialize("https://x/a.css", "css", || {
                calls.set(calls.get() + 1);
                Ok(Vec::new())
            })
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);
        assert_eq!(std::fs::read_to_string(&first).unwrap(), "a{}");
        assert_eq!(first.extension().unwrap(), "css");
    }

    #[test]
    fn test_failed_fetch_is_not_memoized() {
        let store = TempStore::new().unwrap();
        let result = store.get_or_materialize("k", "js", || {
            Err(BundleError::Remote {
                url: "k".into(),
                detail: "offline".into(),
            })
        });
        assert!(result.is_err());
        assert!(store.is_empty());
    }
}
