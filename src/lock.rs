//! Per-output-path critical section.
//!
//! Renders targeting the same output file are serialized, in this process
//! through a mutex per key and across processes through an exclusive lock
//! on `<temp>/stitch-locks/<key>.lock`. Renders of different outputs never
//! block each other.
//!
//! The key is the blake3 digest of the normalized, lowercased absolute path,
//! so `./css/../css/Site.css` and `css/site.css` share one lock.

use dashmap::DashMap;
use fs2::FileExt;
use parking_lot::{ArcMutexGuard, Mutex, RawMutex};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::debug;
use crate::error::{BundleError, Result};
use crate::utils::path::normalize_path;

const LOCK_DIR: &str = "stitch-locks";

/// Serializes work per output file.
pub struct CriticalSection {
    locks: DashMap<String, Arc<Mutex<()>>>,
    /// `None` disables the cross-process lock file.
    lock_dir: Option<PathBuf>,
}

impl CriticalSection {
    pub fn new(cross_process: bool) -> Self {
        Self {
            locks: DashMap::new(),
            lock_dir: cross_process.then(|| std::env::temp_dir().join(LOCK_DIR)),
        }
    }

    /// Lock files are placed in `dir` instead of the system temp dir.
    pub fn with_lock_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            locks: DashMap::new(),
            lock_dir: Some(dir.into()),
        }
    }

    pub fn is_cross_process(&self) -> bool {
        self.lock_dir.is_some()
    }

    /// Block until `output` is free, returning a guard that holds it.
    pub fn enter(&self, output: &Path) -> Result<SectionGuard> {
        let key = lock_key(output);
        let mutex = Arc::clone(self.locks.entry(key.clone()).or_default().value());
        let local = mutex.lock_arc();

        let file = match &self.lock_dir {
            Some(dir) => Some(acquire_file_lock(dir, &key)?),
            None => None,
        };
        debug!("lock"; "entered {}", output.display());
        Ok(SectionGuard {
            file,
            _local: local,
        })
    }
}

/// Held for the duration of one write + cache-populate phase.
pub struct SectionGuard {
    file: Option<File>,
    _local: ArcMutexGuard<RawMutex, ()>,
}

impl Drop for SectionGuard {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            let _ = FileExt::unlock(file);
        }
    }
}

fn acquire_file_lock(dir: &Path, key: &str) -> Result<File> {
    std::fs::create_dir_all(dir).map_err(|e| BundleError::io(dir, e))?;
    let path = dir.join(format!("{key}.lock"));
    let file = File::create(&path).map_err(|e| BundleError::io(&path, e))?;
    file.lock_exclusive()
        .map_err(|e| BundleError::io(&path, e))?;
    Ok(file)
}

/// Stable lock name for an output path.
pub fn lock_key(output: &Path) -> String {
    let normalized = normalize_path(output)
        .to_string_lossy()
        .replace('\\', "/")
        .to_lowercase();
    blake3::hash(normalized.as_bytes()).to_hex().to_string()
}
