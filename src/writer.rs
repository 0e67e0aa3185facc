//! Persistence of release bundles.

use std::path::Path;

use crate::debug;
use crate::error::Result;
use crate::utils::io;

/// Destination for rendered release output.
///
/// The default writes to local disk; hosts can redirect output elsewhere
/// (a CDN push, an in-memory store for tests).
pub trait ReleaseWriter: Send + Sync {
    fn write(&self, path: &Path, content: &str) -> Result<()>;

    /// Whether `path` already holds output.
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    /// Previously written output, for `render_only_if_output_file_missing`.
    fn read(&self, path: &Path) -> Result<String> {
        io::read_to_string(path)
    }
}

/// Writes bundles to the local filesystem, creating parent directories.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileWriter;

impl ReleaseWriter for FileWriter {
    fn write(&self, path: &Path, content: &str) -> Result<()> {
        debug!("write"; "{}", path.display());
        io::write(path, content.as_bytes())
    }
}
