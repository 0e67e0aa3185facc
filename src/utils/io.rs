//! File IO with bounded retry.
//!
//! Source files may be locked briefly by editors or other workers writing the
//! same bundle. Reads and writes are retried a fixed number of times with a
//! linearly increasing delay before the error is surfaced.

use std::fs;
use std::io;
use std::path::Path;
use std::thread;
use std::time::Duration;

use crate::debug;
use crate::error::{BundleError, Result};

/// Attempts before giving up.
pub const MAX_ATTEMPTS: u32 = 5;

/// Base delay, multiplied by the attempt number.
const BACKOFF_STEP: Duration = Duration::from_millis(25);

/// Run `op` until it succeeds or [`MAX_ATTEMPTS`] is reached.
///
/// `NotFound` is not retried unless `on_not_found` returns `true` (the caller
/// fixed the cause, e.g. by creating the parent directory).
pub fn with_retry<T>(
    path: &Path,
    mut op: impl FnMut() -> io::Result<T>,
    mut on_not_found: impl FnMut() -> bool,
) -> Result<T> {
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= MAX_ATTEMPTS => return Err(BundleError::io(path, e)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if !on_not_found() {
                    return Err(BundleError::io(path, e));
                }
            }
            Err(e) => {
                debug!("io"; "retry {} on {}: {}", attempt, path.display(), e);
                thread::sleep(BACKOFF_STEP * attempt);
            }
        }
        attempt += 1;
    }
}

/// Read a UTF-8 file, retrying transient failures.
pub fn read_to_string(path: &Path) -> Result<String> {
    with_retry(path, || fs::read_to_string(path), || false)
}

/// Read raw bytes, retrying transient failures.
pub fn read(path: &Path) -> Result<Vec<u8>> {
    with_retry(path, || fs::read(path), || false)
}

/// Write a file, creating missing parent directories on demand.
///
/// Directory creation is attempted once per retry cycle.
pub fn write(path: &Path, content: &[u8]) -> Result<()> {
    with_retry(
        path,
        || fs::write(path, content),
        || {
            path.parent()
                .is_some_and(|parent| fs::create_dir_all(parent).is_ok())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/out.css");
        write(&path, b"a{}").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a{}");
    }

    #[test]
    fn test_read_missing_file_fails_fast() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.css");
        let err = read_to_string(&path).unwrap_err();
        assert!(err.to_string().contains("missing.css"));
    }

    #[test]
    fn test_transient_errors_are_retried() {
        let calls = Cell::new(0);
        let result = with_retry(
            Path::new("locked.css"),
            || {
                calls.set(calls.get() + 1);
                if calls.get() < 3 {
                    Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked"))
                } else {
                    Ok(42)
                }
            },
            || false,
        );
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_retry_is_bounded() {
        let calls = Cell::new(0);
        let result: Result<()> = with_retry(
            Path::new("locked.css"),
            || {
                calls.set(calls.get() + 1);
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked"))
            },
            || false,
        );
        assert!(result.is_err());
        assert_eq!(calls.get(), MAX_ATTEMPTS);
    }
}
