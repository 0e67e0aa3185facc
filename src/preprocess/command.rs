//! Preprocessor backed by an external compiler (sass, lessc, coffee, ...).
//!
//! Source content is piped to the command's stdin and the compiled output is
//! read from stdout.
//!
//! # Example
//!
//! ```ignore
//! let sass = CommandPreprocessor::new("sass", ["scss", "sass"], ["sass", "--stdin"]);
//! let less = CommandPreprocessor::new("less", ["less"], ["lessc", "-", "--include-path=$DIR"]);
//! ```
//!
//! `$INPUT` and `$DIR` in arguments expand to the source file path and its
//! directory.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use super::Preprocessor;
use crate::debug;
use crate::error::{BundleError, Result};

/// Preprocessor that runs an external command.
#[derive(Debug, Clone)]
pub struct CommandPreprocessor {
    name: String,
    extensions: Vec<String>,
    command: Vec<String>,
}

impl CommandPreprocessor {
    pub fn new<E, C>(
        name: impl Into<String>,
        extensions: impl IntoIterator<Item = E>,
        command: impl IntoIterator<Item = C>,
    ) -> Self
    where
        E: Into<String>,
        C: Into<String>,
    {
        Self {
            name: name.into(),
            extensions: extensions
                .into_iter()
                .map(|e| {
                    let ext: String = e.into();
                    ext.trim_start_matches('.').to_ascii_lowercase()
                })
                .collect(),
            command: command.into_iter().map(Into::into).collect(),
        }
    }

    /// Check that the executable is installed.
    ///
    /// Fails with `UnsupportedPlatform` so hosts can degrade gracefully.
    pub fn ensure_available(&self) -> Result<()> {
        let program = self.program()?;
        which::which(program).map_err(|e| BundleError::UnsupportedPlatform {
            feature: program.to_string(),
            detail: e.to_string(),
        })?;
        Ok(())
    }

    fn program(&self) -> Result<&str> {
        self.command.first().map(String::as_str).ok_or_else(|| {
            BundleError::InvalidConfiguration(format!(
                "preprocessor `{}` has an empty command",
                self.name
            ))
        })
    }

    /// Expand `$INPUT` / `$DIR` in the command arguments.
    fn resolve_args(&self, path: &Path) -> Vec<String> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        self.command
            .iter()
            .skip(1)
            .map(|arg| {
                arg.replace("$INPUT", &path.display().to_string())
                    .replace("$DIR", &dir.display().to_string())
            })
            .collect()
    }
}

impl Preprocessor for CommandPreprocessor {
    fn extensions(&self) -> Vec<String> {
        self.extensions.clone()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, path: &Path, content: &str) -> Result<String> {
        self.ensure_available()?;
        let program = self.program()?;
        let args = self.resolve_args(path);
        debug!("preprocess"; "{} {} < {}", program, args.join(" "), path.display());

        let mut cmd = Command::new(program);
        cmd.args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = path.parent().filter(|d| d.is_dir()) {
            cmd.current_dir(dir);
        }

        let preprocess_err = |detail: String| BundleError::Preprocess {
            path: path.to_path_buf(),
            detail,
        };

        let mut child = cmd.spawn().map_err(|e| preprocess_err(e.to_string()))?;
        let stdin = child.stdin.take();

        // Feed stdin from a separate thread so a chatty compiler cannot fill
        // its stdout pipe while we are still writing.
        let output = std::thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(content.as_bytes()),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked")));
            written.and(output)
        })
        .map_err(|e| preprocess_err(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(preprocess_err(format!(
                "`{}` exited with {}: {}",
                program,
                output.status,
                stderr.trim()
            )));
        }
        String::from_utf8(output.stdout).map_err(|e| preprocess_err(e.to_string()))
    }
}
