//! `@import` inlining.
//!
//! Imported stylesheets are read, their own imports inlined, and their
//! `url()` references rewritten relative to the imported file. The host
//! file's remaining text is returned as [`Fragment::Pending`] so the caller
//! rewrites it relative to the host file exactly once.

use regex::{Captures, Regex};
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use super::{CssRewriter, Fragment};
use crate::error::{BundleError, Result};
use crate::host::PathTranslator;
use crate::utils::io;
use crate::utils::path::{is_external_link, lexical_normalize, split_suffix};

static RE_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)@import\s+(?:url\(\s*(?:"([^"]*)"|'([^']*)'|([^)"']*?))\s*\)|"([^"]*)"|'([^']*)')\s*([^;{}]*?)\s*;"#,
    )
    .expect("static @import pattern")
});

/// Inlines local `@import` rules.
pub struct ImportInliner<'a> {
    translator: &'a dyn PathTranslator,
    rewriter: &'a CssRewriter<'a>,
}

impl<'a> ImportInliner<'a> {
    pub fn new(translator: &'a dyn PathTranslator, rewriter: &'a CssRewriter<'a>) -> Self {
        Self {
            translator,
            rewriter,
        }
    }

    /// Split `css` (read from `source`) into host text and inlined imports.
    ///
    /// Every inlined file is added to `dependencies`.
    pub fn inline(
        &self,
        css: &str,
        source: &Path,
        dependencies: &mut FxHashSet<PathBuf>,
    ) -> Result<Vec<Fragment>> {
        let mut visiting = vec![lexical_normalize(source)];
        self.inline_inner(css, source, dependencies, &mut visiting)
    }

    fn inline_inner(
        &self,
        css: &str,
        source: &Path,
        dependencies: &mut FxHashSet<PathBuf>,
        visiting: &mut Vec<PathBuf>,
    ) -> Result<Vec<Fragment>> {
        let mut fragments = Vec::new();
        let mut last = 0;

        for caps in RE_IMPORT.captures_iter(css) {
            let Some(target) = self.import_target(&caps, source) else {
                continue;
            };
            if visiting.contains(&target) {
                continue;
            }
            let Some(whole) = caps.get(0) else {
                continue;
            };

            if !target.is_file() {
                return Err(BundleError::MissingSource { path: target });
            }
            let imported = io::read_to_string(&target)?;
            dependencies.insert(target.clone());

            visiting.push(target.clone());
            let nested = self.inline_inner(&imported, &target, dependencies, visiting);
            visiting.pop();
            let body = self.finish(nested?);

            push_pending(&mut fragments, &css[last..whole.start()], source);
            let media = caps.get(6).map_or("", |m| m.as_str().trim());
            fragments.push(Fragment::Rewritten(if media.is_empty() {
                body
            } else {
                format!("@media {media}{{{body}}}")
            }));
            last = whole.end();
        }

        push_pending(&mut fragments, &css[last..], source);
        Ok(fragments)
    }

    /// Filesystem path of a local import, `None` for external ones.
    fn import_target(&self, caps: &Captures<'_>, source: &Path) -> Option<PathBuf> {
        let url = (1..=5).find_map(|i| caps.get(i))?.as_str().trim();
        if url.is_empty() || is_external_link(url) {
            return None;
        }
        let (path, _) = split_suffix(url);
        if path.starts_with('/') {
            return Some(self.translator.to_file_system_path(path));
        }
        let dir = source.parent().unwrap_or_else(|| Path::new(""));
        Some(lexical_normalize(&dir.join(path)))
    }

    /// Rewrite pending fragments and join everything into one string.
    pub fn finish(&self, fragments: Vec<Fragment>) -> String {
        fragments
            .into_iter()
            .map(|fragment| match fragment {
                Fragment::Pending { css, source } => self.rewriter.rewrite(&css, &source),
                Fragment::Rewritten(css) => css,
            })
            .collect()
    }
}

fn push_pending(fragments: &mut Vec<Fragment>, css: &str, source: &Path) {
    if !css.is_empty() {
        fragments.push(Fragment::Pending {
            css: css.to_string(),
            source: source.to_path_buf(),
        });
    }
}
