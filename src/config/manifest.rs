//! `[[bundle]]` declarations.
//!
//! Each entry turns into a fluent [`Bundle`] registered under its name, so
//! templates and the CLI can render it with [`Bundler::render_named`].
//!
//! ```toml
//! [[bundle]]
//! name = "site"
//! kind = "css"
//! output = "/css/site.#.css"
//! process_imports = true
//! attributes = { media = "screen" }
//! assets = [
//!     "/css/reset.css",
//!     { directory = "/css/components", recursive = true },
//!     { file = "/vendor/normalize.css", minified = true },
//!     { local = "/vendor/jquery.js", url = "https://code.jquery.com/jquery.js" },
//! ]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::bundle::{AssetType, Bundle, BundleKind, Bundler};
use crate::error::Result;

/// Debug/release override for one bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeOverride {
    Debug,
    Release,
}

/// One `[[bundle]]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleConfig {
    pub name: String,
    pub kind: BundleKind,
    /// Virtual output path; `#` is replaced by the content hash.
    pub output: String,
    pub assets: Vec<AssetConfig>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub mode: Option<ModeOverride>,
    #[serde(default)]
    pub base_href: Option<String>,
    #[serde(default)]
    pub hash_key: Option<String>,
    #[serde(default = "default_true")]
    pub revision_hash: bool,
    #[serde(default)]
    pub typeless: bool,
    #[serde(default)]
    pub only_if_missing: bool,
    /// CSS only.
    #[serde(default)]
    pub process_imports: bool,
    /// CSS only.
    #[serde(default)]
    pub append_hash_for_assets: bool,
    /// JavaScript only.
    #[serde(default)]
    pub defer: bool,
}

const fn default_true() -> bool {
    true
}

/// A bundle source: a bare path or a table naming exactly one source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetConfig {
    Path(String),
    Entry(AssetEntry),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetEntry {
    pub file: Option<String>,
    pub directory: Option<String>,
    pub recursive: bool,
    /// Remote URL. Bundled when `local` is unset.
    pub url: Option<String>,
    /// Local copy referenced in debug mode.
    pub local: Option<String>,
    /// Inline content.
    pub content: Option<String>,
    /// Extension hint for inline content.
    pub extension: Option<String>,
    /// Path produced by the host at request time.
    pub dynamic: Option<String>,
    pub minified: bool,
}

impl AssetEntry {
    /// Number of source fields set; a valid entry has exactly one.
    fn source_count(&self) -> usize {
        [
            self.file.is_some(),
            self.directory.is_some(),
            self.url.is_some(),
            self.content.is_some(),
            self.dynamic.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }
}

impl BundleConfig {
    /// Problems with this declaration, one message each.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let name = &self.name;

        if name.trim().is_empty() {
            problems.push("bundle with empty name".to_string());
        }
        if self.output.trim().is_empty() {
            problems.push(format!("bundle `{name}` has an empty output path"));
        }
        if self.assets.is_empty() {
            problems.push(format!("bundle `{name}` has no assets"));
        }
        if self.kind == BundleKind::JavaScript && (self.process_imports || self.append_hash_for_assets)
        {
            problems.push(format!(
                "bundle `{name}`: process_imports and append_hash_for_assets apply to css only"
            ));
        }
        if self.kind == BundleKind::Css && self.defer {
            problems.push(format!("bundle `{name}`: defer applies to js only"));
        }

        for (index, asset) in self.assets.iter().enumerate() {
            let AssetConfig::Entry(entry) = asset else {
                continue;
            };
            match entry.source_count() {
                1 => {}
                0 => problems.push(format!("bundle `{name}` asset #{index} names no source")),
                _ => problems.push(format!(
                    "bundle `{name}` asset #{index} names more than one source"
                )),
            }
            if entry.recursive && entry.directory.is_none() {
                problems.push(format!(
                    "bundle `{name}` asset #{index}: recursive applies to directories only"
                ));
            }
            if entry.local.is_some() && entry.url.is_none() {
                problems.push(format!("bundle `{name}` asset #{index}: local requires url"));
            }
            if entry.extension.is_some() && entry.content.is_none() {
                problems.push(format!(
                    "bundle `{name}` asset #{index}: extension applies to content only"
                ));
            }
        }

        problems
    }

    /// Build the bundle and register it under its name. Returns the tags.
    pub fn register(&self, bundler: &Bundler) -> Result<String> {
        match self.kind {
            BundleKind::Css => {
                let mut bundle = self.configure(bundler.css());
                if self.process_imports {
                    bundle = bundle.process_imports();
                }
                if self.append_hash_for_assets {
                    bundle = bundle.append_hash_for_assets();
                }
                bundle.as_named(&self.name, &self.output)
            }
            BundleKind::JavaScript => {
                let mut bundle = self.configure(bundler.javascript());
                if self.defer {
                    bundle = bundle.with_deferred_load();
                }
                bundle.as_named(&self.name, &self.output)
            }
        }
    }

    fn configure<'b, K: AssetType>(&self, mut bundle: Bundle<'b, K>) -> Bundle<'b, K> {
        for asset in &self.assets {
            bundle = match asset {
                AssetConfig::Path(path) => bundle.add(path.as_str()),
                AssetConfig::Entry(entry) => add_entry(bundle, entry),
            };
        }

        for (key, value) in &self.attributes {
            bundle = bundle.with_attribute(key.as_str(), value.as_str());
        }
        if let Some(href) = &self.base_href {
            bundle = bundle.with_output_base_href(href.as_str());
        }
        if let Some(key) = &self.hash_key {
            bundle = bundle.with_hash_key(key.as_str());
        }
        if !self.revision_hash {
            bundle = bundle.without_revision_hash();
        }
        if self.typeless {
            bundle = bundle.without_type_attribute();
        }
        if self.only_if_missing {
            bundle = bundle.render_only_if_output_file_missing();
        }

        match self.mode {
            Some(ModeOverride::Debug) => bundle.force_debug(),
            Some(ModeOverride::Release) => bundle.force_release(),
            None => bundle,
        }
    }
}

fn add_entry<'b, K: AssetType>(bundle: Bundle<'b, K>, entry: &AssetEntry) -> Bundle<'b, K> {
    let minified = entry.minified;

    if let Some(file) = &entry.file {
        return if minified {
            bundle.add_minified(file.as_str())
        } else {
            bundle.add(file.as_str())
        };
    }
    if let Some(dir) = &entry.directory {
        return if minified {
            bundle.add_minified_directory(dir.as_str(), entry.recursive)
        } else {
            bundle.add_directory(dir.as_str(), entry.recursive)
        };
    }
    if let Some(url) = &entry.url {
        return match &entry.local {
            Some(local) => bundle.add_remote(local.as_str(), url.as_str()),
            None => bundle.add_remote_bundled(url.as_str()),
        };
    }
    if let Some(content) = &entry.content {
        return match (&entry.extension, minified) {
            (Some(ext), _) => bundle.add_string_with_ext(content.as_str(), ext),
            (None, true) => bundle.add_minified_string(content.as_str()),
            (None, false) => bundle.add_string(content.as_str()),
        };
    }
    match &entry.dynamic {
        Some(path) => bundle.add_dynamic(path.as_str()),
        None => bundle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> BundleConfig {
        toml::from_str(content).unwrap()
    }

    #[test]
    fn test_parse_mixed_assets() {
        let config = parse(
            r#"
            name = "site"
            kind = "css"
            output = "/css/site.#.css"
            assets = [
                "/css/a.css",
                { directory = "/css/parts", recursive = true },
                { local = "/vendor/x.css", url = "https://cdn.example.com/x.css" },
                { content = "a{}", extension = "scss" },
            ]
            "#,
        );
        assert_eq!(config.assets.len(), 4);
        assert!(matches!(&config.assets[0], AssetConfig::Path(p) if p == "/css/a.css"));
        assert!(config.revision_hash);
        assert!(config.problems().is_empty(), "{:?}", config.problems());
    }

    #[test]
    fn test_js_kind_aliases() {
        let config = parse(
            r#"
            name = "app"
            kind = "js"
            output = "/js/app.js"
            assets = ["/js/app.js"]
            defer = true
            "#,
        );
        assert_eq!(config.kind, BundleKind::JavaScript);
        assert!(config.problems().is_empty());
    }

    #[test]
    fn test_problems() {
        let config = parse(
            r#"
            name = "bad"
            kind = "js"
            output = ""
            process_imports = true
            assets = [
                { file = "/a.js", url = "https://x/a.js" },
                { recursive = true },
                { local = "/a.js" },
            ]
            "#,
        );
        let problems = config.problems();
        assert!(problems.iter().any(|p| p.contains("empty output")));
        assert!(problems.iter().any(|p| p.contains("css only")));
        assert!(problems.iter().any(|p| p.contains("more than one source")));
        assert!(problems.iter().any(|p| p.contains("names no source")));
        assert!(problems.iter().any(|p| p.contains("directories only")));
        assert!(problems.iter().any(|p| p.contains("local requires url")));
    }
}
