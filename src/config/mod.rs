//! Configuration management for `stitch.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section.rs   # [stitch], [css], [js], [[preprocessor]]
//! ├── manifest.rs  # [[bundle]] declarations
//! ├── error.rs     # ConfigError
//! └── util.rs      # find_config_file, resolve_path
//! ```
//!
//! # Example
//!
//! ```toml
//! [stitch]
//! root = "public"
//!
//! [css]
//! minifier = "lightningcss"
//!
//! [[bundle]]
//! name = "site"
//! kind = "css"
//! output = "/css/site.#.css"
//! assets = ["/css/reset.css", "/css/site.css"]
//! ```

mod error;
mod manifest;
mod section;
mod util;

pub use error::ConfigError;
pub use manifest::{AssetConfig, AssetEntry, BundleConfig, ModeOverride};
pub use section::{GeneralConfig, KindConfig, PreprocessorConfig};
pub use util::{find_config_file, resolve_path};

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::bundle::{BundleKind, Bundler, BundlerBuilder};
use crate::error::Result as BundleResult;
use crate::host::EnvDebugStatus;
use crate::log;
use crate::preprocess::CommandPreprocessor;

/// Default config file name.
pub const CONFIG_FILE: &str = "stitch.toml";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StitchConfig {
    /// Absolute path of the loaded config file.
    #[serde(skip)]
    pub config_path: PathBuf,

    pub stitch: GeneralConfig,
    pub css: KindConfig,
    pub js: KindConfig,

    #[serde(rename = "preprocessor")]
    pub preprocessors: Vec<PreprocessorConfig>,

    #[serde(rename = "bundle")]
    pub bundles: Vec<BundleConfig>,
}

impl StitchConfig {
    /// Parse config from TOML string without path resolution.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load, resolve and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (mut config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        config.config_path = crate::utils::path::normalize_path(path);
        config.finalize();
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {} are ignored: {}", display_path, fields.join(", "));
    }

    /// Directory containing the config file.
    pub fn config_dir(&self) -> &Path {
        self.config_path.parent().unwrap_or(Path::new("."))
    }

    /// Anchor relative paths at the config directory.
    fn finalize(&mut self) {
        let base = self.config_dir().to_path_buf();
        self.stitch.root = resolve_path(&self.stitch.root, &base);
        if let Some(dir) = self.stitch.lock_dir.take() {
            self.stitch.lock_dir = Some(resolve_path(&dir, &base));
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Check the configuration, reporting every problem at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        let key = &self.stitch.hash_key;
        if key.is_empty() || key.contains(['&', '=', '#', '?', ' ']) {
            problems.push(format!("[stitch] hash_key `{key}` is not a valid query key"));
        }

        for (section, kind, config) in [
            ("css", BundleKind::Css, &self.css),
            ("js", BundleKind::JavaScript, &self.js),
        ] {
            let minifier = config.minifier_for(kind);
            if !minifier.supports(kind.extension()) {
                problems.push(format!(
                    "[{section}] minifier `{minifier:?}` cannot minify {section}"
                ));
            }
        }

        let mut seen = FxHashSet::default();
        for preprocessor in &self.preprocessors {
            let name = &preprocessor.name;
            if name.trim().is_empty() {
                problems.push("preprocessor with empty name".to_string());
            }
            if preprocessor.extensions.is_empty() {
                problems.push(format!("preprocessor `{name}` claims no extensions"));
            }
            if preprocessor.command.is_empty() {
                problems.push(format!("preprocessor `{name}` has an empty command"));
            }
            if !seen.insert((preprocessor.scope, name.as_str())) {
                problems.push(format!(
                    "preprocessor `{name}` registered twice in scope {:?}",
                    preprocessor.scope
                ));
            }
        }

        let mut names = FxHashSet::default();
        for bundle in &self.bundles {
            if !names.insert(bundle.name.as_str()) {
                problems.push(format!("bundle `{}` declared twice", bundle.name));
            }
            problems.extend(bundle.problems());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(problems.join("\n")))
        }
    }

    // ========================================================================
    // bundler construction
    // ========================================================================

    /// Builder preloaded with this configuration.
    pub fn builder(&self) -> BundlerBuilder {
        let general = &self.stitch;
        let mut builder = Bundler::builder()
            .root(&general.root)
            .hash_algorithm(general.hash)
            .hash_key(general.hash_key.as_str())
            .css_minifier(self.css.minifier_for(BundleKind::Css).build())
            .js_minifier(self.js.minifier_for(BundleKind::JavaScript).build())
            .cross_process_locking(general.cross_process_locking);

        builder = match &general.debug_env {
            Some(var) => builder.debug_status(Arc::new(EnvDebugStatus::new(var.as_str()))),
            None => builder.debug(general.debug),
        };
        if let Some(href) = &general.base_href {
            builder = builder.base_href(href.as_str());
        }
        if let Some(dir) = &general.lock_dir {
            builder = builder.lock_dir(dir);
        }

        for preprocessor in &self.preprocessors {
            let command = CommandPreprocessor::new(
                preprocessor.name.as_str(),
                preprocessor.extensions.iter().map(String::as_str),
                preprocessor.command.iter().map(String::as_str),
            );
            builder = builder.preprocessor(preprocessor.scope, Arc::new(command));
        }

        builder
    }

    /// Build the bundler and register every declared bundle.
    pub fn bundler(&self) -> BundleResult<Bundler> {
        let bundler = self.builder().build()?;
        for bundle in &self.bundles {
            bundle.register(&bundler)?;
        }
        Ok(bundler)
    }

    pub fn bundle(&self, name: &str) -> Option<&BundleConfig> {
        self.bundles.iter().find(|b| b.name == name)
    }
}
