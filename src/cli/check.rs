//! `stitch check`: validate configuration and report missing sources.

use anyhow::{Result, bail};

use crate::config::{AssetConfig, StitchConfig};
use crate::host::{PathTranslator, RootPathTranslator};
use crate::log;
use crate::utils::path::is_external_link;

/// Local file and directory paths named in the config that do not exist.
pub fn missing_sources(config: &StitchConfig) -> Vec<(String, String)> {
    let translator = RootPathTranslator::new(&config.stitch.root);
    let mut missing = Vec::new();

    for bundle in &config.bundles {
        for asset in &bundle.assets {
            let path = match asset {
                AssetConfig::Path(path) => Some(path),
                AssetConfig::Entry(entry) => entry
                    .file
                    .as_ref()
                    .or(entry.directory.as_ref())
                    .or(entry.local.as_ref()),
            };
            let Some(path) = path else { continue };
            if is_external_link(path) {
                continue;
            }
            if !translator.to_file_system_path(path).exists() {
                missing.push((bundle.name.clone(), path.clone()));
            }
        }
    }
    missing
}

/// Entry point for `stitch check`.
///
/// Validation already ran while loading; this adds a filesystem pass.
pub fn check_config(config: &StitchConfig) -> Result<()> {
    config.builder().build()?;

    let missing = missing_sources(config);
    for (bundle, path) in &missing {
        log!("error"; "{}: missing source {}", bundle, path);
    }
    if !missing.is_empty() {
        bail!("{} missing sources", missing.len());
    }

    log!(
        "check";
        "{}: {} bundles ok",
        config.config_path.display(),
        config.bundles.len()
    );
    Ok(())
}
