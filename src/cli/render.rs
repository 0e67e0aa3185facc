//! `stitch render`: render configured bundles in parallel.

use anyhow::{Result, bail};
use rayon::prelude::*;
use std::time::Instant;

use super::RenderArgs;
use crate::bundle::Bundler;
use crate::config::{BundleConfig, StitchConfig};
use crate::error::BundleError;
use crate::log;

/// Outcome of rendering one bundle.
pub struct Rendered<'c> {
    pub bundle: &'c BundleConfig,
    pub result: Result<String, BundleError>,
}

/// Bundles selected by `names`, all of them when empty.
pub fn select<'c>(config: &'c StitchConfig, names: &[String]) -> Result<Vec<&'c BundleConfig>> {
    if names.is_empty() {
        return Ok(config.bundles.iter().collect());
    }
    names
        .iter()
        .map(|name| match config.bundle(name) {
            Some(bundle) => Ok(bundle),
            None => bail!(
                "no bundle named `{}` in {}",
                name,
                config.config_path.display()
            ),
        })
        .collect()
}

/// Register and render `bundles` on the rayon pool.
pub fn render_all<'c>(bundler: &Bundler, bundles: &[&'c BundleConfig]) -> Vec<Rendered<'c>> {
    bundles
        .par_iter()
        .map(|&bundle| Rendered {
            bundle,
            result: bundle.register(bundler),
        })
        .collect()
}

/// Entry point for `stitch render`.
pub fn render_bundles(config: &StitchConfig, args: &RenderArgs) -> Result<()> {
    let selected = select(config, &args.names)?;
    let bundler = config.builder().build()?;
    let mode = if bundler.is_debugging() { "debug" } else { "release" };

    let start = Instant::now();
    let rendered = render_all(&bundler, &selected);
    let failed = report(&rendered, args.tags);

    if failed > 0 {
        bail!("{} of {} bundles failed", failed, rendered.len());
    }
    log!(
        "render";
        "{} bundles ({}) in {:.2?}",
        rendered.len(),
        mode,
        start.elapsed()
    );
    Ok(())
}

/// Log each outcome; returns the number of failures.
fn report(rendered: &[Rendered<'_>], print_tags: bool) -> usize {
    let mut failed = 0;
    for Rendered { bundle, result } in rendered {
        match result {
            Ok(tags) => {
                log!("render"; "{} -> {}", bundle.name, bundle.output);
                if print_tags {
                    println!("{tags}");
                }
            }
            Err(e) if e.is_unsupported_platform() => {
                log!("warning"; "{} skipped: {}", bundle.name, e);
            }
            Err(e) => {
                failed += 1;
                log!("error"; "{}: {}", bundle.name, e);
            }
        }
    }
    failed
}
