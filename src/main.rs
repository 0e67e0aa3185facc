//! Stitch - CSS/JavaScript bundler for server-rendered sites.

use anyhow::{Result, bail};
use clap::{ColorChoice, Parser};
use std::sync::atomic::Ordering;

use stitch::cli::{Cli, Commands, check, render, watch};
use stitch::config::{ConfigError, StitchConfig, find_config_file};
use stitch::log;

fn main() -> Result<()> {
    // Graceful stop while watching, immediate exit otherwise
    ctrlc::set_handler(|| {
        watch::SHUTDOWN.store(true, Ordering::SeqCst);
        if !watch::WATCHING.load(Ordering::SeqCst) {
            std::process::exit(130);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    stitch::logger::set_verbose(cli.verbose);

    let mut config = load_config(&cli)?;

    match &cli.command {
        Commands::Render { args } => {
            args.apply(&mut config);
            render::render_bundles(&config, args)
        }
        Commands::Check => check::check_config(&config),
        Commands::Watch { args } => {
            args.apply(&mut config);
            watch::watch_bundles(config, args)
        }
    }
}

fn load_config(cli: &Cli) -> Result<StitchConfig> {
    let Some(path) = find_config_file(&cli.config) else {
        log!(
            "error";
            "config file '{}' not found in this directory or any parent",
            cli.config.display()
        );
        bail!(ConfigError::Validation("config file not found".into()));
    };
    Ok(StitchConfig::load(&path)?)
}
