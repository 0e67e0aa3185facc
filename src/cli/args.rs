//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::StitchConfig;

/// Stitch CSS/JavaScript bundler CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Print cache, lock and write activity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (default: stitch.toml, searched upward)
    #[arg(short = 'C', long, global = true, default_value = "stitch.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Render bundles declared in the config file
    #[command(visible_alias = "r")]
    Render {
        #[command(flatten)]
        args: RenderArgs,
    },

    /// Validate the config file without rendering
    #[command(visible_alias = "c")]
    Check,

    /// Render, then re-render whenever a source changes
    #[command(visible_alias = "w")]
    Watch {
        #[command(flatten)]
        args: RenderArgs,
    },
}

/// Shared arguments for Render and Watch
#[derive(clap::Args, Debug, Clone, Default)]
pub struct RenderArgs {
    /// Bundle names to render. If omitted, renders all bundles.
    #[arg(value_name = "NAME")]
    pub names: Vec<String>,

    /// Force debug mode (per-file tags, no minification)
    #[arg(short, long, conflicts_with = "release")]
    pub debug: bool,

    /// Force release mode
    #[arg(short, long)]
    pub release: bool,

    /// Print the emitted tags of each bundle
    #[arg(short, long)]
    pub tags: bool,
}

impl RenderArgs {
    /// Apply mode flags over the config file settings.
    pub fn apply(&self, config: &mut StitchConfig) {
        if self.debug || self.release {
            config.stitch.debug = self.debug;
            config.stitch.debug_env = None;
        }
    }
}
