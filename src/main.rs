//! Binary entrypoint for the photo carousel.
//!
//! Delegates all logic to the library crate; no local modules here.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

/// Simple CLI
#[derive(Debug, Parser)]
#[command(name = "photo-carousel", about = "Scrolling cylindrical photo gallery")]
struct Cli {
    /// Path to YAML config file
    #[arg(short, long, value_name = "FILE", default_value = "config.yaml")]
    config: PathBuf,

    /// Override the layout seed for a reproducible instance layout
    #[arg(long, value_name = "SEED")]
    layout_seed: Option<u64>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    // map -v to log level
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("photo_carousel={}", level).parse()?)
        .add_directive("wgpu=warn".parse()?)
        .add_directive("winit=warn".parse()?);
    fmt().with_env_filter(filter).with_target(true).init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let mut cfg = photo_carousel::config::from_yaml_file(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?
        .validated()
        .context("validating configuration")?;
    if cli.layout_seed.is_some() {
        cfg.layout_seed = cli.layout_seed;
    }

    let paths = photo_carousel::scan::collect_image_paths(&cfg)?;
    info!(count = paths.len(), "collected image sources");

    photo_carousel::render::viewer::run_gallery(cfg, paths)?;
    Ok(())
}
