//! `locviz` - render a location history export as a map
//!
//! This binary parses the command line, loads configuration and runs the
//! plotting pipeline once.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::Parser;
use tracing::info;

use locviz::cli::Cli;
use locviz::{init_logging, run, Config, RunOptions};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    let options = RunOptions::from(&cli);
    let summary = run(&options, &config)
        .with_context(|| format!("failed to render {}", options.output.display()))?;

    info!(
        "Done: {} points plotted, {} outside the map",
        summary.points_drawn, summary.points_clipped
    );
    Ok(())
}
