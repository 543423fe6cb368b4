//! `purview` - demo server and static renderer.

use anyhow::Result;
use clap::{ColorChoice, Parser};
use purview::cli::{self, Cli, Commands};
use purview::config::PurviewConfig;
use purview::logger;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = PurviewConfig::load(&cli)?;
    logger::set_verbose(config.log.verbose);

    match &cli.command {
        Commands::Serve { .. } => cli::serve::serve(&config),
        Commands::Render { page } => cli::render::render(&config, *page),
    }
}
