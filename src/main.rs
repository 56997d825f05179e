//! sitekit - minify a small static site and audit it.

mod asset;
mod audit;
mod cli;
mod config;
mod core;
mod html;
mod logger;
mod pipeline;
mod utils;

use std::process::ExitCode;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::SiteConfig;

fn main() -> Result<ExitCode> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = SiteConfig::load(&cli)?;

    match &cli.command {
        Commands::Build { .. } => cli::build::build(&config.build),
        Commands::A11y { .. } => cli::audit::accessibility(&config.audit.accessibility),
        Commands::Css { .. } => cli::audit::css(&config.audit.css),
    }
}
