//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Minify a static site and audit it for accessibility and CSS conformance
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (optional; defaults apply when it does not exist)
    #[arg(short = 'C', long, global = true, default_value = "sitekit.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Minify images, CSS, JS, JSON and HTML into the output directory
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        args: BuildArgs,
    },

    /// Run the accessibility audit against a live URL in a headless browser
    #[command(visible_alias = "a")]
    A11y {
        #[command(flatten)]
        args: A11yArgs,
    },

    /// Validate every non-minified stylesheet against the CSS conformance checker
    #[command(visible_alias = "c")]
    Css {
        #[command(flatten)]
        args: CssArgs,
    },
}

/// Build command arguments.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Source directory (default: src)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub source: Option<PathBuf>,

    /// Output directory (default: dist)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Exit with status 1 when any stage fails instead of finishing best-effort
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub strict: Option<bool>,
}

/// Accessibility audit arguments.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct A11yArgs {
    /// Page to audit
    #[arg(short, long, value_hint = clap::ValueHint::Url)]
    pub url: Option<String>,

    /// Where to write the JSON report
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub report: Option<PathBuf>,

    /// Browser binary (default: first Chromium-family browser on PATH)
    #[arg(short, long, value_hint = clap::ValueHint::ExecutablePath)]
    pub browser: Option<PathBuf>,

    /// Path to the axe-core script injected into the page
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub axe_script: Option<PathBuf>,
}

/// CSS conformance audit arguments.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct CssArgs {
    /// Directory searched recursively for stylesheets
    #[arg(short = 'R', long, value_hint = clap::ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// Where to write the JSON report
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub report: Option<PathBuf>,

    /// Validate locally with the CSS parser instead of the remote service
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub offline: Option<bool>,
}
