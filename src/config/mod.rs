//! Site configuration management for `sitekit.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # [build] and [audit] definitions
//! ├── error          # ConfigError, ConfigDiagnostics
//! └── mod.rs         # SiteConfig (this file)
//! ```
//!
//! The config file is optional: without one every command runs on the
//! built-in defaults (`src` → `dist`, the default audit target, report
//! paths in the working directory). CLI flags are applied last.

mod error;
pub mod section;

pub use error::{ConfigDiagnostics, ConfigError};
pub use section::{AccessibilityConfig, AuditConfig, BuildConfig, CssAuditConfig, ImagesConfig};

use crate::cli::{A11yArgs, BuildArgs, Cli, Commands, CssArgs};
use crate::log;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing sitekit.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Build settings
    pub build: BuildConfig,

    /// Audit settings
    pub audit: AuditConfig,
}

impl SiteConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Relative paths in the file resolve against the file's directory;
    /// relative paths given on the command line stay relative to the cwd.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        let config_path = cwd.join(&cli.config);

        let mut config = if config_path.is_file() {
            Self::from_path(&config_path)?
        } else {
            crate::debug!("config"; "{} not found, using defaults", cli.config.display());
            Self::default()
        };

        let root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(cwd);

        config.normalize_paths(&root);
        config.apply_command_options(&cli.command);
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            let display_path = path
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_else(|| path.to_string_lossy());
            log!("warning"; "unknown fields in {}, ignoring:", display_path);
            for field in &ignored {
                eprintln!("- {}", field);
            }
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Resolve file-relative paths against the config directory.
    fn normalize_paths(&mut self, root: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = root.join(&*p);
            }
        };
        join(&mut self.build.source);
        join(&mut self.build.output);
        join(&mut self.audit.accessibility.report);
        join(&mut self.audit.accessibility.axe_script);
        join(&mut self.audit.css.root);
        join(&mut self.audit.css.report);
        // A bare browser name is looked up on PATH, not under root.
        if let Some(browser) = &mut self.audit.accessibility.browser
            && browser.components().count() > 1
        {
            join(browser);
        }
    }

    /// Validate every section, collecting all problems before failing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();
        self.build.validate(&mut diag);
        self.audit.validate(&mut diag);
        diag.into_result()
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, command: &Commands) {
        match command {
            Commands::Build { args } => self.apply_build_args(args),
            Commands::A11y { args } => self.apply_a11y_args(args),
            Commands::Css { args } => self.apply_css_args(args),
        }
    }

    fn apply_build_args(&mut self, args: &BuildArgs) {
        Self::update_option(&mut self.build.source, args.source.as_ref());
        Self::update_option(&mut self.build.output, args.output.as_ref());
        Self::update_option(&mut self.build.strict, args.strict.as_ref());
    }

    fn apply_a11y_args(&mut self, args: &A11yArgs) {
        let a11y = &mut self.audit.accessibility;
        Self::update_option(&mut a11y.url, args.url.as_ref());
        Self::update_option(&mut a11y.report, args.report.as_ref());
        Self::update_option(&mut a11y.axe_script, args.axe_script.as_ref());
        if let Some(browser) = &args.browser {
            a11y.browser = Some(browser.clone());
        }
    }

    fn apply_css_args(&mut self, args: &CssArgs) {
        let css = &mut self.audit.css;
        Self::update_option(&mut css.root, args.root.as_ref());
        Self::update_option(&mut css.report, args.report.as_ref());
        Self::update_option(&mut css.offline, args.offline.as_ref());
    }

    /// Overwrite `target` when the CLI supplied a value.
    fn update_option<T: Clone>(target: &mut T, value: Option<&T>) {
        if let Some(v) = value {
            *target = v.clone();
        }
    }
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(content: &str) -> Result<SiteConfig> {
        SiteConfig::parse_with_ignored(content).map(|(config, _)| config)
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.build.source, PathBuf::from("src"));
        assert_eq!(config.build.output, PathBuf::from("dist"));
        assert_eq!(
            config.audit.accessibility.report,
            PathBuf::from("accessibility-report.json")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_sections() {
        let config = parse(
            r#"
            [build]
            source = "site"
            output = "public"
            strict = true

            [build.images]
            quality = [50, 70]

            [audit.accessibility]
            url = "http://localhost:8080/"
            timeout = 5

            [audit.css]
            delay_ms = 0
            offline = true
            "#,
        )
        .unwrap();
        assert_eq!(config.build.source, PathBuf::from("site"));
        assert!(config.build.strict);
        assert_eq!(config.build.images.quality, [50, 70]);
        assert_eq!(config.audit.accessibility.url, "http://localhost:8080/");
        assert_eq!(config.audit.accessibility.timeout, 5);
        // untouched fields keep defaults
        assert_eq!(config.audit.accessibility.viewport, [1280, 800]);
        assert_eq!(config.audit.css.delay_ms, 0);
        assert!(config.audit.css.offline);
    }

    #[test]
    fn test_unknown_fields_are_collected() {
        let (_, ignored) = SiteConfig::parse_with_ignored(
            r#"
            [build]
            minify_everything = true
            "#,
        )
        .unwrap();
        assert_eq!(ignored, vec!["build.minify_everything"]);
    }

    #[test]
    fn test_normalize_paths() {
        let mut config = SiteConfig::default();
        config.audit.accessibility.browser = Some("chromium".into());
        config.normalize_paths(Path::new("/site"));
        assert_eq!(config.build.source, PathBuf::from("/site/src"));
        assert_eq!(config.audit.css.root, PathBuf::from("/site/."));
        assert_eq!(config.audit.accessibility.browser, Some("chromium".into()));
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from(["sitekit", "build", "--source", "web", "--strict"]);
        let mut config = SiteConfig::default();
        config.apply_command_options(&cli.command);
        assert_eq!(config.build.source, PathBuf::from("web"));
        assert_eq!(config.build.output, PathBuf::from("dist"));
        assert!(config.build.strict);

        let cli = Cli::parse_from(["sitekit", "css", "--offline", "--root", "styles"]);
        config.apply_command_options(&cli.command);
        assert!(config.audit.css.offline);
        assert_eq!(config.audit.css.root, PathBuf::from("styles"));
    }
}
