//! `[audit]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [audit.accessibility]
//! url = "https://example.com/"
//! report = "accessibility-report.json"
//! tags = ["wcag2a", "wcag2aa", "best-practice"]
//! rules = ["color-contrast", "image-alt"]   # rules force-enabled on top of the tags
//! timeout = 30                               # navigation timeout (seconds)
//! viewport = [1280, 800]
//! browser = "/usr/bin/chromium"              # omit to search PATH
//! axe_script = "node_modules/axe-core/axe.min.js"
//!
//! [audit.css]
//! root = "."
//! report = "css-validation-report.json"
//! exclude = ["node_modules"]
//! delay_ms = 1500                            # pause between requests
//! endpoint = "https://jigsaw.w3.org/css-validator/validator"
//! profile = "css3svg"
//! offline = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::ConfigDiagnostics;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub accessibility: AccessibilityConfig,
    pub css: CssAuditConfig,
}

impl AuditConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        self.accessibility.validate(diag);
        self.css.validate(diag);
    }
}

// ============================================================================
// Accessibility
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessibilityConfig {
    /// Page loaded in the browser session.
    pub url: String,

    /// JSON report destination.
    pub report: PathBuf,

    /// Rule tags the engine is restricted to.
    pub tags: Vec<String>,

    /// Rules explicitly enabled in addition to the tag selection.
    pub rules: Vec<String>,

    /// Navigation timeout in seconds.
    pub timeout: u64,

    /// `[width, height]` of the emulated viewport.
    pub viewport: [u32; 2],

    /// Browser binary. `None` searches PATH.
    pub browser: Option<PathBuf>,

    /// axe-core bundle injected into the page.
    pub axe_script: PathBuf,
}

impl Default for AccessibilityConfig {
    fn default() -> Self {
        Self {
            url: "https://danielsofran.github.io/Contrast/".into(),
            report: "accessibility-report.json".into(),
            tags: ["wcag2a", "wcag2aa", "best-practice"]
                .map(String::from)
                .to_vec(),
            rules: [
                "color-contrast",
                "image-alt",
                "label",
                "link-name",
                "button-name",
            ]
            .map(String::from)
            .to_vec(),
            timeout: 30,
            viewport: [1280, 800],
            browser: None,
            axe_script: "node_modules/axe-core/axe.min.js".into(),
        }
    }
}

impl AccessibilityConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.url.trim().is_empty() {
            diag.error("audit.accessibility.url", "target URL must not be empty");
        } else if url::Url::parse(&self.url).is_err() {
            diag.error(
                "audit.accessibility.url",
                format!("`{}` is not an absolute URL", self.url),
            );
        }
        if self.tags.is_empty() {
            diag.error("audit.accessibility.tags", "at least one rule tag is required");
        }
        if self.timeout == 0 {
            diag.error("audit.accessibility.timeout", "timeout must be at least 1 second");
        }
        if self.viewport.contains(&0) {
            diag.error("audit.accessibility.viewport", "viewport dimensions must be non-zero");
        }
    }
}

// ============================================================================
// CSS conformance
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CssAuditConfig {
    /// Directory searched recursively for stylesheets.
    pub root: PathBuf,

    /// JSON report destination.
    pub report: PathBuf,

    /// Directory names pruned from the search.
    pub exclude: Vec<String>,

    /// Pause between validation requests, in milliseconds.
    pub delay_ms: u64,

    /// Conformance service endpoint.
    pub endpoint: String,

    /// Service validation profile.
    pub profile: String,

    /// Validate with the local CSS parser instead of the service.
    pub offline: bool,
}

impl Default for CssAuditConfig {
    fn default() -> Self {
        Self {
            root: ".".into(),
            report: "css-validation-report.json".into(),
            exclude: vec!["node_modules".into()],
            delay_ms: 1500,
            endpoint: "https://jigsaw.w3.org/css-validator/validator".into(),
            profile: "css3svg".into(),
            offline: false,
        }
    }
}

impl CssAuditConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.offline && url::Url::parse(&self.endpoint).is_err() {
            diag.error(
                "audit.css.endpoint",
                format!("`{}` is not an absolute URL", self.endpoint),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessibility_defaults() {
        let config = AccessibilityConfig::default();
        assert_eq!(config.report, PathBuf::from("accessibility-report.json"));
        assert_eq!(config.tags, vec!["wcag2a", "wcag2aa", "best-practice"]);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.browser.is_none());
    }

    #[test]
    fn test_css_defaults() {
        let config = CssAuditConfig::default();
        assert_eq!(config.delay(), Duration::from_millis(1500));
        assert_eq!(config.exclude, vec!["node_modules"]);
        assert!(!config.offline);
    }

    #[test]
    fn test_validate_rejects_bad_accessibility_values() {
        let config = AuditConfig {
            accessibility: AccessibilityConfig {
                url: "not a url".into(),
                tags: Vec::new(),
                timeout: 0,
                ..Default::default()
            },
            css: CssAuditConfig::default(),
        };
        let mut diag = ConfigDiagnostics::new();
        config.validate(&mut diag);
        assert_eq!(diag.errors().len(), 3);
    }
}
