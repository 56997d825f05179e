//! `a11y` and `css` commands.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;

use crate::audit::AuditReport;
use crate::audit::a11y::{self, ChromeLauncher};
use crate::audit::css::{self, LocalChecker, W3cChecker};
use crate::config::{AccessibilityConfig, CssAuditConfig};
use crate::log;
use crate::utils::plural_count;

/// Audit the configured URL in a headless browser.
///
/// The report is written whether or not the audit completed.
pub fn accessibility(config: &AccessibilityConfig) -> Result<ExitCode> {
    let launcher = ChromeLauncher::new(config.browser.clone());
    let report = a11y::run_audit(&launcher, config);

    save("a11y", &report, &config.report);
    a11y::print_report(&report);

    if let Some(error) = &report.error {
        log!("error"; "accessibility audit failed: {}", error);
        return Ok(ExitCode::FAILURE);
    }
    if report.is_pass() {
        log!("done"; "no violations found");
        return Ok(ExitCode::SUCCESS);
    }
    log!(
        "error";
        "{} found",
        plural_count(report.summary.violations, "violation")
    );
    Ok(ExitCode::FAILURE)
}

/// Validate every non-minified stylesheet under the configured root.
pub fn css(config: &CssAuditConfig) -> Result<ExitCode> {
    log!("css-audit"; "searching {}", config.root.display());
    let files = css::find_css_files(&config.root, &config.exclude);
    if files.is_empty() {
        log!("error"; "no CSS files found");
        return Ok(ExitCode::FAILURE);
    }
    css::print_discovered(&files, &config.root);

    let audit = if config.offline {
        css::validate_files(&LocalChecker, &files, config)
    } else {
        let checker = W3cChecker::new(&config.endpoint, &config.profile)?;
        css::validate_files(&checker, &files, config)
    };
    css::print_results(&audit);
    save("css-audit", &audit.to_report(&config.root), &config.report);

    if audit.is_pass() {
        log!("done"; "all CSS files are valid");
        return Ok(ExitCode::SUCCESS);
    }
    if audit.interrupted {
        log!("error"; "interrupted after {}", plural_count(audit.files.len(), "file"));
    } else {
        let invalid = audit.files.iter().filter(|f| !f.result.is_valid).count();
        log!("error"; "validation failed: {} with errors", plural_count(invalid, "file"));
    }
    Ok(ExitCode::FAILURE)
}

/// Write the report. A write failure is logged and does not change the exit status.
fn save(module: &str, report: &AuditReport, path: &Path) {
    match report.save(path) {
        Ok(()) => log!(module; "report saved to {}", path.display()),
        Err(e) => log!("error"; "failed to save report: {:#}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::fs;
    use tempfile::TempDir;

    fn offline(root: &Path) -> CssAuditConfig {
        CssAuditConfig {
            root: root.to_path_buf(),
            report: root.join("reports/css.json"),
            offline: true,
            delay_ms: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_css_syntax_error_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("site.css"), "body { margin: 0; }\n").unwrap();
        fs::write(dir.path().join("broken.css"), "..broken { }\n").unwrap();
        let config = offline(dir.path());

        assert_eq!(css(&config).unwrap(), ExitCode::FAILURE);

        let saved: Value =
            serde_json::from_str(&fs::read_to_string(&config.report).unwrap()).unwrap();
        assert_eq!(saved["rawResults"]["broken.css"]["isValid"], false);
        assert_eq!(saved["rawResults"]["site.css"]["isValid"], true);
        assert!(saved["summary"]["violations"].as_u64().unwrap() >= 1);
    }

    #[test]
    fn test_css_all_valid_succeeds() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("site.css"), "body { margin: 0; }\n").unwrap();
        let config = offline(dir.path());

        assert_eq!(css(&config).unwrap(), ExitCode::SUCCESS);
        assert!(config.report.is_file());
    }

    #[test]
    fn test_css_no_files_fails_without_report() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        let config = offline(dir.path());

        assert_eq!(css(&config).unwrap(), ExitCode::FAILURE);
        assert!(!config.report.exists());
    }

    #[test]
    fn test_accessibility_error_fails_and_saves_report() {
        let dir = TempDir::new().unwrap();
        let config = AccessibilityConfig {
            url: "http://unreachable.invalid/".into(),
            report: dir.path().join("a11y.json"),
            browser: Some("/nonexistent/sitekit-browser".into()),
            ..Default::default()
        };

        assert_eq!(accessibility(&config).unwrap(), ExitCode::FAILURE);

        let saved: Value =
            serde_json::from_str(&fs::read_to_string(&config.report).unwrap()).unwrap();
        assert_eq!(saved["target"], "http://unreachable.invalid/");
        assert!(saved["error"].as_str().unwrap().contains("no browser found"));
    }
}
