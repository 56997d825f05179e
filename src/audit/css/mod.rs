//! CSS conformance audit.
//!
//! Stylesheets are checked one at a time with a fixed pause between
//! requests; the remote service rate-limits clients, so requests are never
//! issued concurrently.

mod checker;

pub use checker::{CheckError, CssChecker, CssMessage, CssResult, LocalChecker, W3cChecker};

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::{Map, Value};

use super::{AuditReport, Finding, Summary};
use crate::asset::{AssetClass, is_minified, relative_slash, walk_files};
use crate::config::CssAuditConfig;
use crate::core::is_shutdown;
use crate::logger::ProgressLine;
use crate::utils::plural_count;
use crate::{debug, log};

/// One checked stylesheet.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResult {
    /// Path relative to the audit root.
    pub file_path: String,
    #[serde(flatten)]
    pub result: CssResult,
}

/// Results of a run, in discovery order.
#[derive(Debug, Clone)]
pub struct CssAudit {
    pub files: Vec<FileResult>,
    /// Set when the run stopped before every file was checked.
    pub interrupted: bool,
    /// Number of files discovered.
    pub discovered: usize,
}

impl CssAudit {
    pub fn error_count(&self) -> usize {
        self.files.iter().map(|f| f.result.errors.len()).sum()
    }

    pub fn warning_count(&self) -> usize {
        self.files.iter().map(|f| f.result.warnings.len()).sum()
    }

    /// Every discovered file was checked and found valid.
    pub fn is_pass(&self) -> bool {
        !self.interrupted && self.files.iter().all(|f| f.result.is_valid)
    }

    /// Audit report for `root`. Findings are the individual errors and
    /// warnings, located as `file:line`.
    pub fn to_report(&self, root: &Path) -> AuditReport {
        let mut report = AuditReport::new(root.display().to_string());
        report.summary = Summary {
            violations: self.error_count(),
            passes: self.files.iter().filter(|f| f.result.is_valid).count(),
            incomplete: self.discovered - self.files.len(),
            warnings: self.warning_count(),
        };

        for file in &self.files {
            let errors = file.result.errors.iter().map(|m| ("css-error", "error", m));
            let warnings = file.result.warnings.iter().map(|m| ("css-warning", "warning", m));
            for (id, severity, message) in errors.chain(warnings) {
                report.findings.push(Finding {
                    id: id.into(),
                    severity: severity.into(),
                    description: message.message.clone(),
                    help: String::new(),
                    help_url: None,
                    location: Some(location(&file.file_path, message.line)),
                    count: 1,
                });
            }
        }

        let raw: Map<String, Value> = self
            .files
            .iter()
            .filter_map(|f| Some((f.file_path.clone(), serde_json::to_value(&f.result).ok()?)))
            .collect();
        report.raw_results = Some(Value::Object(raw));

        if self.interrupted {
            report.error = Some("interrupted".into());
        }
        report
    }
}

fn location(file: &str, line: Option<u32>) -> String {
    match line {
        Some(line) => format!("{file}:{line}"),
        None => file.to_owned(),
    }
}

/// Non-minified stylesheets under `root`, sorted, with `exclude`d directory
/// names pruned.
pub fn find_css_files(root: &Path, exclude: &[String]) -> Vec<PathBuf> {
    walk_files(root, Vec::new(), exclude.to_vec())
        .into_iter()
        .filter(|p| AssetClass::Css.matches(p) && !is_minified(p))
        .collect()
}

/// Check `files` sequentially, pausing `config.delay()` between requests.
///
/// A file that cannot be read or checked gets a synthetic invalid result;
/// the run continues with the next file.
pub fn validate_files(checker: &impl CssChecker, files: &[PathBuf], config: &CssAuditConfig) -> CssAudit {
    let progress = ProgressLine::new("css-audit", &[("validate", files.len())]);
    let delay = config.delay();
    let mut results = Vec::with_capacity(files.len());
    let mut interrupted = false;

    for (i, path) in files.iter().enumerate() {
        if is_shutdown() {
            interrupted = true;
            break;
        }
        let file_path =
            relative_slash(path, &config.root).unwrap_or_else(|| path.display().to_string());
        debug!("css-audit"; "validating {}", file_path);

        let result = match fs::read_to_string(path) {
            Ok(css) => checker.check(&css).unwrap_or_else(|e| {
                debug!("css-audit"; "{}: {}", file_path, e);
                CssResult::check_failed(e)
            }),
            Err(e) => CssResult::check_failed(e),
        };
        results.push(FileResult { file_path, result });
        progress.inc("validate");

        if i + 1 < files.len() && !delay.is_zero() {
            thread::sleep(delay);
        }
    }
    progress.finish();

    CssAudit {
        files: results,
        interrupted,
        discovered: files.len(),
    }
}

// ============================================================================
// Console output
// ============================================================================

/// Print discovered files before validation starts.
pub fn print_discovered(files: &[PathBuf], root: &Path) {
    log!("css-audit"; "found {}", plural_count(files.len(), "CSS file"));
    for path in files {
        let shown = relative_slash(path, root).unwrap_or_else(|| path.display().to_string());
        eprintln!("{} {}", "-".dimmed(), shown);
    }
}

/// Print per-file results and the summary line.
pub fn print_results(audit: &CssAudit) {
    for file in &audit.files {
        eprintln!();
        eprintln!("{}{}{}", "[".dimmed(), file.file_path.cyan(), "]".dimmed());

        let result = &file.result;
        if result.is_valid && result.warnings.is_empty() {
            eprintln!("{}", "valid".green());
            continue;
        }
        for error in &result.errors {
            eprintln!("{} {}{}", "→".red(), line_prefix(error.line), error.message);
        }
        for warning in &result.warnings {
            eprintln!("{} {}{}", "→".yellow(), line_prefix(warning.line), warning.message);
        }
        if result.is_valid {
            eprintln!("{}", "valid (with warnings)".green());
        }
    }

    eprintln!();
    eprintln!(
        "{}",
        format!(
            "{}, {} across {}",
            plural_count(audit.error_count(), "error"),
            plural_count(audit.warning_count(), "warning"),
            plural_count(audit.discovered, "file"),
        )
        .dimmed()
    );
}

fn line_prefix(line: Option<u32>) -> String {
    line.map(|l| format!("line {l}: ")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    /// Invalid when the stylesheet contains `..`, errors when it contains `!!`.
    struct FakeChecker {
        calls: Cell<usize>,
    }

    impl FakeChecker {
        fn new() -> Self {
            Self { calls: Cell::new(0) }
        }
    }

    impl CssChecker for FakeChecker {
        fn check(&self, css: &str) -> Result<CssResult, CheckError> {
            self.calls.set(self.calls.get() + 1);
            if css.contains("!!") {
                return Err(CheckError::Response("503 Service Unavailable".into()));
            }
            let mut result = CssResult {
                is_valid: !css.contains(".."),
                ..Default::default()
            };
            if !result.is_valid {
                result.errors.push(CssMessage {
                    line: Some(2),
                    message: "Parse Error [..broken]".into(),
                });
            }
            if css.contains("-webkit-") {
                result.warnings.push(CssMessage {
                    line: Some(1),
                    message: "vendor extension".into(),
                });
            }
            Ok(result)
        }
    }

    fn config(root: &Path) -> CssAuditConfig {
        CssAuditConfig {
            root: root.to_path_buf(),
            delay_ms: 0,
            ..Default::default()
        }
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_find_css_files() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "css/app.css", "");
        write(root, "css/app.min.css", "");
        write(root, "themes/DARK.CSS", "");
        write(root, "node_modules/pkg/lib.css", "");
        write(root, "js/app.js", "");

        let files = find_css_files(root, &["node_modules".to_string()]);
        let rel: Vec<_> = files
            .iter()
            .map(|p| relative_slash(p, root).unwrap())
            .collect();
        assert_eq!(rel, ["css/app.css", "themes/DARK.CSS"]);
    }

    #[test]
    fn test_no_css_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.html", "<html></html>");
        assert!(find_css_files(dir.path(), &[]).is_empty());
    }

    #[test]
    fn test_invalid_file_fails_audit() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "a.css", "body { -webkit-user-select: none; }");
        write(root, "b.css", "body {}\n..broken { color: red; }");
        let config = config(root);
        let checker = FakeChecker::new();

        let files = find_css_files(root, &config.exclude);
        let audit = validate_files(&checker, &files, &config);

        assert_eq!(checker.calls.get(), 2);
        assert!(!audit.is_pass());
        assert_eq!(audit.error_count(), 1);
        assert_eq!(audit.warning_count(), 1);

        let report = audit.to_report(root);
        assert!(!report.is_pass());
        assert_eq!(
            report.summary,
            Summary {
                violations: 1,
                passes: 1,
                incomplete: 0,
                warnings: 1
            }
        );
        let locations: Vec<_> = report
            .findings
            .iter()
            .map(|f| (f.id.as_str(), f.location.as_deref().unwrap()))
            .collect();
        assert_eq!(locations, [("css-warning", "a.css:1"), ("css-error", "b.css:2")]);
        let raw = report.raw_results.unwrap();
        assert_eq!(raw["b.css"]["isValid"], false);
    }

    #[test]
    fn test_checker_error_becomes_invalid_result() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "a.css", "a { color: red !! }");
        write(root, "b.css", "b { color: blue; }");
        let config = config(root);
        let checker = FakeChecker::new();

        let files = find_css_files(root, &config.exclude);
        let audit = validate_files(&checker, &files, &config);

        assert_eq!(audit.files.len(), 2);
        let failed = &audit.files[0].result;
        assert!(!failed.is_valid);
        assert!(failed.errors[0].message.starts_with("Validation failed: "));
        assert!(audit.files[1].result.is_valid);
        assert!(!audit.is_pass());
    }

    #[test]
    fn test_all_valid_passes() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "site.css", "body { margin: 0; }");
        let config = config(root);

        let files = find_css_files(root, &config.exclude);
        let audit = validate_files(&FakeChecker::new(), &files, &config);

        assert!(audit.is_pass());
        let report = audit.to_report(root);
        assert!(report.is_pass());
        assert!(report.findings.is_empty());
    }

    #[test]
    fn test_local_checker_flags_syntax_error() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "broken.css", "body { margin: 0; }\n..broken { color: red; }\n");
        let config = config(root);

        let files = find_css_files(root, &config.exclude);
        let audit = validate_files(&LocalChecker, &files, &config);

        assert!(!audit.is_pass());
        assert!(!audit.files[0].result.errors.is_empty());
    }

    struct TimedChecker {
        calls: RefCell<Vec<Instant>>,
    }

    impl CssChecker for TimedChecker {
        fn check(&self, _css: &str) -> Result<CssResult, CheckError> {
            self.calls.borrow_mut().push(Instant::now());
            Ok(CssResult {
                is_valid: true,
                ..Default::default()
            })
        }
    }

    #[test]
    fn test_delay_between_requests_only() {
        let dir = TempDir::new().unwrap();
        for name in ["a.css", "b.css", "c.css"] {
            write(dir.path(), name, "body { margin: 0; }");
        }
        let config = CssAuditConfig {
            delay_ms: 30,
            ..config(dir.path())
        };
        let delay = Duration::from_millis(30);
        let checker = TimedChecker {
            calls: RefCell::new(Vec::new()),
        };

        let files = find_css_files(dir.path(), &[]);
        let audit = validate_files(&checker, &files, &config);
        let returned = Instant::now();

        assert_eq!(audit.files.len(), 3);
        let calls = checker.calls.borrow();
        assert_eq!(calls.len(), 3);
        for pair in calls.windows(2) {
            assert!(pair[1].duration_since(pair[0]) >= delay);
        }
        assert!(returned.duration_since(calls[2]) < delay);
    }
}
