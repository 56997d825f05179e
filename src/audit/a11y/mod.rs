//! Accessibility audit.
//!
//! Loads the target page in a browser session, injects axe-core and runs it
//! restricted to the configured rule tags. The session is acquired once per
//! run and closed on every path out of [`run_audit`].

pub mod cdp;

use std::fs;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use owo_colors::OwoColorize;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::{AuditReport, Finding, Summary};
use crate::config::AccessibilityConfig;
use crate::utils::plural_count;
use crate::{debug, log};

pub use cdp::{CdpError, ChromeLauncher};

// ============================================================================
// Browser seam
// ============================================================================

/// Starts browser sessions.
pub trait BrowserLauncher {
    type Session: BrowserSession;

    fn launch(&self) -> Result<Self::Session, CdpError>;
}

/// One page in a running browser.
pub trait BrowserSession {
    /// Navigate to `url` with the given `[width, height]` viewport and wait
    /// until the network is almost idle.
    fn open(&mut self, url: &str, viewport: [u32; 2], timeout: Duration) -> Result<(), CdpError>;

    /// Evaluate `expression` in the page, awaiting a returned promise.
    fn evaluate(&mut self, expression: &str, timeout: Duration) -> Result<Value, CdpError>;

    /// Shut the browser down. Must be safe to call after any failure.
    fn close(&mut self);
}

// ============================================================================
// Runner
// ============================================================================

/// Run the audit. Failures are recorded in the report's `error` field.
pub fn run_audit<L: BrowserLauncher>(launcher: &L, config: &AccessibilityConfig) -> AuditReport {
    log!("a11y"; "testing accessibility for {}", config.url);

    let mut session = match launcher.launch() {
        Ok(session) => session,
        Err(e) => return AuditReport::failed(&config.url, e.to_string()),
    };
    let result = audit_page(&mut session, config);
    session.close();

    result.unwrap_or_else(|e| AuditReport::failed(&config.url, format!("{e:#}")))
}

fn audit_page(session: &mut impl BrowserSession, config: &AccessibilityConfig) -> Result<AuditReport> {
    let axe_source = fs::read_to_string(&config.axe_script).with_context(|| {
        format!(
            "failed to read axe-core script {}",
            config.axe_script.display()
        )
    })?;
    let timeout = config.timeout();

    session.open(&config.url, config.viewport, timeout)?;
    debug!("a11y"; "page loaded, injecting {}", config.axe_script.display());

    let loaded = session.evaluate(
        &format!("{axe_source}\n;typeof axe !== 'undefined'"),
        timeout,
    )?;
    if loaded != Value::Bool(true) {
        bail!("axe-core did not load from {}", config.axe_script.display());
    }

    let raw = session.evaluate(&run_expression(config), timeout)?;
    let title = session.evaluate("document.title", timeout)?;

    let mut report = report_from_results(&config.url, raw)?;
    report.page_title = title.as_str().map(str::to_owned);
    Ok(report)
}

/// `axe.run` call restricted to the configured tags, with the configured
/// rules force-enabled.
fn run_expression(config: &AccessibilityConfig) -> String {
    let rules: Map<String, Value> = config
        .rules
        .iter()
        .map(|rule| (rule.clone(), json!({ "enabled": true })))
        .collect();
    let options = json!({
        "runOnly": { "type": "tag", "values": config.tags },
        "rules": rules,
    });
    format!("axe.run({options})")
}

// ============================================================================
// Engine output
// ============================================================================

#[derive(Debug, Deserialize)]
struct AxeResults {
    #[serde(default)]
    violations: Vec<AxeRule>,
    #[serde(default)]
    passes: Vec<AxeRule>,
    #[serde(default)]
    incomplete: Vec<AxeRule>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AxeRule {
    id: String,
    #[serde(default)]
    impact: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    help: String,
    #[serde(default)]
    help_url: Option<String>,
    #[serde(default)]
    nodes: Vec<AxeNode>,
}

#[derive(Debug, Deserialize)]
struct AxeNode {
    /// Selectors; nested arrays cross iframe and shadow boundaries.
    #[serde(default)]
    target: Vec<Value>,
}

fn report_from_results(url: &str, raw: Value) -> Result<AuditReport> {
    let results = AxeResults::deserialize(&raw).context("unexpected axe-core result shape")?;

    let findings = results
        .violations
        .iter()
        .map(|rule| Finding {
            id: rule.id.clone(),
            severity: rule.impact.clone().unwrap_or_else(|| "unknown".into()),
            description: rule.description.clone(),
            help: rule.help.clone(),
            help_url: rule.help_url.clone(),
            location: node_selectors(&rule.nodes),
            count: rule.nodes.len(),
        })
        .collect();

    let mut report = AuditReport::new(url);
    report.summary = Summary {
        violations: results.violations.len(),
        passes: results.passes.len(),
        incomplete: results.incomplete.len(),
        warnings: 0,
    };
    report.findings = findings;
    report.raw_results = Some(raw);
    Ok(report)
}

fn node_selectors(nodes: &[AxeNode]) -> Option<String> {
    let selectors: Vec<_> = nodes
        .iter()
        .flat_map(|node| &node.target)
        .map(selector)
        .collect();
    (!selectors.is_empty()).then(|| selectors.join(", "))
}

fn selector(target: &Value) -> String {
    match target {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts.iter().map(selector).collect::<Vec<_>>().join(" >>> "),
        other => other.to_string(),
    }
}

// ============================================================================
// Console output
// ============================================================================

/// Print the summary block.
pub fn print_report(report: &AuditReport) {
    eprintln!();
    eprintln!("{}", "accessibility audit".bold());
    eprintln!("{} {}", "url:".dimmed(), report.target);
    if let Some(title) = &report.page_title {
        eprintln!("{} {}", "title:".dimmed(), title);
    }
    eprintln!("{} {}", "timestamp:".dimmed(), report.timestamp);

    if let Some(error) = &report.error {
        eprintln!("{} {}", "→".red(), error);
        return;
    }

    let s = &report.summary;
    eprintln!(
        "{}",
        format!(
            "{} found, {} passed, {} need review",
            plural_count(s.violations, "violation"),
            plural_count(s.passes, "check"),
            plural_count(s.incomplete, "check"),
        )
        .dimmed()
    );

    if report.findings.is_empty() {
        eprintln!("{}", "no violations found".green());
        return;
    }
    for (i, finding) in report.findings.iter().enumerate() {
        eprintln!(
            "{}{}{} {} {}",
            "[".dimmed(),
            finding.id.cyan(),
            "]".dimmed(),
            format!("({})", finding.severity).red().bold(),
            finding.description
        );
        eprintln!(
            "{} affects {}",
            "→".red(),
            plural_count(finding.count, "element")
        );
        if let Some(url) = &finding.help_url {
            eprintln!("{} {}", "→".red(), url.dimmed());
        }
        if i + 1 < report.findings.len() {
            eprintln!();
        }
    }
}
