//! Audit report record shared by both audit runners.
//!
//! Serialized with camelCase keys:
//!
//! ```json
//! {
//!   "target": "https://example.com/",
//!   "timestamp": "2024-06-15T14:30:45Z",
//!   "pageTitle": "Example",
//!   "summary": { "violations": 1, "passes": 20, "incomplete": 0, "warnings": 0 },
//!   "findings": [{ "id": "image-alt", "severity": "critical", ... }],
//!   "rawResults": { ... }
//! }
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use crate::utils::date::DateTimeUtc;

/// Outcome of one audit invocation. Written once, never updated.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    /// URL or directory that was audited.
    pub target: String,
    /// RFC 3339 UTC.
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,
    pub summary: Summary,
    pub findings: Vec<Finding>,
    /// Set when the audit could not run to completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Unmodified output of the checking engine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_results: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub violations: usize,
    pub passes: usize,
    pub incomplete: usize,
    pub warnings: usize,
}

/// One reported issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub id: String,
    pub severity: String,
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub help: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_url: Option<String>,
    /// Affected element selectors or `file:line`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Number of affected elements.
    pub count: usize,
}

impl AuditReport {
    /// Empty report for `target`, stamped with the current time.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            timestamp: DateTimeUtc::now().to_rfc3339(),
            page_title: None,
            summary: Summary::default(),
            findings: Vec::new(),
            error: None,
            raw_results: None,
        }
    }

    /// Report for an audit that could not complete.
    pub fn failed(target: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(target)
        }
    }

    /// No error and no violations.
    pub fn is_pass(&self) -> bool {
        self.error.is_none() && self.summary.violations == 0
    }

    /// Write the report as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
    }
}
