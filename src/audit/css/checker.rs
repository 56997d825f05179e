//! Stylesheet checkers.
//!
//! [`W3cChecker`] asks the W3C CSS validation service; [`LocalChecker`]
//! parses with lightningcss and needs no network.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use lightningcss::stylesheet::{ParserOptions, StyleSheet};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation outcome for one stylesheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CssResult {
    pub is_valid: bool,
    pub errors: Vec<CssMessage>,
    pub warnings: Vec<CssMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CssMessage {
    /// 1-based source line, when the checker reports one.
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub message: String,
}

impl CssResult {
    /// Invalid result standing in for a check that could not be performed.
    pub fn check_failed(reason: impl std::fmt::Display) -> Self {
        Self {
            is_valid: false,
            errors: vec![CssMessage {
                line: None,
                message: format!("Validation failed: {reason}"),
            }],
            warnings: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Response(String),
}

/// Validates stylesheet text.
pub trait CssChecker {
    fn check(&self, css: &str) -> Result<CssResult, CheckError>;
}

// ============================================================================
// Remote service
// ============================================================================

const USER_AGENT: &str = concat!("sitekit/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct W3cChecker {
    client: Client,
    endpoint: String,
    profile: String,
}

impl W3cChecker {
    pub fn new(endpoint: impl Into<String>, profile: impl Into<String>) -> Result<Self, CheckError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            profile: profile.into(),
        })
    }
}

/// `output=json` response body.
#[derive(Debug, Deserialize)]
struct ValidatorResponse {
    cssvalidation: Validation,
}

#[derive(Debug, Deserialize)]
struct Validation {
    validity: bool,
    #[serde(default)]
    errors: Vec<CssMessage>,
    #[serde(default)]
    warnings: Vec<CssMessage>,
}

impl From<Validation> for CssResult {
    fn from(v: Validation) -> Self {
        Self {
            is_valid: v.validity,
            errors: v.errors,
            warnings: v.warnings,
        }
    }
}

impl CssChecker for W3cChecker {
    fn check(&self, css: &str) -> Result<CssResult, CheckError> {
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[
                ("text", css),
                ("profile", self.profile.as_str()),
                ("output", "json"),
                ("warning", "1"),
            ])
            .send()?
            .error_for_status()?;
        let body = response.text()?;
        parse_response(&body)
    }
}

fn parse_response(body: &str) -> Result<CssResult, CheckError> {
    serde_json::from_str::<ValidatorResponse>(body)
        .map(|r| r.cssvalidation.into())
        .map_err(|e| CheckError::Response(e.to_string()))
}

// ============================================================================
// Local parser
// ============================================================================

/// Offline checker. Everything lightningcss recovers from is an error, as is
/// a parse failure it cannot recover from.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalChecker;

impl CssChecker for LocalChecker {
    fn check(&self, css: &str) -> Result<CssResult, CheckError> {
        let warnings = Arc::new(RwLock::new(Vec::new()));
        let options = ParserOptions {
            error_recovery: true,
            warnings: Some(Arc::clone(&warnings)),
            ..ParserOptions::default()
        };

        let mut errors = Vec::new();
        if let Err(e) = StyleSheet::parse(css, options) {
            errors.push(CssMessage {
                line: e.loc.as_ref().map(|loc| loc.line + 1),
                message: e.kind.to_string(),
            });
        }
        if let Ok(recovered) = warnings.read() {
            errors.extend(recovered.iter().map(|w| CssMessage {
                line: w.loc.as_ref().map(|loc| loc.line + 1),
                message: w.kind.to_string(),
            }));
        }
        errors.sort_by_key(|e| e.line);

        Ok(CssResult {
            is_valid: errors.is_empty(),
            errors,
            warnings: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_validator_response() {
        let body = r#"{
            "cssvalidation": {
                "uri": "file://localhost/TextArea",
                "checkedby": "http://www.w3.org/2005/07/css-validator",
                "csslevel": "css3",
                "date": "2024-06-15T14:30:45Z",
                "timestamp": "1718461845000",
                "validity": false,
                "result": { "errorcount": 1, "warningcount": 1 },
                "errors": [{
                    "source": "file://localhost/TextArea",
                    "line": 3,
                    "context": " .box ",
                    "type": "parse-error",
                    "message": "Value Error : color (nullcolors.html#propdef-color) Parse Error [red;]"
                }],
                "warnings": [{ "line": 7, "level": 0, "message": "Same color for background-color and color" }]
            }
        }"#;
        let result = parse_response(body).unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].line, Some(3));
        assert!(result.errors[0].message.starts_with("Value Error"));
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_parse_valid_response_without_lists() {
        let result = parse_response(r#"{"cssvalidation":{"validity":true}}"#).unwrap();
        assert_eq!(
            result,
            CssResult {
                is_valid: true,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_unexpected_body() {
        let err = parse_response("<html>rate limited</html>").unwrap_err();
        assert!(matches!(err, CheckError::Response(_)));
    }

    #[test]
    fn test_check_failed_result() {
        let result = CssResult::check_failed("request failed: timed out");
        assert!(!result.is_valid);
        assert_eq!(
            result.errors[0].message,
            "Validation failed: request failed: timed out"
        );
    }

    #[test]
    fn test_local_valid() {
        let result = LocalChecker
            .check("body { margin: 0; }\n.a:hover { color: #333; }\n")
            .unwrap();
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_local_syntax_error() {
        let result = LocalChecker
            .check("body { margin: 0; }\n..broken { color: red; }\n")
            .unwrap();
        assert!(!result.is_valid);
        assert!(!result.errors.is_empty());
    }
}
