//! Site audits.
//!
//! ```text
//! audit/
//! ├── a11y/     # accessibility rules engine in a headless browser
//! ├── css/      # stylesheet conformance checks
//! └── report    # AuditReport, written by both
//! ```

pub mod a11y;
pub mod css;
mod report;

pub use report::{AuditReport, Finding, Summary};
