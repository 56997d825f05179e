//! Configuration section definitions.
//!
//! Each module corresponds to a section in `sitekit.toml`:
//!
//! | Module  | TOML Section | Purpose                                  |
//! |---------|--------------|------------------------------------------|
//! | `build` | `[build]`    | Source/output roots, pages, image quality |
//! | `audit` | `[audit]`    | Accessibility and CSS conformance audits |

mod audit;
mod build;

pub use audit::{AccessibilityConfig, AuditConfig, CssAuditConfig};
pub use build::{BuildConfig, ImagesConfig};
