//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! source = "src"            # Site sources
//! output = "dist"           # Minified mirror
//! pages = ["index.html"]    # HTML entry pages (relative to source)
//! strict = false            # Exit 1 when any stage fails
//!
//! [build.images]
//! quality = [65, 80]        # Lossy quality range (percent)
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::asset::QualityRange;
use crate::config::ConfigDiagnostics;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Source root read by every stage.
    pub source: PathBuf,

    /// Destination root; created on demand.
    pub output: PathBuf,

    /// HTML entry pages, relative to `source`.
    pub pages: Vec<PathBuf>,

    /// Treat a failed stage as a failed build.
    pub strict: bool,

    /// Image stage settings.
    pub images: ImagesConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source: "src".into(),
            output: "dist".into(),
            pages: vec!["index.html".into()],
            strict: false,
            images: ImagesConfig::default(),
        }
    }
}

impl BuildConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        let [min, max] = self.images.quality;
        if max > 100 {
            diag.error("build.images.quality", format!("maximum {max} exceeds 100"));
        }
        if min > max {
            diag.error(
                "build.images.quality",
                format!("minimum {min} exceeds maximum {max}"),
            );
        }
        if self.pages.iter().any(|p| !is_inside_root(p)) {
            diag.error(
                "build.pages",
                "pages must be relative paths inside the source directory",
            );
        }
    }
}

/// Relative, and never climbing out through `..`.
fn is_inside_root(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    /// `[min, max]` quality in percent.
    pub quality: [u8; 2],
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self { quality: [65, 80] }
    }
}

impl ImagesConfig {
    pub fn quality_range(&self) -> QualityRange {
        QualityRange::new(self.quality[0], self.quality[1])
    }
}
