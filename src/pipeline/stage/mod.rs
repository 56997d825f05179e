//! Per-class pipeline stages.
//!
//! Each stage reads its inputs under the source root and writes under the
//! destination root. A returned `Err` is stage-fatal; per-file problems are
//! recorded as item outcomes instead.

mod code;
mod html;
mod images;
mod json;

pub use code::run as run_code;
pub use html::run as run_html;
pub use images::run as run_images;
pub use json::run as run_json;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};

use super::report::ItemReport;
use crate::asset::{FilenameMap, walk_files};

/// What a stage produced.
#[derive(Debug)]
pub enum StageOutput {
    /// Nothing to do; the reason is shown in the build summary.
    Skipped(String),
    Done {
        items: Vec<ItemReport>,
        /// Original → output names, for classes referenced from HTML.
        mapping: FilenameMap,
    },
}

impl StageOutput {
    fn done(items: Vec<ItemReport>) -> Self {
        Self::Done {
            items,
            mapping: FilenameMap::new(),
        }
    }
}

/// Write `contents` to `path`, creating parent directories.
fn write_output(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

/// Copy every file under `src` to the same relative path under `dest`.
///
/// Each copied file is reported as a fallback carrying `reason`.
fn copy_tree(src: &Path, dest: &Path, reason: &str) -> Result<Vec<ItemReport>> {
    fs::create_dir_all(dest)
        .with_context(|| format!("failed to create directory {}", dest.display()))?;

    let mut items = Vec::new();
    for path in walk_files(src, Vec::new(), Vec::new()) {
        let rel = path.strip_prefix(src)?;
        let target = dest.join(rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        fs::copy(&path, &target).with_context(|| format!("failed to copy {}", path.display()))?;
        items.push(ItemReport::fallback(rel, rel, reason));
    }
    Ok(items)
}

fn file_name(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("unsupported file name: {}", path.display()))
}
