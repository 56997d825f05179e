//! HTML stage: rewrite asset references, then minify each entry page.
//!
//! Pages keep their relative path so the output stays servable.

use std::fs;

use anyhow::{Context, Result};

use super::{StageOutput, write_output};
use crate::config::BuildConfig;
use crate::html::{ReferenceMaps, minify_html, rewrite_references};
use crate::pipeline::report::ItemReport;
use crate::{debug, log};

pub fn run(config: &BuildConfig, refs: &ReferenceMaps) -> Result<StageOutput> {
    let pages: Vec<_> = config
        .pages
        .iter()
        .filter(|page| {
            let found = config.source.join(page).is_file();
            if !found {
                debug!("html"; "{} not found, skipping", page.display());
            }
            found
        })
        .collect();

    if pages.is_empty() {
        return Ok(StageOutput::Skipped(format!(
            "no entry page in {}",
            config.source.display()
        )));
    }

    let mut items = Vec::with_capacity(pages.len());
    for page in pages {
        let src = config.source.join(page);
        let html =
            fs::read_to_string(&src).with_context(|| format!("failed to read {}", src.display()))?;

        let minified = minify_html(&rewrite_references(&html, refs));
        write_output(&config.output.join(page), &minified)?;

        log!("html"; "{} ({} -> {} bytes)", page.display(), html.len(), minified.len());
        items.push(ItemReport::written(page, page));
    }

    Ok(StageOutput::done(items))
}
