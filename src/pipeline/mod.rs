//! Build pipeline.
//!
//! Runs one stage per asset class in a fixed order and threads the CSS, JS
//! and JSON filename mappings into the HTML stage.
//!
//! ```text
//! images ─┐
//! css ────┼── mappings ──► html (rewrite + minify)
//! js ─────┤
//! json ───┘
//! ```
//!
//! A failing stage is recorded and the remaining stages still run. The HTML
//! stage then sees whatever mappings the earlier stages produced, so a failed
//! CSS stage leaves CSS references pointing at the original names.

mod report;
mod stage;

pub use report::BuildReport;

use std::fs;

use anyhow::{Context, Result};

use crate::asset::AssetClass;
use crate::config::BuildConfig;
use crate::core::is_shutdown;
use crate::html::ReferenceMaps;
use crate::{debug, log};
use report::StageReport;
use stage::StageOutput;

/// Build the minified mirror of `config.source` under `config.output`.
///
/// Only failing to create the destination root is an error; stage failures
/// are reported in the returned `BuildReport`.
pub fn run_pipeline(config: &BuildConfig) -> Result<BuildReport> {
    fs::create_dir_all(&config.output).with_context(|| {
        format!(
            "failed to create output directory {}",
            config.output.display()
        )
    })?;

    let mut refs = ReferenceMaps::default();
    let mut stages = Vec::with_capacity(AssetClass::PIPELINE.len());

    for class in AssetClass::PIPELINE {
        if is_shutdown() {
            stages.push(StageReport::skipped(class, "interrupted"));
            continue;
        }

        let result = match class {
            AssetClass::Images => stage::run_images(config),
            AssetClass::Css | AssetClass::Js => stage::run_code(class, config),
            AssetClass::Json => stage::run_json(config),
            AssetClass::Html => stage::run_html(config, &refs),
        };

        let report = match result {
            Ok(StageOutput::Skipped(reason)) => {
                log!("build"; "{} skipped: {}", class.label(), reason);
                StageReport::skipped(class, reason)
            }
            Ok(StageOutput::Done { items, mapping }) => {
                if !mapping.is_empty() {
                    debug!("build"; "{} mapping: {} entries", class.label(), mapping.len());
                }
                match class {
                    AssetClass::Css => refs.css = mapping,
                    AssetClass::Js => refs.js = mapping,
                    AssetClass::Json => refs.json = mapping,
                    AssetClass::Images | AssetClass::Html => {}
                }
                StageReport::completed(class, items)
            }
            Err(e) => {
                log!("error"; "{} stage failed: {:#}", class.label(), e);
                StageReport::failed(class, format!("{e:#}"))
            }
        };
        stages.push(report);
    }

    Ok(BuildReport {
        output: config.output.clone(),
        stages,
    })
}
