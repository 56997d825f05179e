//! JSON stage.
//!
//! Walks the whole source tree. Outputs keep their relative directory and
//! gain the `.min` marker. Malformed documents are written unmodified under
//! the minified name, so references to them are still rewritten.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::{StageOutput, write_output};
use crate::asset::minify::minify_json;
use crate::asset::{AssetClass, FilenameMap, is_minified, min_name, relative_slash, walk_files};
use crate::config::BuildConfig;
use crate::pipeline::report::ItemReport;
use crate::{debug, log};

pub fn run(config: &BuildConfig) -> Result<StageOutput> {
    if !config.source.is_dir() {
        return Ok(StageOutput::Skipped(format!(
            "{} not found",
            config.source.display()
        )));
    }
    let source = fs::canonicalize(&config.source)
        .with_context(|| format!("failed to resolve {}", config.source.display()))?;
    let output = fs::canonicalize(&config.output)
        .with_context(|| format!("failed to resolve {}", config.output.display()))?;

    let files: Vec<_> = walk_files(&source, vec![output.clone()], Vec::new())
        .into_iter()
        .filter(|p| AssetClass::Json.matches(p))
        .collect();

    let mut items = Vec::with_capacity(files.len());
    let mut mapping = FilenameMap::new();

    for path in files {
        let Some(rel) = relative_slash(&path, &source) else {
            debug!("json"; "skipping {}", path.display());
            continue;
        };
        let already_min = is_minified(&path);
        let out_rel = if already_min { rel.clone() } else { min_name(&rel) };

        match process_file(&path, &output.join(&out_rel), !already_min) {
            Ok(None) => items.push(ItemReport::written(&rel, &out_rel)),
            Ok(Some(reason)) => {
                log!("json"; "{} is not valid JSON, copied as is: {}", rel, reason);
                items.push(ItemReport::fallback(&rel, &out_rel, reason));
            }
            Err(e) => {
                log!("error"; "{}: {:#}", rel, e);
                items.push(ItemReport::failed(&rel, format!("{e:#}")));
                continue;
            }
        }
        if !already_min {
            debug!("json"; "{} -> {}", rel, out_rel);
            mapping.insert(rel, out_rel);
        }
    }

    Ok(StageOutput::Done { items, mapping })
}

/// Write one document. Returns the fallback reason when the original bytes
/// were written instead of the minified form.
fn process_file(path: &Path, target: &Path, minify: bool) -> Result<Option<String>> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    if !minify {
        write_output(target, &bytes)?;
        return Ok(None);
    }

    let minified = std::str::from_utf8(&bytes)
        .map_err(|e| e.to_string())
        .and_then(|text| minify_json(text).map_err(|e| e.to_string()));
    match minified {
        Ok(text) => {
            write_output(target, text)?;
            Ok(None)
        }
        Err(reason) => {
            write_output(target, &bytes)?;
            Ok(Some(reason))
        }
    }
}
