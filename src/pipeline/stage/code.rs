//! CSS and JS stages.
//!
//! Every file in the class directory is minified in memory before anything
//! is written, so a syntax error leaves the stage with no output and no
//! mapping. Files already named `*.min.*` are copied unchanged.

use std::fs;

use anyhow::{Context, Result, bail};

use super::{StageOutput, file_name, write_output};
use crate::asset::minify::{MinifyError, minify_css, minify_js};
use crate::asset::{AssetClass, FilenameMap, is_minified, list_files, min_name};
use crate::config::BuildConfig;
use crate::log;
use crate::pipeline::report::ItemReport;

/// One file ready to be written.
struct Prepared {
    name: String,
    output: String,
    contents: Vec<u8>,
    /// Recorded in the filename mapping.
    mapped: bool,
}

pub fn run(class: AssetClass, config: &BuildConfig) -> Result<StageOutput> {
    let minify: fn(&str) -> Result<String, MinifyError> = match class {
        AssetClass::Css => minify_css,
        AssetClass::Js => minify_js,
        _ => bail!("{} is not a code asset", class.label()),
    };
    let Some(dir) = class.directory() else {
        bail!("{} has no source directory", class.label());
    };

    let src = config.source.join(dir);
    if !src.is_dir() {
        return Ok(StageOutput::Skipped(format!("{} not found", src.display())));
    }
    let files = list_files(&src, class).with_context(|| format!("failed to read {}", src.display()))?;

    let mut prepared = Vec::with_capacity(files.len());
    for path in &files {
        let name = file_name(path)?.to_owned();
        if is_minified(path) {
            let contents =
                fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            prepared.push(Prepared {
                output: name.clone(),
                name,
                contents,
                mapped: false,
            });
            continue;
        }

        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let code = minify(&source).with_context(|| format!("failed to minify {dir}/{name}"))?;
        prepared.push(Prepared {
            output: min_name(&name),
            name,
            contents: code.into_bytes(),
            mapped: true,
        });
    }

    let dest = config.output.join(dir);
    fs::create_dir_all(&dest)
        .with_context(|| format!("failed to create directory {}", dest.display()))?;

    let mut items = Vec::with_capacity(prepared.len());
    let mut mapping = FilenameMap::new();
    for file in prepared {
        write_output(&dest.join(&file.output), &file.contents)?;
        if file.mapped {
            log!(class.label(); "{} -> {}", file.name, file.output);
            mapping.insert(file.name.as_str(), file.output.as_str());
        }
        items.push(ItemReport::written(
            format!("{dir}/{}", file.name),
            format!("{dir}/{}", file.output),
        ));
    }

    Ok(StageOutput::Done { items, mapping })
}
