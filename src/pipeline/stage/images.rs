//! Image stage: lossy PNG compression under `assets/`.
//!
//! Filenames are kept. Any decode or encode failure abandons compression and
//! the whole tree is copied verbatim instead.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::{StageOutput, copy_tree, write_output};
use crate::asset::{AssetClass, Compressed, QualityRange, compress_png, walk_files};
use crate::config::BuildConfig;
use crate::pipeline::report::ItemReport;
use crate::{debug, log};

pub fn run(config: &BuildConfig) -> Result<StageOutput> {
    let dir = AssetClass::Images.directory().unwrap_or("assets");
    let src = config.source.join(dir);
    let dest = config.output.join(dir);

    if !src.is_dir() {
        return Ok(StageOutput::Skipped(format!("{} not found", src.display())));
    }
    fs::create_dir_all(&dest)
        .with_context(|| format!("failed to create directory {}", dest.display()))?;

    let items = match compress_tree(&src, &dest, config.images.quality_range()) {
        Ok(items) => items,
        Err(e) => {
            log!("images"; "compression failed, copying originals: {:#}", e);
            copy_tree(&src, &dest, "copied after compression failure")?
        }
    };
    Ok(StageOutput::done(items))
}

fn compress_tree(src: &Path, dest: &Path, range: QualityRange) -> Result<Vec<ItemReport>> {
    let mut items = Vec::new();

    for path in walk_files(src, Vec::new(), Vec::new()) {
        let rel = path.strip_prefix(src)?;
        let bytes = fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
        let target = dest.join(rel);

        if !AssetClass::Images.matches(&path) {
            write_output(&target, &bytes)?;
            items.push(ItemReport::written(rel, rel));
            continue;
        }

        let compressed = compress_png(&bytes, range)
            .with_context(|| format!("failed to compress {}", rel.display()))?;
        match compressed {
            Compressed::Smaller(data) => {
                debug!("images"; "{}: {} -> {} bytes", rel.display(), bytes.len(), data.len());
                write_output(&target, &data)?;
                items.push(ItemReport::written(rel, rel));
            }
            Compressed::NotSmaller => {
                write_output(&target, &bytes)?;
                items.push(ItemReport::fallback(rel, rel, "already optimal"));
            }
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::report::ItemOutcome;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn config(root: &Path) -> BuildConfig {
        BuildConfig {
            source: root.join("src"),
            output: root.join("dist"),
            ..BuildConfig::default()
        }
    }

    fn items(output: StageOutput) -> Vec<ItemReport> {
        match output {
            StageOutput::Done { items, mapping } => {
                assert!(mapping.is_empty());
                items
            }
            StageOutput::Skipped(reason) => panic!("unexpected skip: {reason}"),
        }
    }

    #[test]
    fn test_missing_assets_dir_skips() {
        let dir = TempDir::new().unwrap();
        let out = run(&config(dir.path())).unwrap();
        assert!(matches!(out, StageOutput::Skipped(_)));
    }

    #[test]
    fn test_empty_assets_dir() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src/assets")).unwrap();
        let items = items(run(&config(dir.path())).unwrap());
        assert!(items.is_empty());
        assert!(dir.path().join("dist/assets").is_dir());
    }

    #[test]
    fn test_valid_png_keeps_name() {
        let dir = TempDir::new().unwrap();
        let assets = dir.path().join("src/assets");
        fs::create_dir_all(&assets).unwrap();
        let img =
            image::RgbImage::from_fn(32, 32, |x, y| image::Rgb([x as u8 * 8, y as u8 * 8, 90]));
        img.save(assets.join("logo.png")).unwrap();
        fs::write(assets.join("favicon.ico"), b"ico").unwrap();

        let items = items(run(&config(dir.path())).unwrap());
        assert_eq!(items.len(), 2);
        assert!(
            items
                .iter()
                .all(|i| !matches!(i.outcome, ItemOutcome::Failed { .. }))
        );
        assert!(dir.path().join("dist/assets/logo.png").is_file());
        assert_eq!(fs::read(dir.path().join("dist/assets/favicon.ico")).unwrap(), b"ico");
        assert!(!dir.path().join("dist/assets/logo.min.png").exists());
    }

    #[test]
    fn test_corrupt_png_falls_back_to_copy() {
        let dir = TempDir::new().unwrap();
        let assets = dir.path().join("src/assets/icons");
        fs::create_dir_all(&assets).unwrap();
        fs::write(assets.join("broken.png"), b"not a png").unwrap();
        fs::write(dir.path().join("src/assets/readme.txt"), b"hello").unwrap();

        let items = items(run(&config(dir.path())).unwrap());
        assert_eq!(items.len(), 2);
        assert!(
            items
                .iter()
                .all(|i| matches!(i.outcome, ItemOutcome::Fallback { .. }))
        );
        assert_eq!(
            fs::read(dir.path().join("dist/assets/icons/broken.png")).unwrap(),
            b"not a png"
        );
        assert_eq!(items[0].source, PathBuf::from("icons/broken.png"));
    }
}
