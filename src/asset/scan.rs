//! Asset scanning functions (read-only, no side effects).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use jwalk::{Parallelism, WalkDir};

use super::AssetClass;

/// Files of one class directly inside `dir`, sorted by name.
///
/// Subdirectories are not descended into.
pub fn list_files(dir: &Path, class: AssetClass) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && class.matches(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Every file under `root`, in sorted depth-first order.
///
/// Directories whose path is in `skip_dirs` or whose name is in `skip_names`
/// are pruned before they are read. Unreadable entries are skipped.
pub fn walk_files(root: &Path, skip_dirs: Vec<PathBuf>, skip_names: Vec<String>) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort(true)
        .parallelism(Parallelism::Serial)
        .process_read_dir(move |_, _, _, children| {
            children.retain(|entry| {
                let Ok(entry) = entry else { return true };
                if !entry.file_type().is_dir() {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                !skip_names.iter().any(|n| *n == name) && !skip_dirs.contains(&entry.path())
            });
        })
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_files_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.css"), "").unwrap();
        fs::write(dir.path().join("a.css"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir(dir.path().join("nested.css")).unwrap();

        let files = list_files(dir.path(), AssetClass::Css).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["a.css", "b.css"]);
    }

    #[test]
    fn test_list_files_missing_dir() {
        assert!(list_files(Path::new("/nonexistent/css"), AssetClass::Css).is_err());
    }

    #[test]
    fn test_walk_files_prunes() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("data/deep")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::create_dir_all(root.join("dist")).unwrap();
        fs::write(root.join("data/deep/a.json"), "{}").unwrap();
        fs::write(root.join("top.json"), "{}").unwrap();
        fs::write(root.join("node_modules/pkg/package.json"), "{}").unwrap();
        fs::write(root.join("dist/out.json"), "{}").unwrap();

        let files = walk_files(root, vec![root.join("dist")], vec!["node_modules".into()]);
        let rel: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            rel,
            vec![PathBuf::from("data/deep/a.json"), PathBuf::from("top.json")]
        );
    }
}
