//! Output naming: the `.min` marker and slash-separated relative paths.

use std::path::{Component, Path};

/// Insert `.min` before the final extension of the last path segment.
///
/// ```text
/// app.css           -> app.min.css
/// data/site.json    -> data/site.min.json
/// jquery.ui.js      -> jquery.ui.min.js
/// LICENSE           -> LICENSE.min
/// ```
pub fn min_name(name: &str) -> String {
    let file_start = name.rfind('/').map_or(0, |i| i + 1);
    match name[file_start..].rfind('.') {
        // a leading dot marks a hidden file, not an extension
        Some(dot) if dot > 0 => {
            let at = file_start + dot;
            format!("{}.min{}", &name[..at], &name[at..])
        }
        _ => format!("{name}.min"),
    }
}

/// Whether the file already carries the `.min` marker (`app.min.js`).
pub fn is_minified(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.ends_with(".min"))
}

/// `path` relative to `base`, joined with `/` regardless of platform.
///
/// Returns `None` when `path` is not under `base` or is not valid UTF-8.
pub fn relative_slash(path: &Path, base: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_name() {
        assert_eq!(min_name("app.css"), "app.min.css");
        assert_eq!(min_name("app.js"), "app.min.js");
        assert_eq!(min_name("data/site.json"), "data/site.min.json");
        assert_eq!(min_name("jquery.ui.js"), "jquery.ui.min.js");
        assert_eq!(min_name("v1.2/config.json"), "v1.2/config.min.json");
        assert_eq!(min_name("LICENSE"), "LICENSE.min");
        assert_eq!(min_name(".eslintrc"), ".eslintrc.min");
    }

    #[test]
    fn test_is_minified() {
        assert!(is_minified(Path::new("css/app.min.css")));
        assert!(!is_minified(Path::new("css/app.css")));
        assert!(!is_minified(Path::new("css/admin.css")));
    }

    #[test]
    fn test_relative_slash() {
        let base = Path::new("/site/src");
        assert_eq!(
            relative_slash(Path::new("/site/src/data/site.json"), base),
            Some("data/site.json".to_string())
        );
        assert_eq!(relative_slash(Path::new("/elsewhere/x.json"), base), None);
    }
}
