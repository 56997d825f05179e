//! Asset class definitions.

use std::path::Path;

/// Class of asset handled by one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetClass {
    /// PNG images under `assets/`.
    Images,
    /// Stylesheets under `css/`.
    Css,
    /// Scripts under `js/`.
    Js,
    /// JSON documents anywhere in the source tree.
    Json,
    /// HTML entry pages.
    Html,
}

impl AssetClass {
    /// Stage execution order. Every class the HTML stage depends on runs first.
    pub const PIPELINE: [Self; 5] = [Self::Images, Self::Css, Self::Js, Self::Json, Self::Html];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Images => "images",
            Self::Css => "css",
            Self::Js => "js",
            Self::Json => "json",
            Self::Html => "html",
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Images => "png",
            Self::Css => "css",
            Self::Js => "js",
            Self::Json => "json",
            Self::Html => "html",
        }
    }

    /// Directory under the source/destination roots, for classes that have one.
    pub const fn directory(self) -> Option<&'static str> {
        match self {
            Self::Images => Some("assets"),
            Self::Css => Some("css"),
            Self::Js => Some("js"),
            Self::Json | Self::Html => None,
        }
    }

    /// Whether `path` carries this class's extension (case-insensitive).
    pub fn matches(self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(self.extension()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_order() {
        let labels: Vec<_> = AssetClass::PIPELINE.iter().map(|c| c.label()).collect();
        assert_eq!(labels, ["images", "css", "js", "json", "html"]);
    }

    #[test]
    fn test_matches_extension() {
        assert!(AssetClass::Css.matches(Path::new("css/app.css")));
        assert!(AssetClass::Css.matches(Path::new("LEGACY.CSS")));
        assert!(!AssetClass::Css.matches(Path::new("app.scss")));
        assert!(AssetClass::Images.matches(Path::new("assets/logo.png")));
        assert!(!AssetClass::Json.matches(Path::new("json")));
    }
}
