//! Asset reference rewriting.
//!
//! Substitutes attribute-value patterns in the raw HTML text; the document is
//! never parsed. Recognized forms:
//!
//! ```text
//! href="css/<name>"                          -> href="css/<mapped>"
//! src="js/<name>"                            -> src="js/<mapped>"
//! src="<path>"  src="./<path>"               -> src="<mapped>"
//! src="./../<path>"  src="/<path>"           -> src="<mapped>"
//! ```
//!
//! Either quote character is accepted on input; output always uses double
//! quotes. A reference with whitespace inside the quotes, or any other
//! spelling, is left as written.

use std::borrow::Cow;

use regex::{NoExpand, Regex};

use crate::asset::FilenameMap;
use crate::{debug, log};

/// Path prefixes under which a JSON reference is recognized.
const JSON_PREFIXES: [&str; 4] = ["", "./", "./../", "/"];

/// Filename mappings consumed by the rewriter, one per referenced class.
#[derive(Debug, Clone, Default)]
pub struct ReferenceMaps {
    pub css: FilenameMap,
    pub js: FilenameMap,
    pub json: FilenameMap,
}

/// Rewrite every recognized reference in `html` to its mapped output name.
///
/// Names without a match in the document are not an error.
pub fn rewrite_references(html: &str, maps: &ReferenceMaps) -> String {
    let mut html = Cow::Borrowed(html);

    for (original, mapped) in maps.css.iter() {
        let replacement = format!("css/{mapped}");
        if let Some(out) = replace_attr(&html, "href", &[""], &format!("css/{original}"), &replacement) {
            log!("html"; "updated css reference: {} -> {}", original, mapped);
            html = Cow::Owned(out);
        }
    }

    for (original, mapped) in maps.js.iter() {
        let replacement = format!("js/{mapped}");
        if let Some(out) = replace_attr(&html, "src", &[""], &format!("js/{original}"), &replacement) {
            log!("html"; "updated js reference: {} -> {}", original, mapped);
            html = Cow::Owned(out);
        }
    }

    for (original, mapped) in maps.json.iter() {
        if let Some(out) = replace_attr(&html, "src", &JSON_PREFIXES, original, mapped) {
            log!("html"; "updated json reference: {} -> {}", original, mapped);
            html = Cow::Owned(out);
        }
    }

    html.into_owned()
}

/// Replace `attr="<prefix><target>"` for each prefix with `attr="<replacement>"`.
///
/// Returns `None` when nothing matched.
fn replace_attr(
    html: &str,
    attr: &str,
    prefixes: &[&str],
    target: &str,
    replacement: &str,
) -> Option<String> {
    let alternatives: Vec<_> = prefixes
        .iter()
        .map(|prefix| regex::escape(&format!("{prefix}{target}")))
        .collect();
    let pattern = format!(r#"{attr}=["'](?:{})["']"#, alternatives.join("|"));

    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            debug!("html"; "skipping reference `{}`: {}", target, e);
            return None;
        }
    };
    if !re.is_match(html) {
        return None;
    }
    let substitute = format!(r#"{attr}="{replacement}""#);
    Some(re.replace_all(html, NoExpand(&substitute)).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn maps() -> ReferenceMaps {
        ReferenceMaps {
            css: [("app.css", "app.min.css")].into_iter().collect(),
            js: [("app.js", "app.min.js")].into_iter().collect(),
            json: [("data/site.json", "data/site.min.json")].into_iter().collect(),
        }
    }

    #[test]
    fn test_rewrite_css_both_quotes() {
        let html = r#"<link href="css/app.css"><link href='css/app.css'>"#;
        assert_eq!(
            rewrite_references(html, &maps()),
            r#"<link href="css/app.min.css"><link href="css/app.min.css">"#
        );
    }

    #[test]
    fn test_rewrite_js_both_quotes() {
        let html = r#"<script src="js/app.js"></script><script src='js/app.js'></script>"#;
        assert_eq!(
            rewrite_references(html, &maps()),
            r#"<script src="js/app.min.js"></script><script src="js/app.min.js"></script>"#
        );
    }

    #[test]
    fn test_rewrite_json_all_path_forms_agree() {
        let forms = [
            r#"<x src="data/site.json">"#,
            r#"<x src="./data/site.json">"#,
            r#"<x src="./../data/site.json">"#,
            r#"<x src='/data/site.json'>"#,
        ];
        for form in forms {
            assert_eq!(
                rewrite_references(form, &maps()),
                r#"<x src="data/site.min.json">"#,
                "form: {form}"
            );
        }
    }

    #[test]
    fn test_unrecognized_references_unchanged() {
        let html = concat!(
            r#"<link href="css/other.css">"#,
            r#"<link href=" css/app.css">"#,
            r#"<link rel="stylesheet" href=css/app.css>"#,
            r#"<script src="app.js"></script>"#,
            r#"<a href="js/app.js">source</a>"#,
            r#"<img src="css/app.css">"#,
        );
        assert_eq!(rewrite_references(html, &maps()), html);
    }

    #[test]
    fn test_dot_in_name_is_literal() {
        let html = r#"<link href="css/appXcss">"#;
        assert_eq!(rewrite_references(html, &maps()), html);
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let html = r#"<link href="css/app.css"><script src="js/app.js"></script>"#;
        let once = rewrite_references(html, &maps());
        assert_eq!(rewrite_references(&once, &maps()), once);
    }

    #[test]
    fn test_replacement_is_literal() {
        let maps = ReferenceMaps {
            css: [("a.css", "$1.min.css")].into_iter().collect(),
            ..Default::default()
        };
        assert_eq!(
            rewrite_references(r#"<link href="css/a.css">"#, &maps),
            r#"<link href="css/$1.min.css">"#
        );
    }

    #[test]
    fn test_empty_maps_leave_document_alone() {
        let html = r#"<link href="css/app.css">"#;
        assert_eq!(rewrite_references(html, &ReferenceMaps::default()), html);
    }
}
