//! HTML minification via `minify-html`.
//!
//! Comments are stripped, whitespace is collapsed (kept inside `pre` and
//! `textarea`), empty and default-valued attributes are dropped, and inline
//! `<style>` and JavaScript `<script>` bodies are minified. Data scripts such
//! as `application/ld+json` pass through untouched.

use minify_html::{Cfg, minify};

use crate::debug;

fn config() -> Cfg {
    let mut cfg = Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    cfg.minify_js = true;
    cfg.remove_bangs = true;
    cfg.remove_processing_instructions = true;
    cfg
}

/// Minify an HTML document. Output that is not UTF-8 falls back to the input.
pub fn minify_html(html: &str) -> String {
    let bytes = minify(html.as_bytes(), &config());
    String::from_utf8(bytes).unwrap_or_else(|e| {
        debug!("html"; "minified output is not UTF-8, keeping original: {}", e);
        html.to_owned()
    })
}
