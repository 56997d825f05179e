//! HTML processing for the final pipeline stage.
//!
//! - [`rewrite`]: point asset references at minified outputs
//! - [`minify`]: strip comments, collapse whitespace, drop redundant attributes

pub mod minify;
pub mod rewrite;

pub use minify::minify_html;
pub use rewrite::{ReferenceMaps, rewrite_references};
