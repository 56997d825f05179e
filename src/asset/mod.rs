//! Asset classes, output naming, and the per-class transformations.

mod kind;
mod mapping;
pub mod minify;
mod naming;
mod png;
mod scan;

// Types
pub use kind::AssetClass;
pub use mapping::FilenameMap;
pub use png::{Compressed, QualityRange, compress_png};

// Naming (pure functions)
pub use naming::{is_minified, min_name, relative_slash};

// Scanning (read-only filesystem access)
pub use scan::{list_files, walk_files};
