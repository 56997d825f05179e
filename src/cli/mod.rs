//! Command-line interface module.

mod args;
pub mod audit;
pub mod build;

pub use args::{A11yArgs, BuildArgs, Cli, Commands, CssArgs};
