//! Process-wide state shared by every command.

mod state;

pub use state::{is_shutdown, setup_shutdown_handler};
