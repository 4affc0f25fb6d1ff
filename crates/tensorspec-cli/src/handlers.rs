//! Command handlers for CLI subcommands
//!
//! Each subcommand lives in its own module; this module re-exports the entry
//! points used by `main`.

mod completions;
mod config;
mod drivers;
mod kvstore;
mod utils;
mod validate;

pub use completions::handle_completions;
pub use config::handle_config;
pub use drivers::handle_drivers;
pub use kvstore::handle_kvstore;
pub use validate::handle_validate;
