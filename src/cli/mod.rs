//! CLI command handling module
//!
//! Handles the `version` and `config` subcommands and debug logging setup.

mod commands;
mod logging;
mod version;

pub use commands::{ConfigSubcommand, handle_config_command};
pub use logging::init_logging;
pub use version::display_version;
