//! CLI command handling module
//!
//! Handles all CLI subcommands and argument parsing.

mod commands;
mod datasource;
mod logging;
mod version;

pub use commands::{ConfigSubcommand, handle_config_command};
pub use datasource::{DatasourceCommand, handle_datasource_command};
pub use logging::*;
pub use version::display_version;
