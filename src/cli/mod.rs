//! CLI command handling module
//!
//! Handles all CLI subcommands and argument parsing.

mod config;
mod install;
mod interrupt;
mod logging;
mod version;

pub use config::{ConfigSubcommand, handle_config_command};
pub use install::{InstallArgs, handle_check_command, handle_install_command};
pub use interrupt::{INTERRUPTED_EXIT_CODE, watch_interrupts};
pub use logging::*;
pub use version::display_version;
