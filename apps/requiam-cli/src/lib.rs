//! requiam command-line application
//!
//! Loads the YAML configuration, initializes logging and runs one of the
//! reconciliation commands against the campus directory and Grouper.

pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;

pub use config::{AppConfig, DEFAULT_CONFIG_PATH};
pub use error::{CliError, CliResult};
