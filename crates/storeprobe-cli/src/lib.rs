//! Storeprobe CLI library
//!
//! Command-line interface for running the storefront suite and mailing
//! its report.

mod commands;
mod error;
pub mod handlers;
pub mod logging;

pub use commands::{log_level, Cli, Commands, RunArgs, SendReportArgs};
pub use error::{CliError, CliResult};
