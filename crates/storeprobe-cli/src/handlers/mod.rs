//! Command handlers, kept out of main.rs for testability

pub mod run;
pub mod send_report;

pub use run::{execute_run, overrides};
pub use send_report::{execute_send_report, should_send};
