//! Storeprobe CLI
//!
//! ## Usage
//!
//! ```bash
//! storeprobe run                          # Run every scenario
//! storeprobe run --filter smoke --headless
//! storeprobe send-report                  # Mail the last run's summary
//! ```

use clap::Parser;
use std::process::ExitCode;
use storeprobe_cli::{handlers, log_level, Cli, CliResult, Commands};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let level = log_level(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Run(args) => handlers::execute_run(&args, level),
        Commands::SendReport(args) => handlers::execute_send_report(&args, level),
    }
}
