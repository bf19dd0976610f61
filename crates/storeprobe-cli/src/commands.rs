//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Storeprobe: browser test suite for e-commerce storefronts
#[derive(Parser, Debug)]
#[command(name = "storeprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (warnings and errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the storefront scenarios
    Run(RunArgs),

    /// Email the summary of the last run
    SendReport(SendReportArgs),
}

/// Arguments for the run command
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Browser to drive (chrome, firefox)
    #[arg(long)]
    pub browser: Option<String>,

    /// Run without a visible browser window
    #[arg(long)]
    pub headless: bool,

    /// Storefront base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Output directory for logs, screenshots, videos and results
    #[arg(long)]
    pub reports_dir: Option<PathBuf>,

    /// Only run scenarios with this tag or whose name contains it
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Do not record videos
    #[arg(long)]
    pub no_video: bool,
}

/// Arguments for the send-report command
#[derive(Args, Debug, Default)]
pub struct SendReportArgs {
    /// Reports directory of the run to summarize
    #[arg(long)]
    pub reports_dir: Option<PathBuf>,
}

/// Log level selected by `-q` / `-v`
#[must_use]
pub const fn log_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "warn";
    }
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::parse_from([
            "storeprobe",
            "-v",
            "run",
            "--browser",
            "firefox",
            "--headless",
            "--base-url",
            "https://shop.test",
            "--filter",
            "smoke",
            "--no-video",
        ]);
        assert_eq!(cli.verbose, 1);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.browser.as_deref(), Some("firefox"));
        assert!(args.headless);
        assert!(args.no_video);
        assert_eq!(args.filter.as_deref(), Some("smoke"));
        assert!(args.reports_dir.is_none());
    }

    #[test]
    fn test_parse_send_report() {
        let cli = Cli::parse_from(["storeprobe", "send-report", "--reports-dir", "out", "-q"]);
        assert!(cli.quiet);
        let Commands::SendReport(args) = cli.command else {
            panic!("expected send-report");
        };
        assert_eq!(args.reports_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(0, false), "info");
        assert_eq!(log_level(1, false), "debug");
        assert_eq!(log_level(3, false), "trace");
        assert_eq!(log_level(2, true), "warn");
    }
}
