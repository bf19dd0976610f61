//! `storeprobe run`

use crate::commands::RunArgs;
use crate::error::{CliError, CliResult};
use crate::logging;
use console::style;
use std::sync::Arc;
use storeprobe::{BrowserKind, DriverFactory, Overrides, Reporter, SessionConfig, SuiteRunner};

/// Translate command-line flags into configuration overrides
pub fn overrides(args: &RunArgs) -> CliResult<Overrides> {
    let browser = args
        .browser
        .as_deref()
        .map(str::parse::<BrowserKind>)
        .transpose()?;
    Ok(Overrides {
        browser,
        headless: args.headless.then_some(true),
        base_url: args.base_url.clone(),
        reports_dir: args.reports_dir.clone(),
        record_video: args.no_video.then_some(false),
    })
}

/// Resolve configuration, run the suite and print the summary.
///
/// Fails when any scenario failed.
pub fn execute_run(args: &RunArgs, level: &str) -> CliResult<()> {
    let config = SessionConfig::from_env()?.with_overrides(overrides(args)?);
    logging::init(level, Some(&config.log_path()))?;
    let config = Arc::new(config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let factory = DriverFactory::new(Arc::clone(&config));
    let runner = SuiteRunner::new(Arc::clone(&config), Arc::new(factory));
    let reporter = runtime.block_on(runner.run(args.filter.as_deref()))?;

    print_summary(&reporter, &config);
    if reporter.failed_count() > 0 {
        return Err(CliError::TestsFailed {
            failed: reporter.failed_count(),
            total: reporter.total_count(),
        });
    }
    Ok(())
}

fn print_summary(reporter: &Reporter, config: &SessionConfig) {
    println!();
    for record in reporter.results() {
        let status = if record.status.is_failed() {
            style(record.status.to_string()).red().bold()
        } else {
            style(record.status.to_string()).green().bold()
        };
        println!("  {status} {} ({:.1}s)", record.name, record.duration.as_secs_f64());
    }
    println!();
    println!("{}", style(reporter.summary()).bold());
    println!(
        "Report: {}",
        config.reports_dir.join(storeprobe::suite::runner::REPORT_FILE).display()
    );
}
