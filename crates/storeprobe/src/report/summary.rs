//! Best-effort run summary reconstructed from the reports directory.

use crate::config::SessionConfig;
use crate::suite::results::count_result_files;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

/// Pass/fail counts plus the session they were produced under
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub browser: String,
    pub headless: bool,
    pub base_url: String,
    pub generated_at: DateTime<Local>,
}

impl RunSummary {
    /// Empty summary for `config`
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            passed: 0,
            failed: 0,
            skipped: 0,
            browser: config.browser.to_string(),
            headless: config.headless,
            base_url: config.base_url.clone(),
            generated_at: Local::now(),
        }
    }

    #[must_use]
    pub const fn with_counts(mut self, passed: usize, failed: usize, skipped: usize) -> Self {
        self.passed = passed;
        self.failed = failed;
        self.skipped = skipped;
        self
    }

    /// Count status lines in `<dir>/test.log`.
    ///
    /// When the log yields neither passes nor failures, every
    /// `allure-results/*-result.json` file is counted as a pass.
    #[must_use]
    pub fn from_reports_dir(dir: &Path, config: &SessionConfig) -> Self {
        let mut summary = Self::new(config);

        let log = dir.join("test.log");
        if log.exists() {
            match std::fs::read(&log) {
                Ok(bytes) => {
                    let counts = count_status_lines(&String::from_utf8_lossy(&bytes));
                    summary = summary.with_counts(counts.0, counts.1, counts.2);
                }
                Err(e) => warn!("Could not read test log {}: {}", log.display(), e),
            }
        }

        if summary.passed == 0 && summary.failed == 0 {
            summary.passed = count_result_files(&dir.join("allure-results"));
        }

        info!(
            "Parsed results: {} passed, {} failed, {} skipped",
            summary.passed, summary.failed, summary.skipped
        );
        summary
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    /// Pass rate in percent, `0.0` for an empty run
    #[must_use]
    pub fn pass_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.passed as f64 / total as f64 * 100.0
    }
}

/// `(passed, failed, skipped)` lines: a line counts when its last word is
/// one of the statuses, compared case-insensitively.
#[must_use]
pub fn count_status_lines(log: &str) -> (usize, usize, usize) {
    log.lines()
        .filter_map(|line| line.split_whitespace().last())
        .fold((0, 0, 0), |(p, f, s), word| {
            let word = word.trim_matches(|c: char| !c.is_ascii_alphabetic());
            if word.eq_ignore_ascii_case("passed") {
                (p + 1, f, s)
            } else if word.eq_ignore_ascii_case("failed") {
                (p, f + 1, s)
            } else if word.eq_ignore_ascii_case("skipped") {
                (p, f, s + 1)
            } else {
                (p, f, s)
            }
        })
}
