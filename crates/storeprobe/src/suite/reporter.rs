//! Run-level test records and the HTML report.

use crate::error::PageResult;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Test result status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    /// Test passed
    Passed,
    /// Test failed
    Failed,
    /// Test was skipped
    Skipped,
}

impl TestStatus {
    /// Check if status is passing
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Check if status is failing
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Lowercase label used in result files
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

/// Outcome of one scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRecord {
    /// Scenario name
    pub name: String,
    /// Final status
    pub status: TestStatus,
    /// Wall time from driver creation to teardown
    pub duration: Duration,
    /// Error message if failed
    pub error: Option<String>,
    /// Scenario tags
    pub tags: Vec<String>,
    /// Failure screenshot
    pub screenshot: Option<PathBuf>,
    /// Recorded video
    pub video: Option<PathBuf>,
    /// When the scenario started
    pub started_at: DateTime<Utc>,
}

impl TestRecord {
    fn with_status(name: impl Into<String>, status: TestStatus, duration: Duration) -> Self {
        let started_at = Utc::now() - to_chrono(duration);
        Self {
            name: name.into(),
            status,
            duration,
            error: None,
            tags: Vec::new(),
            screenshot: None,
            video: None,
            started_at,
        }
    }

    /// Create a passing record
    #[must_use]
    pub fn passed(name: impl Into<String>, duration: Duration) -> Self {
        Self::with_status(name, TestStatus::Passed, duration)
    }

    /// Create a failing record
    #[must_use]
    pub fn failed(name: impl Into<String>, duration: Duration, error: impl Into<String>) -> Self {
        let mut record = Self::with_status(name, TestStatus::Failed, duration);
        record.error = Some(error.into());
        record
    }

    /// Create a skipped record
    #[must_use]
    pub fn skipped(name: impl Into<String>) -> Self {
        Self::with_status(name, TestStatus::Skipped, Duration::ZERO)
    }

    #[must_use]
    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| (*t).to_string()).collect();
        self
    }

    #[must_use]
    pub fn with_screenshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.screenshot = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_video(mut self, path: impl Into<PathBuf>) -> Self {
        self.video = Some(path.into());
        self
    }

    /// Completion time
    #[must_use]
    pub fn finished_at(&self) -> DateTime<Utc> {
        self.started_at + to_chrono(self.duration)
    }
}

/// Collects scenario records and renders the run report
#[derive(Debug)]
pub struct Reporter {
    results: Vec<TestRecord>,
    suite_name: String,
    start_time: Option<DateTime<Local>>,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
            suite_name: "Storefront Test Suite".to_string(),
            start_time: None,
        }
    }

    /// Set suite name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.suite_name = name.into();
        self
    }

    /// Mark the start of the run
    pub fn start(&mut self) {
        self.start_time = Some(Local::now());
    }

    /// Record a scenario result
    pub fn record(&mut self, result: TestRecord) {
        self.results.push(result);
    }

    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.status.is_passed()).count()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| r.status.is_failed()).count()
    }

    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == TestStatus::Skipped)
            .count()
    }

    #[must_use]
    pub fn total_count(&self) -> usize {
        self.results.len()
    }

    /// Pass rate (0.0 to 1.0), zero for an empty run
    #[must_use]
    pub fn pass_rate(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        self.passed_count() as f64 / self.results.len() as f64
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed_count() == 0
    }

    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.results.iter().map(|r| r.duration).sum()
    }

    #[must_use]
    pub fn results(&self) -> &[TestRecord] {
        &self.results
    }

    #[must_use]
    pub fn failures(&self) -> Vec<&TestRecord> {
        self.results
            .iter()
            .filter(|r| r.status.is_failed())
            .collect()
    }

    /// One-line summary
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}: {}/{} passed ({:.1}%)",
            self.suite_name,
            self.passed_count(),
            self.total_count(),
            self.pass_rate() * 100.0
        )
    }

    /// Write the HTML report to `output_path`
    pub fn generate_html(&self, output_path: &Path) -> PageResult<()> {
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(output_path, self.render_html())?;
        Ok(())
    }

    /// Render the HTML report
    #[must_use]
    pub fn render_html(&self) -> String {
        let mut html = String::new();

        html.push_str(&format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{}</title>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 20px; }}
        .summary {{ background: #f5f5f5; padding: 20px; border-radius: 8px; margin-bottom: 20px; }}
        .progress-bar {{ background: #ddd; height: 20px; border-radius: 10px; overflow: hidden; }}
        .passed {{ background: #28a745; height: 100%; }}
        .test {{ padding: 10px; margin: 5px 0; border-radius: 4px; }}
        .test.pass {{ background: #e8f5e9; border-left: 4px solid #28a745; }}
        .test.fail {{ background: #ffebee; border-left: 4px solid #dc3545; }}
        .test.skip {{ background: #fff3e0; border-left: 4px solid #ffc107; }}
        .tags {{ color: #666; font-size: 12px; }}
        .error {{ color: #d32f2f; font-family: monospace; white-space: pre-wrap; }}
    </style>
</head>
<body>
"#,
            escape_html(&self.suite_name)
        ));

        let started = self
            .start_time
            .map_or_else(String::new, |t| t.format("%Y-%m-%d %H:%M:%S").to_string());
        html.push_str(&format!(
            r#"<div class="summary">
    <h1>{}</h1>
    <h2>Results: {}/{} passed ({:.1}%)</h2>
    <div class="progress-bar">
        <div class="passed" style="width: {:.1}%"></div>
    </div>
    <p>Failed: {} &middot; Skipped: {} &middot; Duration: {:.2}s</p>
    <p>Started: {}</p>
</div>
"#,
            escape_html(&self.suite_name),
            self.passed_count(),
            self.total_count(),
            self.pass_rate() * 100.0,
            self.pass_rate() * 100.0,
            self.failed_count(),
            self.skipped_count(),
            self.total_duration().as_secs_f64(),
            started
        ));

        html.push_str("<h2>Test Results</h2>\n");
        for result in &self.results {
            let class = match result.status {
                TestStatus::Passed => "pass",
                TestStatus::Failed => "fail",
                TestStatus::Skipped => "skip",
            };

            html.push_str(&format!(
                r#"<div class="test {}">
    <strong>{}</strong> - {} ({:.2}s)
"#,
                class,
                escape_html(&result.name),
                result.status,
                result.duration.as_secs_f64()
            ));

            if !result.tags.is_empty() {
                html.push_str(&format!(
                    r#"    <div class="tags">{}</div>
"#,
                    escape_html(&result.tags.join(", "))
                ));
            }
            if let Some(error) = &result.error {
                html.push_str(&format!(
                    r#"    <div class="error">{}</div>
"#,
                    escape_html(error)
                ));
            }
            for (label, path) in [("Screenshot", &result.screenshot), ("Video", &result.video)] {
                if let Some(path) = path {
                    let shown = escape_html(&path.display().to_string());
                    html.push_str(&format!(
                        r#"    <div>{label}: <a href="{shown}">{shown}</a></div>
"#
                    ));
                }
            }

            html.push_str("</div>\n");
        }

        html.push_str("</body>\n</html>\n");
        html
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::zero())
}

/// Escape HTML special characters
pub(crate) fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
