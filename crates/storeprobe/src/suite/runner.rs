//! Sequential suite execution with per-test fixtures.
//!
//! For each selected scenario: fresh driver, optional video, the body,
//! failure screenshot, video stop, unconditional `quit()`, status line and
//! result file.
//! The HTML report is written once all scenarios are done.

use crate::config::SessionConfig;
use crate::driver::BrowserDriver;
use crate::error::PageResult;
use crate::factory::DriverProvider;
use crate::suite::reporter::{Reporter, TestRecord, TestStatus};
use crate::suite::results::ResultsWriter;
use crate::suite::{scenarios, Scenario, TestContext};
use chrono::Local;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// HTML report file name inside the reports directory
pub const REPORT_FILE: &str = "report.html";

/// Runs scenarios against drivers handed out by a [`DriverProvider`]
pub struct SuiteRunner {
    config: Arc<SessionConfig>,
    provider: Arc<dyn DriverProvider>,
    scenarios: Vec<Scenario>,
}

impl std::fmt::Debug for SuiteRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuiteRunner")
            .field("config", &self.config)
            .field("scenarios", &self.scenarios)
            .finish_non_exhaustive()
    }
}

impl SuiteRunner {
    /// Runner over the built-in scenarios
    #[must_use]
    pub fn new(config: Arc<SessionConfig>, provider: Arc<dyn DriverProvider>) -> Self {
        Self {
            config,
            provider,
            scenarios: scenarios::ALL.to_vec(),
        }
    }

    /// Replace the scenario list
    #[must_use]
    pub fn with_scenarios(mut self, scenarios: Vec<Scenario>) -> Self {
        self.scenarios = scenarios;
        self
    }

    #[must_use]
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Scenarios selected by `filter` (tag or name substring)
    #[must_use]
    pub fn select(&self, filter: Option<&str>) -> Vec<Scenario> {
        self.scenarios
            .iter()
            .filter(|s| filter.map_or(true, |f| s.matches(f)))
            .copied()
            .collect()
    }

    /// Create the reports, screenshots and results directories
    pub fn prepare_dirs(&self) -> PageResult<()> {
        fs::create_dir_all(&self.config.reports_dir)?;
        fs::create_dir_all(self.config.screenshots_dir())?;
        fs::create_dir_all(self.config.results_dir())?;
        Ok(())
    }

    /// Path of the HTML report
    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.config.reports_dir.join(REPORT_FILE)
    }

    /// Run the selected scenarios and write the HTML report.
    ///
    /// Scenario failures are recorded, not returned; only reporting
    /// infrastructure errors end the run early.
    pub async fn run(&self, filter: Option<&str>) -> PageResult<Reporter> {
        let selected = self.select(filter);
        info!("Environment configured:");
        info!("  - Browser: {}", self.config.browser);
        info!("  - Headless: {}", self.config.headless);
        info!("  - Base URL: {}", self.config.base_url);
        info!("Running {} of {} scenarios", selected.len(), self.scenarios.len());

        let results = ResultsWriter::new(self.config.results_dir(), &self.config);
        let mut reporter = Reporter::new();
        reporter.start();

        for scenario in &selected {
            self.prepare_dirs()?;
            let record = self.run_one(scenario).await;
            match record.status {
                TestStatus::Failed => error!("{} {}", record.name, record.status),
                _ => info!("{} {}", record.name, record.status),
            }
            if let Err(e) = results.write(&record) {
                warn!("Could not write result for {}: {}", record.name, e);
            }
            reporter.record(record);
        }

        self.prepare_dirs()?;
        let report = self.report_path();
        reporter.generate_html(&report)?;
        info!("HTML report written: {}", report.display());
        Ok(reporter)
    }

    async fn run_one(&self, scenario: &Scenario) -> TestRecord {
        let name = scenario.name();
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let started = Instant::now();

        info!("Initializing WebDriver for {}", name);
        let driver = match self.provider.provide().await {
            Ok(driver) => driver,
            Err(e) => {
                error!("{}: could not create driver: {}", name, e);
                return TestRecord::failed(name, started.elapsed(), e.to_string())
                    .with_tags(scenario.tags());
            }
        };

        let recording = self.start_video(&driver, name, &timestamp);
        let ctx = TestContext::new(name, Arc::clone(&driver), Arc::clone(&self.config));
        let outcome = scenario.run(&ctx).await;

        let mut screenshot = None;
        if let Err(e) = &outcome {
            error!("{}: {}", name, e);
            match ctx.take_screenshot(name).await {
                Ok(path) => screenshot = Some(path),
                Err(e) => warn!("Could not capture failure screenshot for {}: {}", name, e),
            }
        }

        // The recorder captures through this driver, so it must stop first.
        let video = tokio::task::spawn_blocking(move || stop_video(recording))
            .await
            .unwrap_or_else(|e| {
                warn!("Video recorder for {} did not shut down: {}", name, e);
                None
            });

        info!("Closing WebDriver");
        if let Err(e) = driver.quit().await {
            warn!("Driver quit for {} did not complete: {}", name, e);
        }

        let duration = started.elapsed();
        let mut record = match outcome {
            Ok(()) => TestRecord::passed(name, duration),
            Err(e) => TestRecord::failed(name, duration, e.to_string()),
        }
        .with_tags(scenario.tags());
        if let Some(path) = screenshot {
            record = record.with_screenshot(path);
        }
        if let Some(path) = video {
            record = record.with_video(path);
        }
        record
    }

    #[cfg(feature = "media")]
    fn start_video(
        &self,
        driver: &Arc<dyn BrowserDriver>,
        name: &str,
        timestamp: &str,
    ) -> Option<crate::media::VideoRecorder> {
        use crate::media::{BrowserFrameSource, VideoConfig, VideoRecorder};

        if !self.config.record_video {
            return None;
        }
        let path = self.config.reports_dir.join(format!("{name}_{timestamp}.avi"));
        let source = BrowserFrameSource::new(Arc::clone(driver), tokio::runtime::Handle::current());
        let mut recorder = VideoRecorder::new(
            path,
            VideoConfig::default().with_fps(self.config.video_fps),
            Box::new(source),
        );
        match recorder.start() {
            Ok(()) => Some(recorder),
            Err(e) => {
                warn!("Video recording for {} not started: {}", name, e);
                None
            }
        }
    }

    #[cfg(not(feature = "media"))]
    fn start_video(&self, _driver: &Arc<dyn BrowserDriver>, name: &str, _timestamp: &str) -> Option<()> {
        if self.config.record_video {
            warn!("Video recording for {} skipped: built without the `media` feature", name);
        }
        None
    }
}

#[cfg(feature = "media")]
fn stop_video(recording: Option<crate::media::VideoRecorder>) -> Option<PathBuf> {
    let mut recorder = recording?;
    match recorder.stop() {
        Ok(()) => Some(recorder.path().to_path_buf()),
        Err(e) => {
            warn!("Video {} not finalized: {}", recorder.path().display(), e);
            None
        }
    }
}

#[cfg(not(feature = "media"))]
fn stop_video(_recording: Option<()>) -> Option<PathBuf> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockElement};
    use crate::error::StoreProbeError;
    use crate::pages::HomePage;
    use crate::suite::{ensure, ScenarioFuture};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn passing(_ctx: &TestContext) -> ScenarioFuture<'_> {
        Box::pin(async { Ok(()) })
    }

    fn failing(_ctx: &TestContext) -> ScenarioFuture<'_> {
        Box::pin(async { ensure(false, "expected failure") })
    }

    const PASS: Scenario = Scenario::new("test_pass", &["smoke"], passing);
    const FAIL: Scenario = Scenario::new("test_fail", &["regression"], failing);

    fn config(dir: &Path) -> SessionConfig {
        SessionConfig::new()
            .with_base_url("https://shop.test")
            .with_reports_dir(dir.join("reports"))
            .with_explicit_wait(Duration::from_millis(100))
            .with_poll_interval(Duration::from_millis(20))
            .with_video(false)
    }

    fn runner(config: SessionConfig, mock: &MockDriver) -> SuiteRunner {
        SuiteRunner::new(Arc::new(config), Arc::new(mock.clone()))
            .with_scenarios(vec![PASS, FAIL])
    }

    #[derive(Debug, Default)]
    struct BrokenProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DriverProvider for BrokenProvider {
        async fn provide(&self) -> PageResult<Arc<dyn BrowserDriver>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreProbeError::DriverCreation {
                message: "no browser".to_string(),
            })
        }
    }

    mod selection_tests {
        use super::*;

        #[test]
        fn test_defaults_to_builtin_scenarios() {
            let runner = SuiteRunner::new(
                Arc::new(SessionConfig::new()),
                Arc::new(MockDriver::new()),
            );
            assert_eq!(runner.scenarios().len(), scenarios::ALL.len());
            assert_eq!(runner.select(Some("smoke")).len(), 2);
            assert_eq!(runner.select(Some("products")).len(), 1);
            assert_eq!(runner.select(None).len(), scenarios::ALL.len());
        }

        #[test]
        fn test_filter_by_name() {
            let runner = runner(SessionConfig::new(), &MockDriver::new());
            let selected = runner.select(Some("fail"));
            assert_eq!(selected.len(), 1);
            assert_eq!(selected[0].name(), "test_fail");
        }
    }

    mod lifecycle_tests {
        use super::*;

        #[tokio::test]
        async fn test_quit_called_for_every_scenario() {
            let dir = tempfile::tempdir().unwrap();
            let mock = MockDriver::new().with_screenshot(vec![0x89, b'P', b'N', b'G']);
            let reporter = runner(config(dir.path()), &mock).run(None).await.unwrap();

            assert_eq!(reporter.passed_count(), 1);
            assert_eq!(reporter.failed_count(), 1);
            assert_eq!(mock.call_count("quit"), 2);
        }

        #[tokio::test]
        async fn test_failure_captures_screenshot() {
            let dir = tempfile::tempdir().unwrap();
            let mock = MockDriver::new().with_screenshot(vec![0x89, b'P', b'N', b'G']);
            let reporter = runner(config(dir.path()), &mock).run(None).await.unwrap();

            let failure = reporter.failures()[0];
            assert_eq!(failure.error.as_deref(), Some("Assertion failed: expected failure"));
            let shot = failure.screenshot.as_ref().unwrap();
            let file = shot.file_name().unwrap().to_string_lossy().to_string();
            assert!(file.starts_with("test_fail_"));
            assert!(shot.exists());
            assert!(reporter.results()[0].screenshot.is_none());
        }

        #[tokio::test]
        async fn test_quit_error_does_not_fail_scenario() {
            let dir = tempfile::tempdir().unwrap();
            let mock = MockDriver::new().failing("quit");
            let reporter = runner(config(dir.path()), &mock)
                .with_scenarios(vec![PASS])
                .run(None)
                .await
                .unwrap();
            assert!(reporter.all_passed());
            assert!(mock.was_called("quit"));
        }

        #[tokio::test]
        async fn test_driver_creation_failure_is_recorded() {
            let dir = tempfile::tempdir().unwrap();
            let provider = Arc::new(BrokenProvider::default());
            let runner = SuiteRunner::new(Arc::new(config(dir.path())), provider.clone())
                .with_scenarios(vec![PASS, FAIL]);
            let reporter = runner.run(None).await.unwrap();

            assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
            assert_eq!(reporter.failed_count(), 2);
            assert!(reporter.results()[0]
                .error
                .as_deref()
                .unwrap()
                .contains("no browser"));
        }
    }

    mod output_tests {
        use super::*;

        #[tokio::test]
        async fn test_writes_results_and_report() {
            let dir = tempfile::tempdir().unwrap();
            let cfg = config(dir.path());
            let mock = MockDriver::new();
            let runner = runner(cfg.clone(), &mock);
            runner.run(Some("smoke")).await.unwrap();

            assert_eq!(crate::suite::results::count_result_files(&cfg.results_dir()), 1);
            let html = fs::read_to_string(runner.report_path()).unwrap();
            assert!(html.contains("test_pass"));
            assert!(!html.contains("test_fail"));
        }

        #[tokio::test]
        async fn test_empty_selection_still_writes_report() {
            let dir = tempfile::tempdir().unwrap();
            let cfg = config(dir.path());
            let runner = runner(cfg.clone(), &MockDriver::new());
            let reporter = runner.run(Some("nothing-matches")).await.unwrap();
            assert_eq!(reporter.total_count(), 0);
            assert!(runner.report_path().exists());
            assert!(cfg.screenshots_dir().is_dir());
        }

        #[tokio::test]
        async fn test_builtin_home_scenario_against_mock() {
            let dir = tempfile::tempdir().unwrap();
            let mock = MockDriver::new()
                .with_title("Shop")
                .with_element(MockElement::new("q").matching(HomePage::SEARCH_INPUT));
            let runner = SuiteRunner::new(Arc::new(config(dir.path())), Arc::new(mock.clone()));
            let reporter = runner.run(Some("test_page_title")).await.unwrap();
            assert!(reporter.all_passed());
            assert!(mock.was_called("goto:https://shop.test"));
        }
    }

    #[cfg(feature = "media")]
    mod video_tests {
        use super::*;
        use image::{DynamicImage, ImageFormat, RgbImage};
        use std::io::Cursor;

        fn png() -> Vec<u8> {
            let mut out = Cursor::new(Vec::new());
            DynamicImage::ImageRgb8(RgbImage::new(32, 24))
                .write_to(&mut out, ImageFormat::Png)
                .unwrap();
            out.into_inner()
        }

        #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
        async fn test_video_attached_to_record() {
            let dir = tempfile::tempdir().unwrap();
            let mock = MockDriver::new().with_screenshot(png());
            let cfg = config(dir.path()).with_video(true);
            let reporter = runner(cfg, &mock)
                .with_scenarios(vec![PASS])
                .run(None)
                .await
                .unwrap();

            let video = reporter.results()[0].video.as_ref().unwrap();
            let file = video.file_name().unwrap().to_string_lossy().to_string();
            assert!(file.starts_with("test_pass_"));
            assert!(file.ends_with(".avi"));
            assert!(video.exists());
        }

        fn slow(_ctx: &TestContext) -> ScenarioFuture<'_> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_millis(450)).await;
                Ok(())
            })
        }

        #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
        async fn test_video_stops_before_driver_quits() {
            let dir = tempfile::tempdir().unwrap();
            let mock = MockDriver::new().with_screenshot(png());
            let cfg = config(dir.path()).with_video(true);
            let reporter = runner(cfg, &mock)
                .with_scenarios(vec![Scenario::new("test_slow", &[], slow)])
                .run(None)
                .await
                .unwrap();

            assert!(reporter.all_passed());
            assert!(mock.has_quit());
            let history = mock.history();
            let quit = history.iter().position(|c| c == "quit").unwrap();
            let captures: Vec<_> = history
                .iter()
                .enumerate()
                .filter(|(_, c)| c.as_str() == "screenshot")
                .map(|(i, _)| i)
                .collect();
            assert!(captures.len() >= 2);
            assert!(captures.iter().all(|&i| i < quit));
            assert_eq!(quit, history.len() - 1);
        }
    }
}
