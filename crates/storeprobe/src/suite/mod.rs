//! Scenario definitions and the per-test fixture lifecycle.
//!
//! A [`Scenario`] is a named, tagged async function over a [`TestContext`].
//! The [`SuiteRunner`] owns everything around it: driver creation, video,
//! failure screenshots, teardown and result files.

pub mod reporter;
pub mod results;
pub mod runner;
pub mod scenarios;

pub use reporter::{Reporter, TestRecord, TestStatus};
pub use results::ResultsWriter;
pub use runner::SuiteRunner;

use crate::config::SessionConfig;
use crate::driver::BrowserDriver;
use crate::error::{PageResult, StoreProbeError};
use crate::page::BasePage;
use crate::pages::HomePage;
use chrono::Local;
use futures::future::BoxFuture;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Future returned by a scenario body
pub type ScenarioFuture<'a> = BoxFuture<'a, PageResult<()>>;

/// Scenario body
pub type ScenarioFn = for<'a> fn(&'a TestContext) -> ScenarioFuture<'a>;

/// A named test case
#[derive(Clone, Copy)]
pub struct Scenario {
    name: &'static str,
    tags: &'static [&'static str],
    body: ScenarioFn,
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

impl Scenario {
    #[must_use]
    pub const fn new(name: &'static str, tags: &'static [&'static str], body: ScenarioFn) -> Self {
        Self { name, tags, body }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn tags(&self) -> &'static [&'static str] {
        self.tags
    }

    /// Whether the scenario is selected by `filter`: an exact tag
    /// (case-insensitive) or a substring of the name. Empty selects all.
    #[must_use]
    pub fn matches(&self, filter: &str) -> bool {
        let filter = filter.trim();
        if filter.is_empty() {
            return true;
        }
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(filter))
            || self
                .name
                .to_ascii_lowercase()
                .contains(&filter.to_ascii_lowercase())
    }

    /// Run the body against `ctx`
    pub fn run<'a>(&self, ctx: &'a TestContext) -> ScenarioFuture<'a> {
        (self.body)(ctx)
    }
}

/// What a scenario body gets to work with
#[derive(Debug, Clone)]
pub struct TestContext {
    name: String,
    driver: Arc<dyn BrowserDriver>,
    config: Arc<SessionConfig>,
}

impl TestContext {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        driver: Arc<dyn BrowserDriver>,
        config: Arc<SessionConfig>,
    ) -> Self {
        Self {
            name: name.into(),
            driver,
            config,
        }
    }

    /// Scenario name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn driver(&self) -> &Arc<dyn BrowserDriver> {
        &self.driver
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn base_page(&self) -> BasePage {
        BasePage::new(Arc::clone(&self.driver), Arc::clone(&self.config))
    }

    #[must_use]
    pub fn home(&self) -> HomePage {
        HomePage::new(self.base_page())
    }

    /// Save `<label>_<YYYYmmdd_HHMMSS>.png` under the screenshots directory
    pub async fn take_screenshot(&self, label: &str) -> PageResult<PathBuf> {
        let shot = self.driver.screenshot().await?;
        if !shot.is_valid() {
            return Err(StoreProbeError::Screenshot {
                message: format!("driver returned an empty image for {label}"),
            });
        }
        let path = self.config.screenshots_dir().join(format!(
            "{}_{}.png",
            label,
            Local::now().format("%Y%m%d_%H%M%S")
        ));
        shot.save(&path)?;
        info!("Screenshot saved: {} ({} bytes)", path.display(), shot.size_bytes());
        Ok(path)
    }
}

/// Fail the scenario with `message` unless `condition` holds
pub fn ensure(condition: bool, message: impl Into<String>) -> PageResult<()> {
    if condition {
        Ok(())
    } else {
        Err(StoreProbeError::assertion(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MockDriver;

    fn noop(_ctx: &TestContext) -> ScenarioFuture<'_> {
        Box::pin(async { Ok(()) })
    }

    const SMOKE: Scenario = Scenario::new("test_page_title", &["smoke"], noop);

    #[test]
    fn test_matches_tag_or_name() {
        assert!(SMOKE.matches(""));
        assert!(SMOKE.matches("SMOKE"));
        assert!(SMOKE.matches("page_title"));
        assert!(!SMOKE.matches("regression"));
        assert!(!SMOKE.matches("smok"));
    }

    #[test]
    fn test_ensure() {
        assert!(ensure(true, "unused").is_ok());
        let err = ensure(false, "title is empty").unwrap_err();
        assert!(err.to_string().contains("title is empty"));
    }

    #[tokio::test]
    async fn test_scenario_runs_body() {
        let ctx = TestContext::new(
            "t",
            Arc::new(MockDriver::new()),
            Arc::new(SessionConfig::new()),
        );
        assert!(SMOKE.run(&ctx).await.is_ok());
        assert_eq!(ctx.name(), "t");
    }

    #[tokio::test]
    async fn test_take_screenshot_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockDriver::new().with_screenshot(vec![0x89, b'P', b'N', b'G']);
        let ctx = TestContext::new(
            "t",
            Arc::new(mock),
            Arc::new(SessionConfig::new().with_reports_dir(dir.path())),
        );
        let path = ctx.take_screenshot("search_input_not_found").await.unwrap();
        let file = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(file.starts_with("search_input_not_found_"));
        assert!(file.ends_with(".png"));
        assert_eq!(file.len(), "search_input_not_found_".len() + 15 + 4);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_empty_screenshot_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig::new().with_reports_dir(dir.path());
        let ctx = TestContext::new(
            "t",
            Arc::new(MockDriver::new().with_screenshot(Vec::new())),
            Arc::new(config.clone()),
        );
        let err = ctx.take_screenshot("blank").await.unwrap_err();
        assert!(matches!(err, StoreProbeError::Screenshot { .. }));
        assert!(!config.screenshots_dir().exists());
    }

    #[tokio::test]
    async fn test_take_screenshot_without_capture_fails() {
        let ctx = TestContext::new(
            "t",
            Arc::new(MockDriver::new()),
            Arc::new(SessionConfig::new()),
        );
        assert!(ctx.take_screenshot("x").await.is_err());
    }
}
