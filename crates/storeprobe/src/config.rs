//! Session configuration.
//!
//! Resolved once per run: environment (with `.env` support), then explicit
//! CLI overrides. The result is immutable and shared as `Arc<SessionConfig>`.

use crate::error::{PageResult, StoreProbeError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default storefront under test
pub const DEFAULT_BASE_URL: &str = "https://www.amazon.com";

/// Default SMTP relay
pub const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";

/// SMTP submission port (STARTTLS)
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Supported browser kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    /// Google Chrome / Chromium via chromedriver
    Chrome,
    /// Mozilla Firefox via geckodriver
    Firefox,
}

impl BrowserKind {
    /// Lowercase identifier
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Chrome => "chrome",
            Self::Firefox => "firefox",
        }
    }

    /// Name of the WebDriver service binary
    #[must_use]
    pub const fn driver_binary(&self) -> &'static str {
        match self {
            Self::Chrome => "chromedriver",
            Self::Firefox => "geckodriver",
        }
    }
}

impl std::fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BrowserKind {
    type Err = StoreProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chrome" | "chromium" => Ok(Self::Chrome),
            "firefox" => Ok(Self::Firefox),
            _ => Err(StoreProbeError::UnsupportedBrowser {
                name: s.to_string(),
            }),
        }
    }
}

/// Values supplied on the command line that take precedence over the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `--browser`
    pub browser: Option<BrowserKind>,
    /// `--headless`
    pub headless: Option<bool>,
    /// `--base-url`
    pub base_url: Option<String>,
    /// `--reports-dir`
    pub reports_dir: Option<PathBuf>,
    /// `--no-video`
    pub record_video: Option<bool>,
}

/// Configuration for one test session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Browser to drive
    pub browser: BrowserKind,
    /// Run without a visible window
    pub headless: bool,
    /// Storefront base URL
    pub base_url: String,
    /// WebDriver implicit element wait
    pub implicit_wait: Duration,
    /// Explicit wait window applied by page primitives
    pub explicit_wait: Duration,
    /// Page load timeout
    pub page_load_timeout: Duration,
    /// Polling interval inside the explicit wait window
    pub poll_interval: Duration,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Output directory for logs, screenshots, videos and results
    pub reports_dir: PathBuf,
    /// Explicit path to chromedriver/geckodriver
    pub driver_path: Option<PathBuf>,
    /// Remote WebDriver endpoint; skips spawning a local driver
    pub remote_url: Option<String>,
    /// Record a video per test
    pub record_video: bool,
    /// Video frame rate
    pub video_fps: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            browser: BrowserKind::Chrome,
            headless: false,
            base_url: DEFAULT_BASE_URL.to_string(),
            implicit_wait: Duration::from_secs(10),
            explicit_wait: Duration::from_secs(20),
            page_load_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(500),
            window_width: 1920,
            window_height: 1080,
            reports_dir: PathBuf::from("reports"),
            driver_path: None,
            remote_url: None,
            record_video: true,
            video_fps: 5,
        }
    }
}

impl SessionConfig {
    /// Create configuration with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve configuration from the process environment (loads `.env` first)
    pub fn from_env() -> PageResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> PageResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let browser = match lookup("BROWSER") {
            Some(value) => value.parse()?,
            None => defaults.browser,
        };

        Ok(Self {
            browser,
            headless: lookup("HEADLESS").map_or(defaults.headless, |v| parse_flag(&v)),
            base_url: lookup("BASE_URL").unwrap_or(defaults.base_url),
            implicit_wait: seconds(&lookup, "IMPLICIT_WAIT", defaults.implicit_wait)?,
            explicit_wait: seconds(&lookup, "EXPLICIT_WAIT", defaults.explicit_wait)?,
            page_load_timeout: seconds(&lookup, "PAGE_LOAD_TIMEOUT", defaults.page_load_timeout)?,
            reports_dir: lookup("REPORTS_DIR").map_or(defaults.reports_dir, PathBuf::from),
            driver_path: lookup("DRIVER_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            remote_url: lookup("WEBDRIVER_URL").filter(|u| !u.trim().is_empty()),
            record_video: lookup("RECORD_VIDEO").map_or(defaults.record_video, |v| parse_flag(&v)),
            ..defaults
        })
    }

    /// Apply command-line overrides, producing a new configuration
    #[must_use]
    pub fn with_overrides(self, overrides: Overrides) -> Self {
        Self {
            browser: overrides.browser.unwrap_or(self.browser),
            headless: overrides.headless.unwrap_or(self.headless),
            base_url: overrides.base_url.unwrap_or(self.base_url),
            reports_dir: overrides.reports_dir.unwrap_or(self.reports_dir),
            record_video: overrides.record_video.unwrap_or(self.record_video),
            ..self
        }
    }

    /// Set browser kind
    #[must_use]
    pub const fn with_browser(mut self, browser: BrowserKind) -> Self {
        self.browser = browser;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set explicit wait window
    #[must_use]
    pub const fn with_explicit_wait(mut self, wait: Duration) -> Self {
        self.explicit_wait = wait;
        self
    }

    /// Set poll interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set reports directory
    #[must_use]
    pub fn with_reports_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.reports_dir = dir.into();
        self
    }

    /// Enable or disable video recording
    #[must_use]
    pub const fn with_video(mut self, record: bool) -> Self {
        self.record_video = record;
        self
    }

    /// Directory for failure screenshots
    #[must_use]
    pub fn screenshots_dir(&self) -> PathBuf {
        self.reports_dir.join("screenshots")
    }

    /// Directory for per-test JSON results
    #[must_use]
    pub fn results_dir(&self) -> PathBuf {
        self.reports_dir.join("allure-results")
    }

    /// Text log path
    #[must_use]
    pub fn log_path(&self) -> PathBuf {
        self.reports_dir.join("test.log")
    }
}

/// Email dispatch configuration
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Sender address (also the SMTP user)
    pub sender: String,
    /// SMTP password (application password)
    pub password: String,
    /// SMTP relay host
    pub smtp_server: String,
    /// SMTP port
    pub smtp_port: u16,
    /// Whether sending is enabled at all
    pub enabled: bool,
    /// Recipient addresses
    pub recipients: Vec<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            sender: "test-jenkins@gmail.com".to_string(),
            password: String::new(),
            smtp_server: DEFAULT_SMTP_SERVER.to_string(),
            smtp_port: DEFAULT_SMTP_PORT,
            enabled: false,
            recipients: Vec::new(),
        }
    }
}

impl EmailConfig {
    /// Resolve from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve from an arbitrary key lookup
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            sender: lookup("SENDER_EMAIL")
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.sender),
            password: lookup("SENDER_PASSWORD").unwrap_or_default(),
            smtp_server: lookup("SMTP_SERVER").unwrap_or(defaults.smtp_server),
            smtp_port: defaults.smtp_port,
            enabled: lookup("SEND_EMAIL").is_some_and(|v| parse_flag(&v)),
            recipients: lookup("EMAIL_RECIPIENTS")
                .map(|r| parse_recipients(&r))
                .unwrap_or_default(),
        }
    }
}

/// Split a comma-separated recipient list, dropping blanks
#[must_use]
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

fn seconds<F>(lookup: &F, key: &str, default: Duration) -> PageResult<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| StoreProbeError::config(format!("{key} must be whole seconds, got {raw:?}"))),
    }
}
