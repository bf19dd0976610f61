//! Driver creation.
//!
//! [`DriverFactory`] turns a [`SessionConfig`] into a live browser session:
//! it resolves the driver binary, spawns it on a free local port (or uses a
//! remote endpoint), and opens a session with the launch options below.

use crate::config::{BrowserKind, SessionConfig};
use crate::driver::{BrowserDriver, MockDriver};
use crate::error::{PageResult, StoreProbeError};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// How long a spawned driver service has to start accepting connections
pub const DRIVER_STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Browser arguments and W3C capabilities for one browser kind
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchOptions {
    /// Browser kind
    pub browser: BrowserKind,
    /// Command-line arguments passed to the browser
    pub args: Vec<String>,
    /// Implicit element wait applied after connect
    pub implicit_wait: Duration,
    /// Page load timeout applied after connect
    pub page_load_timeout: Duration,
}

impl LaunchOptions {
    /// Build launch options from the session configuration
    #[must_use]
    pub fn for_browser(browser: BrowserKind, config: &SessionConfig) -> Self {
        let mut args = Vec::new();
        if config.headless {
            args.push("--headless".to_string());
        }
        match browser {
            BrowserKind::Chrome => {
                args.push("--no-sandbox".to_string());
                args.push("--disable-dev-shm-usage".to_string());
                args.push("--disable-gpu".to_string());
                args.push(format!(
                    "--window-size={},{}",
                    config.window_width, config.window_height
                ));
            }
            BrowserKind::Firefox => {
                args.push(format!("--width={}", config.window_width));
                args.push(format!("--height={}", config.window_height));
            }
        }

        Self {
            browser,
            args,
            implicit_wait: config.implicit_wait,
            page_load_timeout: config.page_load_timeout,
        }
    }

    /// W3C capabilities for the new-session request
    #[must_use]
    pub fn capabilities(&self) -> Map<String, Value> {
        let mut caps = Map::new();
        match self.browser {
            BrowserKind::Chrome => {
                caps.insert("browserName".to_string(), json!("chrome"));
                caps.insert("goog:chromeOptions".to_string(), json!({ "args": self.args }));
            }
            BrowserKind::Firefox => {
                caps.insert("browserName".to_string(), json!("firefox"));
                caps.insert("moz:firefoxOptions".to_string(), json!({ "args": self.args }));
            }
        }
        caps
    }
}

/// Resolve the driver binary for a browser.
///
/// A configured path must exist. Without one, the binary is looked up on `PATH`.
pub fn resolve_driver_binary(
    browser: BrowserKind,
    configured: Option<&Path>,
) -> PageResult<PathBuf> {
    match configured {
        Some(path) if path.is_file() => Ok(path.to_path_buf()),
        Some(path) => Err(StoreProbeError::DriverNotFound {
            path: path.display().to_string(),
        }),
        None => which::which(browser.driver_binary()).map_err(|_| {
            StoreProbeError::DriverUnresolved {
                binary: browser.driver_binary().to_string(),
            }
        }),
    }
}

/// Something that hands the runner a fresh driver per test
#[async_trait]
pub trait DriverProvider: Send + Sync {
    /// Create a ready driver
    async fn provide(&self) -> PageResult<Arc<dyn BrowserDriver>>;
}

/// Creates WebDriver sessions from a shared configuration
#[derive(Debug, Clone)]
pub struct DriverFactory {
    config: Arc<SessionConfig>,
}

impl DriverFactory {
    /// Create a factory
    #[must_use]
    pub const fn new(config: Arc<SessionConfig>) -> Self {
        Self { config }
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Create a driver for `browser` (defaults to the configured browser)
    pub async fn create(&self, browser: Option<&str>) -> PageResult<Arc<dyn BrowserDriver>> {
        let kind = match browser {
            Some(name) => name.parse::<BrowserKind>()?,
            None => self.config.browser,
        };
        let options = LaunchOptions::for_browser(kind, &self.config);
        tracing::info!(
            browser = %kind,
            headless = self.config.headless,
            "Creating WebDriver session"
        );
        self.launch(options).await
    }

    #[cfg(feature = "browser")]
    async fn launch(&self, options: LaunchOptions) -> PageResult<Arc<dyn BrowserDriver>> {
        use crate::webdriver::WebDriverSession;

        let (endpoint, service) = match &self.config.remote_url {
            Some(url) => (url.clone(), None),
            None => {
                let binary = resolve_driver_binary(options.browser, self.config.driver_path.as_deref())?;
                let (endpoint, child) = spawn_service(options.browser, &binary).await?;
                (endpoint, Some(child))
            }
        };

        let session = WebDriverSession::connect(
            &endpoint,
            options.capabilities(),
            options.page_load_timeout,
            options.implicit_wait,
            service,
        )
        .await?;
        Ok(Arc::new(session))
    }

    #[cfg(not(feature = "browser"))]
    async fn launch(&self, options: LaunchOptions) -> PageResult<Arc<dyn BrowserDriver>> {
        if self.config.remote_url.is_none() {
            resolve_driver_binary(options.browser, self.config.driver_path.as_deref())?;
        }
        Err(StoreProbeError::DriverCreation {
            message: "storeprobe was built without the `browser` feature".to_string(),
        })
    }
}

#[async_trait]
impl DriverProvider for DriverFactory {
    async fn provide(&self) -> PageResult<Arc<dyn BrowserDriver>> {
        self.create(None).await
    }
}

#[async_trait]
impl DriverProvider for MockDriver {
    async fn provide(&self) -> PageResult<Arc<dyn BrowserDriver>> {
        self.reopen();
        Ok(Arc::new(self.clone()))
    }
}

/// Spawn chromedriver/geckodriver on a free port and wait until it listens.
#[cfg(feature = "browser")]
async fn spawn_service(
    browser: BrowserKind,
    binary: &Path,
) -> PageResult<(String, tokio::process::Child)> {
    use std::process::Stdio;
    use tokio::process::Command;

    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .map(|addr| addr.port())
        .map_err(|e| StoreProbeError::DriverCreation {
            message: format!("no free port: {e}"),
        })?;

    let mut command = Command::new(binary);
    match browser {
        BrowserKind::Chrome => command.arg(format!("--port={port}")),
        BrowserKind::Firefox => command.arg("--port").arg(port.to_string()),
    };
    let mut child = command
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| StoreProbeError::DriverCreation {
            message: format!("spawning {}: {e}", binary.display()),
        })?;

    let deadline = tokio::time::Instant::now() + DRIVER_STARTUP_TIMEOUT;
    loop {
        if tokio::net::TcpStream::connect(("127.0.0.1", port)).await.is_ok() {
            tracing::debug!("{} listening on port {}", browser.driver_binary(), port);
            return Ok((format!("http://127.0.0.1:{port}"), child));
        }
        if let Ok(Some(status)) = child.try_wait() {
            return Err(StoreProbeError::DriverCreation {
                message: format!("{} exited early with {status}", browser.driver_binary()),
            });
        }
        if tokio::time::Instant::now() >= deadline {
            let _ = child.kill().await;
            return Err(StoreProbeError::DriverCreation {
                message: format!(
                    "{} did not start within {}s",
                    browser.driver_binary(),
                    DRIVER_STARTUP_TIMEOUT.as_secs()
                ),
            });
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod launch_options_tests {
        use super::*;

        #[test]
        fn test_chrome_headless_args() {
            let config = SessionConfig::new().with_headless(true);
            let opts = LaunchOptions::for_browser(BrowserKind::Chrome, &config);
            assert_eq!(
                opts.args,
                vec![
                    "--headless",
                    "--no-sandbox",
                    "--disable-dev-shm-usage",
                    "--disable-gpu",
                    "--window-size=1920,1080",
                ]
            );
            let caps = opts.capabilities();
            assert_eq!(caps["browserName"], "chrome");
            assert_eq!(caps["goog:chromeOptions"]["args"][0], "--headless");
        }

        #[test]
        fn test_firefox_headed_args() {
            let config = SessionConfig::new();
            let opts = LaunchOptions::for_browser(BrowserKind::Firefox, &config);
            assert_eq!(opts.args, vec!["--width=1920", "--height=1080"]);
            assert!(opts.capabilities().contains_key("moz:firefoxOptions"));
            assert_eq!(opts.implicit_wait, Duration::from_secs(10));
            assert_eq!(opts.page_load_timeout, Duration::from_secs(30));
        }
    }

    mod resolve_tests {
        use super::*;

        #[test]
        fn test_configured_path_missing() {
            let err = resolve_driver_binary(
                BrowserKind::Chrome,
                Some(Path::new("/definitely/not/here/chromedriver")),
            )
            .unwrap_err();
            assert!(matches!(err, StoreProbeError::DriverNotFound { .. }));
        }

        #[test]
        fn test_configured_path_exists() {
            let dir = tempfile::tempdir().unwrap();
            let binary = dir.path().join("geckodriver");
            std::fs::write(&binary, b"").unwrap();
            let resolved = resolve_driver_binary(BrowserKind::Firefox, Some(&binary)).unwrap();
            assert_eq!(resolved, binary);
        }
    }

    mod factory_tests {
        use super::*;

        #[tokio::test]
        async fn test_unsupported_browser() {
            let factory = DriverFactory::new(Arc::new(SessionConfig::new()));
            let err = factory.create(Some("netscape")).await.unwrap_err();
            assert!(matches!(err, StoreProbeError::UnsupportedBrowser { ref name } if name == "netscape"));
        }

        #[tokio::test]
        async fn test_missing_configured_driver() {
            let mut config = SessionConfig::new();
            config.driver_path = Some(PathBuf::from("/nope/chromedriver"));
            let factory = DriverFactory::new(Arc::new(config));
            let err = factory.create(Some("chrome")).await.unwrap_err();
            assert!(matches!(err, StoreProbeError::DriverNotFound { .. }));
        }

        #[tokio::test]
        async fn test_mock_provider_shares_state() {
            let mock = MockDriver::new();
            let driver = mock.provide().await.unwrap();
            driver.goto("https://shop.test/").await.unwrap();
            assert!(mock.was_called("goto"));
        }

        #[tokio::test]
        async fn test_mock_provider_opens_new_session_after_quit() {
            let mock = MockDriver::new();
            mock.provide().await.unwrap().quit().await.unwrap();
            assert!(mock.has_quit());
            let driver = mock.provide().await.unwrap();
            assert!(!mock.has_quit());
            assert!(driver.goto("https://shop.test/").await.is_ok());
        }
    }
}
