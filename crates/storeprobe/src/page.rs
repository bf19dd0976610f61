//! Base page primitives and the page object trait.
//!
//! Every element interaction goes through [`BasePage`], which applies the
//! session's explicit wait before acting. Concrete pages in [`crate::pages`]
//! compose a `BasePage` and expose business operations on top of it.

use crate::config::SessionConfig;
use crate::driver::{BrowserDriver, ElementRef};
use crate::error::{PageResult, StoreProbeError};
use crate::locator::Locator;
use crate::wait::{WaitOptions, Waiter};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Trait for page objects representing a page of the storefront
#[async_trait]
pub trait PageObject: Send + Sync {
    /// Fragment the current URL contains while this page is shown
    fn url_pattern(&self) -> &str;

    /// Get the page name for logging/debugging
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Check if the page is loaded and ready for interaction
    async fn is_loaded(&self) -> bool;

    /// Whether `url` belongs to this page
    fn matches_url(&self, url: &str) -> bool {
        url.contains(self.url_pattern())
    }
}

/// Wait-then-act element primitives over a driver session
#[derive(Debug, Clone)]
pub struct BasePage {
    driver: Arc<dyn BrowserDriver>,
    config: Arc<SessionConfig>,
    waiter: Waiter,
}

impl BasePage {
    /// Create a base page using the session's explicit wait
    #[must_use]
    pub fn new(driver: Arc<dyn BrowserDriver>, config: Arc<SessionConfig>) -> Self {
        let waiter = Waiter::new(WaitOptions::from_config(&config));
        Self {
            driver,
            config,
            waiter,
        }
    }

    /// Override the wait options
    #[must_use]
    pub const fn with_wait(mut self, options: WaitOptions) -> Self {
        self.waiter = Waiter::new(options);
        self
    }

    /// Underlying driver
    #[must_use]
    pub fn driver(&self) -> &Arc<dyn BrowserDriver> {
        &self.driver
    }

    /// Session configuration
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Wait options in effect
    #[must_use]
    pub const fn wait_options(&self) -> &WaitOptions {
        self.waiter.options()
    }

    /// Navigate to a URL
    pub async fn navigate(&self, url: &str) -> PageResult<()> {
        info!("Navigating to {}", url);
        self.driver.goto(url).await
    }

    /// Wait for the element to be present and return it
    pub async fn find_element(&self, locator: &Locator) -> PageResult<ElementRef> {
        let driver = &self.driver;
        self.waiter
            .until(&locator.to_string(), move || async move {
                Ok::<_, StoreProbeError>(driver.find_all(locator).await?.into_iter().next())
            })
            .await
    }

    /// All matching elements right now (no waiting, may be empty)
    pub async fn find_elements(&self, locator: &Locator) -> PageResult<Vec<ElementRef>> {
        self.driver.find_all(locator).await
    }

    /// Wait for the element to be displayed and enabled, then click it
    pub async fn click(&self, locator: &Locator) -> PageResult<()> {
        let driver = &self.driver;
        let element = self
            .waiter
            .until(&locator.to_string(), move || async move {
                for element in driver.find_all(locator).await? {
                    if driver.is_displayed(&element).await? && driver.is_enabled(&element).await? {
                        return Ok(Some(element));
                    }
                }
                Ok::<_, StoreProbeError>(None)
            })
            .await?;
        debug!("Clicking {}", locator);
        self.driver.click(&element).await
    }

    /// Wait for presence, clear the field, then type `text`
    pub async fn send_keys(&self, locator: &Locator, text: &str) -> PageResult<()> {
        let element = self.find_element(locator).await?;
        self.driver.clear(&element).await?;
        debug!("Typing into {}", locator);
        self.driver.send_keys(&element, text).await
    }

    /// Wait for presence and return the element's text
    pub async fn get_text(&self, locator: &Locator) -> PageResult<String> {
        let element = self.find_element(locator).await?;
        self.driver.text(&element).await
    }

    /// Document title
    pub async fn get_page_title(&self) -> PageResult<String> {
        self.driver.title().await
    }

    /// Current URL
    pub async fn get_current_url(&self) -> PageResult<String> {
        self.driver.current_url().await
    }

    /// Whether the element becomes visible within the wait window.
    ///
    /// Timeouts and driver errors both read as "not visible".
    pub async fn is_element_visible(&self, locator: &Locator) -> bool {
        let driver = &self.driver;
        self.waiter
            .until(&locator.to_string(), move || async move {
                for element in driver.find_all(locator).await? {
                    if driver.is_displayed(&element).await? {
                        return Ok(Some(()));
                    }
                }
                Ok::<_, StoreProbeError>(None)
            })
            .await
            .is_ok()
    }
}
