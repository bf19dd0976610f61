//! W3C WebDriver backend.
//!
//! Wraps a `fantoccini` client. Elements returned by the client are kept in a
//! per-page table keyed by their WebDriver element id and handed out as
//! [`ElementRef`] keys, so page code never sees the client types. Finding the
//! same element again reuses its entry; the table is cleared on every
//! navigation.

use crate::driver::{BrowserDriver, ElementRef, Screenshot};
use crate::error::{PageResult, StoreProbeError};
use crate::locator::{Locator, Strategy};
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::wd::TimeoutConfiguration;
use fantoccini::{Client, ClientBuilder};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::process::Child;
use tracing::{debug, info, warn};

/// Handles of elements seen on the current page, keyed by WebDriver element id
#[derive(Debug)]
struct ElementTable<T> {
    entries: HashMap<String, T>,
}

impl<T: Clone> ElementTable<T> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    fn register(&mut self, remote_id: String, handle: T) -> ElementRef {
        let key = ElementRef::new(remote_id.as_str());
        self.entries.insert(remote_id, handle);
        key
    }

    fn get(&self, element: &ElementRef) -> Option<T> {
        self.entries.get(element.id()).cloned()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Live WebDriver session, optionally owning the local driver service
pub struct WebDriverSession {
    client: Client,
    elements: Mutex<ElementTable<Element>>,
    service: tokio::sync::Mutex<Option<Child>>,
}

impl std::fmt::Debug for WebDriverSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebDriverSession")
            .field("elements", &self.table().len())
            .finish_non_exhaustive()
    }
}

impl WebDriverSession {
    /// Open a session against a WebDriver endpoint.
    ///
    /// `service` is the spawned driver process, killed on [`BrowserDriver::quit`].
    pub async fn connect(
        endpoint: &str,
        capabilities: serde_json::Map<String, serde_json::Value>,
        page_load: Duration,
        implicit: Duration,
        service: Option<Child>,
    ) -> PageResult<Self> {
        debug!("Connecting to WebDriver at {}", endpoint);
        let client = ClientBuilder::native()
            .capabilities(capabilities)
            .connect(endpoint)
            .await
            .map_err(|e| StoreProbeError::DriverCreation {
                message: format!("session at {endpoint}: {e}"),
            })?;

        client
            .update_timeouts(TimeoutConfiguration::new(None, Some(page_load), Some(implicit)))
            .await
            .map_err(|e| StoreProbeError::DriverCreation {
                message: format!("setting timeouts: {e}"),
            })?;

        info!("WebDriver session ready at {}", endpoint);
        Ok(Self {
            client,
            elements: Mutex::new(ElementTable::new()),
            service: tokio::sync::Mutex::new(service),
        })
    }

    fn table(&self) -> MutexGuard<'_, ElementTable<Element>> {
        self.elements.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, found: Vec<Element>) -> Vec<ElementRef> {
        let mut table = self.table();
        found
            .into_iter()
            .map(|element| table.register(element.element_id().to_string(), element))
            .collect()
    }

    fn element(&self, element: &ElementRef) -> PageResult<Element> {
        self.table()
            .get(element)
            .ok_or_else(|| StoreProbeError::driver(format!("stale element reference: {element}")))
    }
}

/// Translate to a WebDriver selector; class names become CSS.
fn selector_for(locator: &Locator) -> (Strategy, String) {
    match locator.strategy() {
        Strategy::ClassName => (Strategy::Css, format!(".{}", locator.selector())),
        other => (other, locator.selector().to_string()),
    }
}

fn wd_locator(strategy: Strategy, selector: &str) -> fantoccini::Locator<'_> {
    match strategy {
        Strategy::Id => fantoccini::Locator::Id(selector),
        Strategy::XPath => fantoccini::Locator::XPath(selector),
        Strategy::Css | Strategy::ClassName => fantoccini::Locator::Css(selector),
    }
}

fn command_error(command: &str, err: impl std::fmt::Display) -> StoreProbeError {
    StoreProbeError::driver(format!("{command}: {err}"))
}

#[async_trait]
impl BrowserDriver for WebDriverSession {
    async fn goto(&self, url: &str) -> PageResult<()> {
        self.table().clear();
        self.client
            .goto(url)
            .await
            .map_err(|e| StoreProbeError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })
    }

    async fn current_url(&self) -> PageResult<String> {
        self.client
            .current_url()
            .await
            .map(|u| u.to_string())
            .map_err(|e| command_error("current_url", e))
    }

    async fn title(&self) -> PageResult<String> {
        self.client
            .title()
            .await
            .map_err(|e| command_error("title", e))
    }

    async fn find_all(&self, locator: &Locator) -> PageResult<Vec<ElementRef>> {
        let (strategy, selector) = selector_for(locator);
        let found = self
            .client
            .find_all(wd_locator(strategy, &selector))
            .await
            .map_err(|e| command_error("find_all", e))?;
        Ok(self.register(found))
    }

    async fn find_all_within(
        &self,
        parent: &ElementRef,
        locator: &Locator,
    ) -> PageResult<Vec<ElementRef>> {
        let parent = self.element(parent)?;
        let (strategy, selector) = selector_for(locator);
        let found = parent
            .find_all(wd_locator(strategy, &selector))
            .await
            .map_err(|e| command_error("find_all_within", e))?;
        Ok(self.register(found))
    }

    async fn is_displayed(&self, element: &ElementRef) -> PageResult<bool> {
        self.element(element)?
            .is_displayed()
            .await
            .map_err(|e| command_error("is_displayed", e))
    }

    async fn is_enabled(&self, element: &ElementRef) -> PageResult<bool> {
        self.element(element)?
            .is_enabled()
            .await
            .map_err(|e| command_error("is_enabled", e))
    }

    async fn click(&self, element: &ElementRef) -> PageResult<()> {
        self.element(element)?
            .click()
            .await
            .map_err(|e| command_error("click", e))?;
        Ok(())
    }

    async fn clear(&self, element: &ElementRef) -> PageResult<()> {
        self.element(element)?
            .clear()
            .await
            .map_err(|e| command_error("clear", e))?;
        Ok(())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> PageResult<()> {
        self.element(element)?
            .send_keys(text)
            .await
            .map_err(|e| command_error("send_keys", e))?;
        Ok(())
    }

    async fn text(&self, element: &ElementRef) -> PageResult<String> {
        self.element(element)?
            .text()
            .await
            .map_err(|e| command_error("text", e))
    }

    async fn screenshot(&self) -> PageResult<Screenshot> {
        self.client
            .screenshot()
            .await
            .map(Screenshot::new)
            .map_err(|e| StoreProbeError::Screenshot {
                message: e.to_string(),
            })
    }

    async fn quit(&self) -> PageResult<()> {
        self.table().clear();
        let closed = self.client.clone().close().await;

        if let Some(mut child) = self.service.lock().await.take() {
            if let Err(e) = child.kill().await {
                warn!("Could not stop driver service: {}", e);
            }
        }

        closed.map_err(|e| command_error("quit", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refinding_an_element_reuses_its_entry() {
        let mut table = ElementTable::new();
        let first = table.register("f.1d-2".to_string(), 1);
        for _ in 0..50 {
            assert_eq!(table.register("f.1d-2".to_string(), 1), first);
        }
        let other = table.register("f.9a-7".to_string(), 2);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&first), Some(1));
        assert_eq!(table.get(&other), Some(2));

        table.clear();
        assert_eq!(table.len(), 0);
        assert_eq!(table.get(&first), None);
    }

    #[test]
    fn test_class_name_maps_to_css() {
        let (strategy, selector) = selector_for(&Locator::class_name("logo"));
        assert_eq!(strategy, Strategy::Css);
        assert_eq!(selector, ".logo");
    }

    #[test]
    fn test_other_strategies_pass_through() {
        let (strategy, selector) = selector_for(&Locator::xpath("//h2"));
        assert_eq!(strategy, Strategy::XPath);
        assert_eq!(selector, "//h2");
        assert!(matches!(
            wd_locator(Strategy::Id, "q"),
            fantoccini::Locator::Id("q")
        ));
    }
}
