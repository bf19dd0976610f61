//! Browser driver abstraction.
//!
//! Page objects only talk to [`BrowserDriver`]. The WebDriver-backed
//! implementation lives in `webdriver` (feature `browser`); [`MockDriver`]
//! is an in-memory DOM used by unit tests and the runner tests.

use crate::error::{PageResult, StoreProbeError};
use crate::locator::Locator;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant, SystemTime};

/// Opaque handle to an element in the current page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(String);

impl ElementRef {
    /// Wrap a driver-specific element id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Driver-specific element id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// PNG screenshot captured from the browser
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// Raw PNG data
    pub data: Vec<u8>,
    /// Timestamp when screenshot was taken
    pub timestamp: SystemTime,
}

impl Screenshot {
    /// Create a new screenshot
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            timestamp: SystemTime::now(),
        }
    }

    /// Get the size in bytes
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Check if screenshot has data
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.data.is_empty()
    }

    /// Write the PNG to disk
    pub fn save(&self, path: &Path) -> PageResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &self.data)?;
        Ok(())
    }
}

/// Commands the page layer needs from a browser session
#[async_trait]
pub trait BrowserDriver: Send + Sync + fmt::Debug {
    /// Navigate to a URL and wait for the page load
    async fn goto(&self, url: &str) -> PageResult<()>;

    /// Current page URL
    async fn current_url(&self) -> PageResult<String>;

    /// Current document title
    async fn title(&self) -> PageResult<String>;

    /// All elements in the document matching the locator (may be empty)
    async fn find_all(&self, locator: &Locator) -> PageResult<Vec<ElementRef>>;

    /// All descendants of `parent` matching the locator (may be empty)
    async fn find_all_within(
        &self,
        parent: &ElementRef,
        locator: &Locator,
    ) -> PageResult<Vec<ElementRef>>;

    /// Whether the element is rendered visibly
    async fn is_displayed(&self, element: &ElementRef) -> PageResult<bool>;

    /// Whether the element accepts interaction
    async fn is_enabled(&self, element: &ElementRef) -> PageResult<bool>;

    /// Click the element
    async fn click(&self, element: &ElementRef) -> PageResult<()>;

    /// Clear an input element
    async fn clear(&self, element: &ElementRef) -> PageResult<()>;

    /// Type text into the element
    async fn send_keys(&self, element: &ElementRef, text: &str) -> PageResult<()>;

    /// Visible text of the element
    async fn text(&self, element: &ElementRef) -> PageResult<String>;

    /// Capture the viewport as PNG
    async fn screenshot(&self) -> PageResult<Screenshot>;

    /// End the session and release the driver service
    async fn quit(&self) -> PageResult<()>;
}

// =============================================================================
// MOCK DRIVER
// =============================================================================

/// What a click on a mock element does to the mock page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickEffect {
    /// Change the current URL
    Navigate(String),
    /// Attach a previously detached element
    Reveal(String),
}

/// Element of the mock DOM
#[derive(Debug, Clone)]
pub struct MockElement {
    id: String,
    locators: Vec<Locator>,
    parent: Option<String>,
    text: String,
    displayed: bool,
    enabled: bool,
    attached: bool,
    appears_after: Option<Duration>,
    on_click: Vec<ClickEffect>,
}

impl MockElement {
    /// Create an attached, visible, enabled element
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            locators: Vec::new(),
            parent: None,
            text: String::new(),
            displayed: true,
            enabled: true,
            attached: true,
            appears_after: None,
            on_click: Vec::new(),
        }
    }

    /// Make the element match a locator
    #[must_use]
    pub fn matching(mut self, locator: Locator) -> Self {
        self.locators.push(locator);
        self
    }

    /// Nest under another element (for scoped lookups)
    #[must_use]
    pub fn child_of(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Set visible text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Present but not displayed
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Displayed but not enabled
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Not in the document until revealed by a click
    #[must_use]
    pub const fn detached(mut self) -> Self {
        self.attached = false;
        self
    }

    /// Only present once `delay` has passed since it was added
    #[must_use]
    pub const fn appearing_after(mut self, delay: Duration) -> Self {
        self.appears_after = Some(delay);
        self
    }

    /// Add a click side effect
    #[must_use]
    pub fn on_click(mut self, effect: ClickEffect) -> Self {
        self.on_click.push(effect);
        self
    }
}

#[derive(Debug)]
struct MockNode {
    element: MockElement,
    added_at: Instant,
}

impl MockNode {
    fn present(&self) -> bool {
        self.element.attached
            && self
                .element
                .appears_after
                .map_or(true, |delay| self.added_at.elapsed() >= delay)
    }
}

#[derive(Debug, Default)]
struct MockState {
    url: String,
    title: String,
    nodes: Vec<MockNode>,
    typed: HashMap<String, String>,
    screenshot: Option<Vec<u8>>,
    failing: HashSet<String>,
    call_history: Vec<String>,
    closed: bool,
}

/// In-memory driver for tests.
///
/// Cloning shares the same state, so a test can keep a handle for
/// assertions after passing the driver to the code under test.
#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    /// Create new mock driver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Set the current URL
    #[must_use]
    pub fn with_url(self, url: impl Into<String>) -> Self {
        self.lock().url = url.into();
        self
    }

    /// Set the document title
    #[must_use]
    pub fn with_title(self, title: impl Into<String>) -> Self {
        self.lock().title = title.into();
        self
    }

    /// Add an element
    #[must_use]
    pub fn with_element(self, element: MockElement) -> Self {
        self.add_element(element);
        self
    }

    /// Add an element to a shared driver
    pub fn add_element(&self, element: MockElement) {
        self.lock().nodes.push(MockNode {
            element,
            added_at: Instant::now(),
        });
    }

    /// Set mock screenshot PNG bytes
    #[must_use]
    pub fn with_screenshot(self, png: Vec<u8>) -> Self {
        self.lock().screenshot = Some(png);
        self
    }

    /// Make a command fail (`"click"`, `"goto"`, `"screenshot"`, ...)
    #[must_use]
    pub fn failing(self, command: impl Into<String>) -> Self {
        self.lock().failing.insert(command.into());
        self
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().call_history.clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.lock()
            .call_history
            .iter()
            .any(|c| c.starts_with(method))
    }

    /// Number of calls whose entry starts with `method`
    #[must_use]
    pub fn call_count(&self, method: &str) -> usize {
        self.lock()
            .call_history
            .iter()
            .filter(|c| c.starts_with(method))
            .count()
    }

    /// Whether `quit` has ended the current session
    #[must_use]
    pub fn has_quit(&self) -> bool {
        self.lock().closed
    }

    /// Start a new session on the same mock page
    pub(crate) fn reopen(&self) {
        self.lock().closed = false;
    }

    /// Text typed into an element since its last clear
    #[must_use]
    pub fn typed_text(&self, id: &str) -> Option<String> {
        self.lock().typed.get(id).cloned()
    }

    fn record(&self, command: &str, detail: &str) -> PageResult<MutexGuard<'_, MockState>> {
        let mut state = self.lock();
        state.call_history.push(if detail.is_empty() {
            command.to_string()
        } else {
            format!("{command}:{detail}")
        });
        if state.closed {
            return Err(StoreProbeError::driver(format!(
                "invalid session id: {command} after quit"
            )));
        }
        if state.failing.contains(command) {
            return Err(StoreProbeError::driver(format!("mock {command} failure")));
        }
        Ok(state)
    }
}

fn node<'a>(state: &'a MockState, element: &ElementRef) -> PageResult<&'a MockNode> {
    state
        .nodes
        .iter()
        .find(|n| n.element.id == element.id() && n.present())
        .ok_or_else(|| StoreProbeError::driver(format!("stale element reference: {element}")))
}

#[async_trait]
impl BrowserDriver for MockDriver {
    async fn goto(&self, url: &str) -> PageResult<()> {
        let mut state = self.record("goto", url)?;
        state.url = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> PageResult<String> {
        Ok(self.record("current_url", "")?.url.clone())
    }

    async fn title(&self) -> PageResult<String> {
        Ok(self.record("title", "")?.title.clone())
    }

    async fn find_all(&self, locator: &Locator) -> PageResult<Vec<ElementRef>> {
        let state = self.record("find_all", &locator.to_string())?;
        Ok(state
            .nodes
            .iter()
            .filter(|n| n.present() && n.element.locators.contains(locator))
            .map(|n| ElementRef::new(n.element.id.clone()))
            .collect())
    }

    async fn find_all_within(
        &self,
        parent: &ElementRef,
        locator: &Locator,
    ) -> PageResult<Vec<ElementRef>> {
        let state = self.record("find_all_within", &format!("{parent}/{locator}"))?;
        node(&state, parent)?;
        Ok(state
            .nodes
            .iter()
            .filter(|n| {
                n.present()
                    && n.element.parent.as_deref() == Some(parent.id())
                    && n.element.locators.contains(locator)
            })
            .map(|n| ElementRef::new(n.element.id.clone()))
            .collect())
    }

    async fn is_displayed(&self, element: &ElementRef) -> PageResult<bool> {
        let state = self.record("is_displayed", element.id())?;
        Ok(node(&state, element)?.element.displayed)
    }

    async fn is_enabled(&self, element: &ElementRef) -> PageResult<bool> {
        let state = self.record("is_enabled", element.id())?;
        Ok(node(&state, element)?.element.enabled)
    }

    async fn click(&self, element: &ElementRef) -> PageResult<()> {
        let mut state = self.record("click", element.id())?;
        let effects = node(&state, element)?.element.on_click.clone();
        for effect in effects {
            match effect {
                ClickEffect::Navigate(url) => state.url = url,
                ClickEffect::Reveal(id) => {
                    if let Some(n) = state.nodes.iter_mut().find(|n| n.element.id == id) {
                        n.element.attached = true;
                        n.added_at = Instant::now();
                    }
                }
            }
        }
        Ok(())
    }

    async fn clear(&self, element: &ElementRef) -> PageResult<()> {
        let mut state = self.record("clear", element.id())?;
        node(&state, element)?;
        state.typed.remove(element.id());
        Ok(())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> PageResult<()> {
        let mut state = self.record("send_keys", &format!("{element}={text}"))?;
        node(&state, element)?;
        state
            .typed
            .entry(element.id().to_string())
            .or_default()
            .push_str(text);
        Ok(())
    }

    async fn text(&self, element: &ElementRef) -> PageResult<String> {
        let state = self.record("text", element.id())?;
        Ok(node(&state, element)?.element.text.clone())
    }

    async fn screenshot(&self) -> PageResult<Screenshot> {
        let state = self.record("screenshot", "")?;
        state
            .screenshot
            .clone()
            .map(Screenshot::new)
            .ok_or_else(|| StoreProbeError::Screenshot {
                message: "No mock screenshot set".to_string(),
            })
    }

    async fn quit(&self) -> PageResult<()> {
        self.record("quit", "")?.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod screenshot_tests {
        use super::*;

        #[test]
        fn test_screenshot_validity() {
            assert!(Screenshot::new(vec![1, 2, 3]).is_valid());
            assert!(!Screenshot::new(Vec::new()).is_valid());
            assert_eq!(Screenshot::new(vec![0; 10]).size_bytes(), 10);
        }

        #[test]
        fn test_screenshot_save_creates_dirs() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("nested/shot.png");
            Screenshot::new(vec![9, 9]).save(&path).unwrap();
            assert_eq!(std::fs::read(path).unwrap(), vec![9, 9]);
        }
    }

    mod mock_driver_tests {
        use super::*;

        const BUTTON: Locator = Locator::id("go");
        const ITEM: Locator = Locator::css("li");

        #[tokio::test]
        async fn test_goto_records_and_sets_url() {
            let driver = MockDriver::new();
            driver.goto("https://shop.test/").await.unwrap();
            assert_eq!(driver.current_url().await.unwrap(), "https://shop.test/");
            assert!(driver.was_called("goto:https://shop.test/"));
        }

        #[tokio::test]
        async fn test_find_all_respects_attachment() {
            let driver = MockDriver::new()
                .with_element(MockElement::new("a").matching(ITEM))
                .with_element(MockElement::new("b").matching(ITEM).detached());
            let found = driver.find_all(&ITEM).await.unwrap();
            assert_eq!(found, vec![ElementRef::new("a")]);
        }

        #[tokio::test]
        async fn test_scoped_lookup() {
            let driver = MockDriver::new()
                .with_element(MockElement::new("card"))
                .with_element(MockElement::new("inner").matching(ITEM).child_of("card"))
                .with_element(MockElement::new("outer").matching(ITEM));
            let found = driver
                .find_all_within(&ElementRef::new("card"), &ITEM)
                .await
                .unwrap();
            assert_eq!(found, vec![ElementRef::new("inner")]);
        }

        #[tokio::test]
        async fn test_click_effects() {
            let driver = MockDriver::new()
                .with_element(
                    MockElement::new("go")
                        .matching(BUTTON)
                        .on_click(ClickEffect::Navigate("https://next/".into()))
                        .on_click(ClickEffect::Reveal("late".into())),
                )
                .with_element(MockElement::new("late").matching(ITEM).detached());
            driver.click(&ElementRef::new("go")).await.unwrap();
            assert_eq!(driver.current_url().await.unwrap(), "https://next/");
            assert_eq!(driver.find_all(&ITEM).await.unwrap().len(), 1);
        }

        #[tokio::test]
        async fn test_typing() {
            let driver = MockDriver::new().with_element(MockElement::new("q"));
            let q = ElementRef::new("q");
            driver.send_keys(&q, "old").await.unwrap();
            driver.clear(&q).await.unwrap();
            driver.send_keys(&q, "zapatos").await.unwrap();
            assert_eq!(driver.typed_text("q").as_deref(), Some("zapatos"));
        }

        #[tokio::test]
        async fn test_failing_command() {
            let driver = MockDriver::new().failing("quit");
            assert!(driver.quit().await.is_err());
            assert_eq!(driver.call_count("quit"), 1);
        }

        #[tokio::test]
        async fn test_commands_rejected_after_quit() {
            let driver = MockDriver::new().with_screenshot(vec![1]);
            driver.quit().await.unwrap();
            assert!(driver.has_quit());
            let err = driver.screenshot().await.unwrap_err();
            assert!(err.to_string().contains("after quit"));

            driver.reopen();
            assert!(driver.screenshot().await.is_ok());
        }

        #[tokio::test]
        async fn test_stale_element() {
            let driver = MockDriver::new();
            let err = driver.text(&ElementRef::new("ghost")).await.unwrap_err();
            assert!(err.to_string().contains("stale"));
        }

        #[tokio::test]
        async fn test_screenshot_unset() {
            let driver = MockDriver::new();
            assert!(matches!(
                driver.screenshot().await,
                Err(StoreProbeError::Screenshot { .. })
            ));
            let driver = MockDriver::new().with_screenshot(vec![1]);
            assert_eq!(driver.screenshot().await.unwrap().data, vec![1]);
        }

        #[tokio::test]
        async fn test_clones_share_state() {
            let driver = MockDriver::new();
            let handle = driver.clone();
            driver.goto("https://a/").await.unwrap();
            assert!(handle.was_called("goto"));
        }
    }
}
