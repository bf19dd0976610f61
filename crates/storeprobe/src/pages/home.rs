//! Storefront landing page.

use crate::error::PageResult;
use crate::locator::Locator;
use crate::page::{BasePage, PageObject};
use crate::pages::results::ProductResultsPage;
use async_trait::async_trait;
use tracing::{info, warn};

/// Landing page with the search bar and navigation menu
#[derive(Debug, Clone)]
pub struct HomePage {
    base: BasePage,
}

impl HomePage {
    /// Search text field
    pub const SEARCH_INPUT: Locator = Locator::id("twotabsearchtextbox");
    /// Search submit button
    pub const SEARCH_SUBMIT: Locator = Locator::id("nav-search-submit-button");
    /// Site logo
    pub const LOGO: Locator = Locator::class_name("logo");
    /// Entries of the navigation menu
    pub const MENU_ITEMS: Locator = Locator::css("nav ul li");

    /// Wrap a base page
    #[must_use]
    pub const fn new(base: BasePage) -> Self {
        Self { base }
    }

    /// Base page primitives
    #[must_use]
    pub const fn base(&self) -> &BasePage {
        &self.base
    }

    /// Open the configured base URL
    pub async fn load(&self) -> PageResult<()> {
        let url = self.base.config().base_url.clone();
        self.base.navigate(&url).await?;
        info!("Home page loaded: {}", url);
        Ok(())
    }

    /// Type `query` into the search field and submit
    pub async fn search(&self, query: &str) -> PageResult<()> {
        self.base.send_keys(&Self::SEARCH_INPUT, query).await?;
        self.base.click(&Self::SEARCH_SUBMIT).await?;
        info!("Searched for: {}", query);
        Ok(())
    }

    /// Search and hand over to the results page.
    ///
    /// Landing somewhere other than the results page is only logged; the
    /// result page operations degrade on their own.
    pub async fn search_product(&self, query: &str) -> PageResult<ProductResultsPage> {
        self.search(query).await?;
        let results = ProductResultsPage::new(self.base.clone());
        let url = self.base.get_current_url().await?;
        if !results.matches_url(&url) {
            warn!("Search for {} did not open the {} page: {}", query, results.page_name(), url);
        }
        Ok(results)
    }

    /// Text of the logo element
    pub async fn get_logo_text(&self) -> PageResult<String> {
        self.base.get_text(&Self::LOGO).await
    }

    /// Number of navigation menu entries currently rendered
    pub async fn get_menu_items_count(&self) -> PageResult<usize> {
        Ok(self.base.find_elements(&Self::MENU_ITEMS).await?.len())
    }

    /// Whether the search field is visible
    pub async fn is_page_loaded(&self) -> bool {
        self.base.is_element_visible(&Self::SEARCH_INPUT).await
    }
}

#[async_trait]
impl PageObject for HomePage {
    fn url_pattern(&self) -> &str {
        &self.base.config().base_url
    }

    fn page_name(&self) -> &str {
        "home"
    }

    async fn is_loaded(&self) -> bool {
        match self.base.get_current_url().await {
            Ok(url) if self.matches_url(&url) => self.is_page_loaded().await,
            _ => false,
        }
    }
}
