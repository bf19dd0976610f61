//! Search results page.
//!
//! Filters, sorting and scraping here are best-effort: anything that can go
//! wrong on a live storefront (missing controls, layout changes) is reported
//! as [`Outcome::Degraded`] or an empty/zero value and logged as a warning.
//! Only the brand filter click propagates errors, since the scenarios assert
//! on it directly.

use crate::driver::ElementRef;
use crate::error::{PageResult, StoreProbeError};
use crate::locator::{xpath_literal, Locator, Strategy};
use crate::page::{BasePage, PageObject};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// Number of result cards scraped by [`ProductResultsPage::get_first_five_products_info`]
pub const PRODUCTS_TO_SCRAPE: usize = 5;

// =============================================================================
// OUTCOME
// =============================================================================

/// Result of a best-effort page action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The action was performed
    Applied,
    /// The page was already in the requested state
    AlreadyApplied,
    /// The action could not be performed; the page is unchanged or partially changed
    Degraded {
        /// What went wrong
        reason: String,
    },
}

impl Outcome {
    /// Build a degraded outcome and log it
    #[must_use]
    pub fn degraded(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        warn!("{}", reason);
        Self::Degraded { reason }
    }

    /// Whether the page ended up in the requested state
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self, Self::Applied | Self::AlreadyApplied)
    }

    /// Whether the action degraded
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied => f.write_str("applied"),
            Self::AlreadyApplied => f.write_str("already applied"),
            Self::Degraded { reason } => write!(f, "degraded: {reason}"),
        }
    }
}

// =============================================================================
// PRODUCT DATA
// =============================================================================

/// Price shown on a result card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Price {
    /// `<whole>.<fraction>` with thousands separators removed
    Amount(String),
    /// Card links to "See options" instead of a single price
    VariesByOption,
    /// No price could be read
    Unavailable,
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Amount(amount) => f.write_str(amount),
            Self::VariesByOption => f.write_str("Varies by option"),
            Self::Unavailable => f.write_str("Price unavailable"),
        }
    }
}

/// Name and price of one result card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    /// Product title
    pub name: String,
    /// Displayed price
    pub price: Price,
}

impl fmt::Display for ProductSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.name, self.price)
    }
}

// =============================================================================
// SORT OPTIONS
// =============================================================================

/// Entries of the sort dropdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOption {
    /// Price: high to low
    PriceHighLow,
    /// Average customer review
    AvgReview,
    /// Newest arrivals
    Newest,
}

impl SortOption {
    /// All options in dropdown order
    pub const ALL: [Self; 3] = [Self::PriceHighLow, Self::AvgReview, Self::Newest];

    /// Look up an option by its key
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|option| option.key() == key)
    }

    /// Key used by callers (`price_high_low`, `avg_review`, `newest`)
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::PriceHighLow => "price_high_low",
            Self::AvgReview => "avg_review",
            Self::Newest => "newest",
        }
    }

    /// Dropdown entry to click
    #[must_use]
    pub const fn locator(&self) -> Locator {
        match self {
            Self::PriceHighLow => {
                Locator::xpath("//div[@aria-hidden='false']//*[@id='s-result-sort-select_2']")
            }
            Self::AvgReview => {
                Locator::xpath("//div[@aria-hidden='false']//*[@id='s-result-sort-select_3']")
            }
            Self::Newest => {
                Locator::xpath("//div[@aria-hidden='false']//*[@id='s-result-sort-select_4']")
            }
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// =============================================================================
// PRICE RANGE
// =============================================================================

/// Inclusive price filter parsed from `"min-max"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    /// Lower bound
    pub min: u64,
    /// Upper bound
    pub max: u64,
}

impl PriceRange {
    const LOW_PARAM: &'static str = "low-price";
    const HIGH_PARAM: &'static str = "high-price";

    /// Query string fragment for this range
    #[must_use]
    pub fn query(&self) -> String {
        format!(
            "{}={}&{}={}",
            Self::LOW_PARAM,
            self.min,
            Self::HIGH_PARAM,
            self.max
        )
    }

    /// Whether `url` already carries exactly this range
    #[must_use]
    pub fn is_applied_in(&self, url: &str) -> bool {
        query_param(url, Self::LOW_PARAM) == Some(self.min.to_string().as_str())
            && query_param(url, Self::HIGH_PARAM) == Some(self.max.to_string().as_str())
    }

    /// `url` with this range appended to its query string
    #[must_use]
    pub fn apply_to(&self, url: &str) -> String {
        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{url}{separator}{}", self.query())
    }
}

impl FromStr for PriceRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (min, max) = s
            .split_once('-')
            .ok_or_else(|| format!("price range {s:?} is not of the form min-max"))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<u64>()
                .map_err(|_| format!("price range {s:?} has a non-numeric bound {part:?}"))
        };
        Ok(Self {
            min: parse(min)?,
            max: parse(max)?,
        })
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

fn query_param<'a>(url: &'a str, key: &str) -> Option<&'a str> {
    let (_, query) = url.split_once('?')?;
    let query = query.split('#').next().unwrap_or(query);
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

/// Pull the total from a caption like `"1-48 of over 20,000 results for"`.
///
/// The number is the token right before the first word containing "results".
#[must_use]
pub fn parse_result_count(caption: &str) -> Option<u64> {
    let tokens: Vec<&str> = caption.split_whitespace().collect();
    tokens.windows(2).find_map(|pair| {
        if pair[1].to_lowercase().contains("results") {
            pair[0].replace(',', "").parse::<u64>().ok()
        } else {
            None
        }
    })
}

// =============================================================================
// PAGE
// =============================================================================

/// Search results listing with filters and sorting
#[derive(Debug, Clone)]
pub struct ProductResultsPage {
    base: BasePage,
}

impl ProductResultsPage {
    /// Language/currency flyout button
    pub const CURRENCY_FLYOUT: Locator = Locator::xpath("//*[@id='icp-nav-flyout']/button");
    /// USD entry of the currency flyout
    pub const USD_OPTION: Locator = Locator::xpath("//a[contains(@href, 'currency=USD')]");
    /// Caption with the total number of results
    pub const RESULTS_CAPTION: Locator = Locator::xpath("//span[contains(text(), 'results for')]");
    /// Sort dropdown trigger
    pub const SORT_DROPDOWN: Locator =
        Locator::xpath("//select[@id='s-result-sort-select']/following-sibling::span");
    /// One search result card
    pub const RESULT_CARD: Locator = Locator::xpath("//div[@data-component-type='s-search-result']");
    /// Product title inside a card
    pub const CARD_NAME: Locator = Locator::xpath(".//h2//span");
    /// "See options" link inside a card
    pub const CARD_SEE_OPTIONS: Locator = Locator::xpath(".//a[contains(text(),'See options')]");
    /// Whole part of the price inside a card
    pub const CARD_PRICE_WHOLE: Locator = Locator::xpath(".//span[@class='a-price-whole']");
    /// Fractional part of the price inside a card
    pub const CARD_PRICE_FRACTION: Locator = Locator::xpath(".//span[@class='a-price-fraction']");

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

    /// Switch prices to US dollars through the currency flyout
    pub async fn change_money_to_dollars(&self) -> Outcome {
        let url = match self.base.get_current_url().await {
            Ok(url) => url,
            Err(e) => return Outcome::degraded(format!("Could not read current URL: {e}")),
        };
        if url.contains("currency=USD") {
            info!("Currency is already USD");
            return Outcome::AlreadyApplied;
        }

        if !self.base.is_element_visible(&Self::CURRENCY_FLYOUT).await {
            return Outcome::degraded("Currency selector not found, keeping current currency");
        }
        if let Err(e) = self.base.click(&Self::CURRENCY_FLYOUT).await {
            return Outcome::degraded(format!("Could not open currency selector: {e}"));
        }
        if !self.base.is_element_visible(&Self::USD_OPTION).await {
            return Outcome::degraded("USD option not found, keeping current currency");
        }
        if let Err(e) = self.base.click(&Self::USD_OPTION).await {
            return Outcome::degraded(format!("Could not select USD: {e}"));
        }

        info!("Currency changed to USD");
        Outcome::Applied
    }

    /// Link of the brand entry in the brand refinement list
    pub fn brand_filter_locator(brand: &str) -> PageResult<Locator> {
        Locator::new(Strategy::XPath, format!("{}//a", Self::brand_item(brand)?))
    }

    /// Brand link marked as the active refinement
    pub fn brand_checked_locator(brand: &str) -> PageResult<Locator> {
        Locator::new(
            Strategy::XPath,
            format!("{}//a[@aria-current='true']", Self::brand_item(brand)?),
        )
    }

    fn brand_item(brand: &str) -> PageResult<String> {
        if brand.trim().is_empty() {
            return Err(StoreProbeError::InvalidLocator {
                message: "brand name is empty".to_string(),
            });
        }
        Ok(format!("//li[contains(.//span, {})]", xpath_literal(brand)))
    }

    /// Click the brand refinement
    pub async fn apply_brand_filter(&self, brand: &str) -> PageResult<()> {
        let locator = Self::brand_filter_locator(brand)?;
        self.base.click(&locator).await?;
        info!("Brand '{}' filtered", brand);
        Ok(())
    }

    /// Whether the brand refinement is active
    pub async fn is_brand_filter_applied(&self, brand: &str) -> bool {
        let locator = match Self::brand_checked_locator(brand) {
            Ok(locator) => locator,
            Err(e) => {
                warn!("{}", e);
                return false;
            }
        };
        let applied = self.base.is_element_visible(&locator).await;
        info!("Brand '{}' selected: {}", brand, applied);
        applied
    }

    /// Restrict results to a `"min-max"` price range by rewriting the URL
    pub async fn apply_price_filter(&self, range: &str) -> Outcome {
        let range: PriceRange = match range.parse() {
            Ok(range) => range,
            Err(reason) => return Outcome::degraded(format!("Price filter not applied: {reason}")),
        };
        let url = match self.base.get_current_url().await {
            Ok(url) => url,
            Err(e) => return Outcome::degraded(format!("Price filter not applied: {e}")),
        };
        if range.is_applied_in(&url) {
            info!("Price filter {} already applied", range);
            return Outcome::AlreadyApplied;
        }

        match self.base.navigate(&range.apply_to(&url)).await {
            Ok(()) => {
                info!("Price filter {} applied", range);
                Outcome::Applied
            }
            Err(e) => Outcome::degraded(format!("Price filter not applied: {e}")),
        }
    }

    /// Total results from the results caption, `0` when unavailable
    pub async fn get_product_count(&self) -> u64 {
        if !self.base.is_element_visible(&Self::RESULTS_CAPTION).await {
            warn!("Results caption not found");
            return 0;
        }
        let caption = match self.base.get_text(&Self::RESULTS_CAPTION).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Could not read results caption: {}", e);
                return 0;
            }
        };
        let count = parse_result_count(&caption).unwrap_or_else(|| {
            warn!("Could not parse a result count from {:?}", caption);
            0
        });
        info!("Products found: {}", count);
        count
    }

    /// Open the sort dropdown
    pub async fn sort_by_options(&self) -> PageResult<()> {
        self.base.click(&Self::SORT_DROPDOWN).await
    }

    /// Sort results by `price_high_low`, `avg_review` or `newest`
    pub async fn sort_by(&self, option: &str) -> Outcome {
        let Some(sort) = SortOption::from_key(option) else {
            let known: Vec<&str> = SortOption::ALL.iter().map(SortOption::key).collect();
            return Outcome::degraded(format!(
                "Unknown sort option '{option}', expected one of {known:?}"
            ));
        };

        if let Err(e) = self.sort_by_options().await {
            return Outcome::degraded(format!("Could not open sort options: {e}"));
        }
        if let Err(e) = self.base.click(&sort.locator()).await {
            return Outcome::degraded(format!("Could not sort by {sort}: {e}"));
        }
        info!("Products sorted by: {}", sort);
        Outcome::Applied
    }

    /// Name and price of up to the first five result cards.
    ///
    /// Cards whose name cannot be read are skipped.
    pub async fn get_first_five_products_info(&self) -> Vec<ProductSummary> {
        let cards = match self.base.find_elements(&Self::RESULT_CARD).await {
            Ok(cards) => cards,
            Err(e) => {
                warn!("Could not list result cards: {}", e);
                return Vec::new();
            }
        };

        let mut products = Vec::new();
        for card in cards.iter().take(PRODUCTS_TO_SCRAPE) {
            match self.read_card(card).await {
                Ok(product) => {
                    if product.price == Price::Unavailable {
                        warn!("Product found: {}", product);
                    } else {
                        info!("Product found: {}", product);
                    }
                    products.push(product);
                }
                Err(e) => warn!("Skipping result card: {}", e),
            }
        }
        products
    }

    async fn read_card(&self, card: &ElementRef) -> PageResult<ProductSummary> {
        let name = self
            .within(card, &Self::CARD_NAME)
            .await?
            .ok_or_else(|| StoreProbeError::ElementNotFound {
                locator: Self::CARD_NAME.to_string(),
                waited_ms: 0,
            })?;
        let name = self.base.driver().text(&name).await?;
        let price = self.read_price(card).await.unwrap_or(Price::Unavailable);
        Ok(ProductSummary { name, price })
    }

    async fn read_price(&self, card: &ElementRef) -> PageResult<Price> {
        if self.within(card, &Self::CARD_SEE_OPTIONS).await?.is_some() {
            return Ok(Price::VariesByOption);
        }
        let whole = self.within(card, &Self::CARD_PRICE_WHOLE).await?;
        let fraction = self.within(card, &Self::CARD_PRICE_FRACTION).await?;
        match (whole, fraction) {
            (Some(whole), Some(fraction)) => {
                let driver = self.base.driver();
                let whole = driver.text(&whole).await?.replace(',', "");
                let fraction = driver.text(&fraction).await?;
                Ok(Price::Amount(format!("{}.{}", whole.trim(), fraction.trim())))
            }
            _ => Ok(Price::Unavailable),
        }
    }

    async fn within(&self, card: &ElementRef, locator: &Locator) -> PageResult<Option<ElementRef>> {
        Ok(self
            .base
            .driver()
            .find_all_within(card, locator)
            .await?
            .into_iter()
            .next())
    }
}

#[async_trait]
impl PageObject for ProductResultsPage {
    fn url_pattern(&self) -> &str {
        "/s?"
    }

    fn page_name(&self) -> &str {
        "product results"
    }

    async fn is_loaded(&self) -> bool {
        match self.base.get_current_url().await {
            Ok(url) if self.matches_url(&url) => {
                self.base.is_element_visible(&Self::RESULT_CARD).await
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::driver::{BrowserDriver, ClickEffect, MockDriver, MockElement};
    use crate::wait::WaitOptions;
    use proptest::prelude::*;
    use std::sync::Arc;

    const SEARCH_URL: &str = "https://shop.test/s?k=zapatos";

    fn results(mock: &MockDriver) -> ProductResultsPage {
        ProductResultsPage::new(
            BasePage::new(Arc::new(mock.clone()), Arc::new(SessionConfig::new()))
                .with_wait(WaitOptions::new().with_timeout(150).with_poll_interval(15)),
        )
    }

    fn card(mock: MockDriver, id: &str, name: &str) -> MockDriver {
        mock.with_element(MockElement::new(id).matching(ProductResultsPage::RESULT_CARD))
            .with_element(
                MockElement::new(format!("{id}-name"))
                    .matching(ProductResultsPage::CARD_NAME)
                    .child_of(id)
                    .with_text(name),
            )
    }

    fn priced(mock: MockDriver, id: &str, whole: &str, fraction: &str) -> MockDriver {
        mock.with_element(
            MockElement::new(format!("{id}-whole"))
                .matching(ProductResultsPage::CARD_PRICE_WHOLE)
                .child_of(id)
                .with_text(whole),
        )
        .with_element(
            MockElement::new(format!("{id}-fraction"))
                .matching(ProductResultsPage::CARD_PRICE_FRACTION)
                .child_of(id)
                .with_text(fraction),
        )
    }

    mod currency_tests {
        use super::*;

        #[tokio::test]
        async fn test_already_usd() {
            let mock = MockDriver::new().with_url("https://shop.test/s?k=x&currency=USD");
            assert_eq!(results(&mock).change_money_to_dollars().await, Outcome::AlreadyApplied);
            assert!(!mock.was_called("click"));
        }

        #[tokio::test]
        async fn test_switches_through_flyout() {
            let mock = MockDriver::new()
                .with_url(SEARCH_URL)
                .with_element(
                    MockElement::new("flyout")
                        .matching(ProductResultsPage::CURRENCY_FLYOUT)
                        .on_click(ClickEffect::Reveal("usd".into())),
                )
                .with_element(
                    MockElement::new("usd")
                        .matching(ProductResultsPage::USD_OPTION)
                        .detached()
                        .on_click(ClickEffect::Navigate(format!("{SEARCH_URL}&currency=USD"))),
                );
            let outcome = results(&mock).change_money_to_dollars().await;
            assert_eq!(outcome, Outcome::Applied);
            assert!(mock.was_called("click:flyout"));
            assert!(mock.was_called("click:usd"));
        }

        #[tokio::test]
        async fn test_missing_control_degrades() {
            let mock = MockDriver::new().with_url(SEARCH_URL);
            let outcome = results(&mock).change_money_to_dollars().await;
            assert!(outcome.is_degraded());
            assert!(!outcome.succeeded());
        }

        #[tokio::test]
        async fn test_missing_option_degrades() {
            let mock = MockDriver::new().with_url(SEARCH_URL).with_element(
                MockElement::new("flyout").matching(ProductResultsPage::CURRENCY_FLYOUT),
            );
            match results(&mock).change_money_to_dollars().await {
                Outcome::Degraded { reason } => assert!(reason.contains("USD option")),
                other => panic!("unexpected outcome: {other}"),
            }
        }
    }

    mod brand_tests {
        use super::*;

        #[test]
        fn test_brand_locators() {
            let link = ProductResultsPage::brand_filter_locator("Skechers").unwrap();
            assert_eq!(link.selector(), "//li[contains(.//span, 'Skechers')]//a");
            let checked = ProductResultsPage::brand_checked_locator("Skechers").unwrap();
            assert_eq!(
                checked.selector(),
                "//li[contains(.//span, 'Skechers')]//a[@aria-current='true']"
            );
        }

        #[test]
        fn test_brand_with_quote_is_well_formed() {
            let link = ProductResultsPage::brand_filter_locator("Levi's").unwrap();
            assert_eq!(link.selector(), "//li[contains(.//span, \"Levi's\")]//a");
        }

        #[test]
        fn test_empty_brand_rejected() {
            assert!(matches!(
                ProductResultsPage::brand_filter_locator("  "),
                Err(StoreProbeError::InvalidLocator { .. })
            ));
        }

        #[tokio::test]
        async fn test_apply_and_check_brand() {
            let link = ProductResultsPage::brand_filter_locator("Skechers").unwrap();
            let checked = ProductResultsPage::brand_checked_locator("Skechers").unwrap();
            let mock = MockDriver::new()
                .with_element(
                    MockElement::new("brand")
                        .matching(link)
                        .on_click(ClickEffect::Reveal("brand-on".into())),
                )
                .with_element(MockElement::new("brand-on").matching(checked).detached());
            let page = results(&mock);
            assert!(!page.is_brand_filter_applied("Skechers").await);
            page.apply_brand_filter("Skechers").await.unwrap();
            assert!(page.is_brand_filter_applied("Skechers").await);
        }

        #[tokio::test]
        async fn test_missing_brand_errors() {
            let mock = MockDriver::new();
            let err = results(&mock).apply_brand_filter("Nobody").await.unwrap_err();
            assert!(err.is_timeout());
        }
    }

    mod price_filter_tests {
        use super::*;

        #[test]
        fn test_parse_range() {
            assert_eq!(
                "100-200".parse::<PriceRange>().unwrap(),
                PriceRange { min: 100, max: 200 }
            );
            assert!("100".parse::<PriceRange>().is_err());
            assert!("a-b".parse::<PriceRange>().is_err());
            assert!("-200".parse::<PriceRange>().is_err());
        }

        #[test]
        fn test_apply_to_url_without_query() {
            let range = PriceRange { min: 1, max: 2 };
            assert_eq!(
                range.apply_to("https://shop.test/s"),
                "https://shop.test/s?low-price=1&high-price=2"
            );
        }

        #[test]
        fn test_exact_param_match() {
            let range = PriceRange { min: 50, max: 100 };
            assert!(range.is_applied_in("https://x/s?k=a&low-price=50&high-price=100"));
            assert!(!range.is_applied_in("https://x/s?k=a&low-price=500&high-price=1000"));
        }

        #[tokio::test]
        async fn test_appends_then_noop() {
            let mock = MockDriver::new().with_url(SEARCH_URL);
            let page = results(&mock);
            assert_eq!(page.apply_price_filter("50-100").await, Outcome::Applied);
            assert_eq!(
                mock.current_url().await.unwrap(),
                format!("{SEARCH_URL}&low-price=50&high-price=100")
            );
            assert_eq!(page.apply_price_filter("50-100").await, Outcome::AlreadyApplied);
            assert_eq!(mock.call_count("goto"), 1);
        }

        #[tokio::test]
        async fn test_malformed_range_degrades() {
            let mock = MockDriver::new().with_url(SEARCH_URL);
            let outcome = results(&mock).apply_price_filter("cheap").await;
            assert!(outcome.is_degraded());
            assert!(!mock.was_called("goto"));
        }
    }

    mod count_tests {
        use super::*;

        #[test]
        fn test_parse_caption() {
            assert_eq!(parse_result_count("1-48 of over 20,000 results for"), Some(20_000));
            assert_eq!(parse_result_count("1-16 of 245 results for"), Some(245));
            assert_eq!(parse_result_count("no matches"), None);
            assert_eq!(parse_result_count("results for"), None);
        }

        #[tokio::test]
        async fn test_count_from_caption() {
            let mock = MockDriver::new().with_element(
                MockElement::new("caption")
                    .matching(ProductResultsPage::RESULTS_CAPTION)
                    .with_text("1-48 of over 20,000 results for"),
            );
            assert_eq!(results(&mock).get_product_count().await, 20_000);
        }

        #[tokio::test]
        async fn test_missing_caption_is_zero() {
            let mock = MockDriver::new();
            assert_eq!(results(&mock).get_product_count().await, 0);
        }

        proptest! {
            #[test]
            fn prop_caption_round_trip(n in 0u64..10_000_000_000) {
                let mut grouped = String::new();
                let digits = n.to_string();
                for (i, c) in digits.chars().enumerate() {
                    if i > 0 && (digits.len() - i) % 3 == 0 {
                        grouped.push(',');
                    }
                    grouped.push(c);
                }
                let caption = format!("1-48 of over {grouped} results for");
                prop_assert_eq!(parse_result_count(&caption), Some(n));
            }

            #[test]
            fn prop_never_panics(caption in ".{0,64}") {
                let _ = parse_result_count(&caption);
            }
        }
    }

    mod sort_tests {
        use super::*;

        fn sortable() -> MockDriver {
            let mut mock = MockDriver::new().with_element(
                MockElement::new("dropdown").matching(ProductResultsPage::SORT_DROPDOWN),
            );
            for option in SortOption::ALL {
                mock = mock.with_element(MockElement::new(option.key()).matching(option.locator()));
            }
            mock
        }

        #[test]
        fn test_lookup_table() {
            assert_eq!(SortOption::from_key("price_high_low"), Some(SortOption::PriceHighLow));
            assert_eq!(SortOption::from_key("bogus"), None);
            assert!(SortOption::Newest
                .locator()
                .selector()
                .ends_with("s-result-sort-select_4']"));
        }

        #[tokio::test]
        async fn test_sort_clicks_mapped_entry() {
            let mock = sortable();
            let outcome = results(&mock).sort_by("price_high_low").await;
            assert!(outcome.succeeded());
            assert!(mock.was_called("click:dropdown"));
            assert!(mock.was_called("click:price_high_low"));
        }

        #[tokio::test]
        async fn test_unknown_option_touches_nothing() {
            let mock = sortable();
            let outcome = results(&mock).sort_by("bogus").await;
            assert!(!outcome.succeeded());
            assert!(mock.history().is_empty());
        }

        #[tokio::test]
        async fn test_missing_dropdown_degrades() {
            let mock = MockDriver::new();
            assert!(results(&mock).sort_by("newest").await.is_degraded());
        }
    }

    mod scrape_tests {
        use super::*;

        #[tokio::test]
        async fn test_five_cards_third_unavailable() {
            let mut mock = MockDriver::new();
            for i in 1..=5 {
                let id = format!("c{i}");
                mock = card(mock, &id, &format!("Shoe {i}"));
                if i != 3 {
                    mock = priced(mock, &id, "1,299", "99");
                }
            }
            let products = results(&mock).get_first_five_products_info().await;
            assert_eq!(products.len(), 5);
            assert_eq!(products[2].price, Price::Unavailable);
            for i in [0, 1, 3, 4] {
                assert_eq!(products[i].price, Price::Amount("1299.99".to_string()));
            }
            assert_eq!(products[4].name, "Shoe 5");
        }

        #[tokio::test]
        async fn test_see_options_wins() {
            let mock = priced(card(MockDriver::new(), "c1", "Boot"), "c1", "10", "00")
                .with_element(
                    MockElement::new("c1-options")
                        .matching(ProductResultsPage::CARD_SEE_OPTIONS)
                        .child_of("c1"),
                );
            let products = results(&mock).get_first_five_products_info().await;
            assert_eq!(products[0].price, Price::VariesByOption);
        }

        #[tokio::test]
        async fn test_limits_to_five_and_skips_nameless() {
            let mut mock = MockDriver::new()
                .with_element(MockElement::new("nameless").matching(ProductResultsPage::RESULT_CARD));
            for i in 1..=6 {
                mock = card(mock, &format!("c{i}"), &format!("Shoe {i}"));
            }
            let products = results(&mock).get_first_five_products_info().await;
            assert_eq!(products.len(), 4);
            assert_eq!(products[0].name, "Shoe 1");
        }

        #[tokio::test]
        async fn test_no_cards() {
            let mock = MockDriver::new();
            assert!(results(&mock).get_first_five_products_info().await.is_empty());
        }
    }

    mod page_object_tests {
        use super::*;
        use crate::page::PageObject;

        #[tokio::test]
        async fn test_loaded_on_search_url_with_cards() {
            let mock = card(MockDriver::new().with_url(SEARCH_URL), "c1", "Go Walk");
            assert!(results(&mock).is_loaded().await);
        }

        #[tokio::test]
        async fn test_not_loaded_away_from_search_url() {
            let mock = card(MockDriver::new().with_url("https://shop.test/"), "c1", "Go Walk");
            let page = results(&mock);
            assert!(!page.matches_url("https://shop.test/"));
            assert!(!page.is_loaded().await);
            assert!(!mock.was_called("find_all"));
        }
    }
}
