//! Built-in storefront scenarios.

use crate::pages::HomePage;
use crate::suite::{ensure, Scenario, ScenarioFuture, TestContext};
use tracing::{info, warn};

/// Search term of the product scenario
pub const SEARCH_TERM: &str = "zapatos";
/// Brand refinement of the product scenario
pub const BRAND: &str = "Skechers";
/// Price range of the product scenario
pub const PRICE_RANGE: &str = "100-200";
/// Sort orders walked by the product scenario, in order
pub const SORT_SEQUENCE: [&str; 3] = ["price_high_low", "newest", "avg_review"];

/// Every built-in scenario
pub const ALL: [Scenario; 6] = [
    Scenario::new("test_page_title", &["smoke", "home"], page_title),
    Scenario::new("test_page_loaded_successfully", &["smoke", "home"], page_loaded),
    Scenario::new("test_url_is_correct", &["regression", "home"], url_is_correct),
    Scenario::new("test_menu_items_exist", &["regression", "home"], menu_items_exist),
    Scenario::new("test_search_input_exists", &["sanity", "home"], search_input_exists),
    Scenario::new("test_get_information_of_products", &["products"], product_information),
];

fn page_title(ctx: &TestContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let home = ctx.home();
        home.load().await?;
        let title = home.base().get_page_title().await?;
        ensure(!title.trim().is_empty(), "page title is empty")?;
        info!("Page title: {}", title);
        Ok(())
    })
}

fn page_loaded(ctx: &TestContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let home = ctx.home();
        home.load().await?;
        ensure(home.is_page_loaded().await, "home page did not load")?;
        info!("Home page loaded");
        Ok(())
    })
}

fn url_is_correct(ctx: &TestContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let home = ctx.home();
        home.load().await?;
        let expected = &ctx.config().base_url;
        let current = home.base().get_current_url().await?;
        ensure(
            current.contains(expected.as_str()),
            format!("unexpected URL: expected {expected}, got {current}"),
        )?;
        info!("URL verified: {}", current);
        Ok(())
    })
}

fn menu_items_exist(ctx: &TestContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let home = ctx.home();
        home.load().await?;
        let count = home.get_menu_items_count().await?;
        ensure(count > 0, "no menu items found")?;
        info!("Menu items found: {}", count);
        Ok(())
    })
}

fn search_input_exists(ctx: &TestContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let home = ctx.home();
        home.load().await?;
        if !home.base().is_element_visible(&HomePage::SEARCH_INPUT).await {
            if let Err(e) = ctx.take_screenshot("search_input_not_found").await {
                warn!("Could not capture search input screenshot: {}", e);
            }
            return ensure(false, "search input is not visible");
        }
        info!("Search input visible");
        Ok(())
    })
}

fn product_information(ctx: &TestContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let home = ctx.home();
        home.load().await?;
        let results = home.search_product(SEARCH_TERM).await?;

        info!("Currency: {}", results.change_money_to_dollars().await);

        results.apply_brand_filter(BRAND).await?;
        ensure(
            results.is_brand_filter_applied(BRAND).await,
            format!("brand filter '{BRAND}' was not applied"),
        )?;

        info!("Price filter: {}", results.apply_price_filter(PRICE_RANGE).await);
        info!("Products found: {}", results.get_product_count().await);

        for key in SORT_SEQUENCE {
            info!("Sort by {}: {}", key, results.sort_by(key).await);
            for (idx, product) in results
                .get_first_five_products_info()
                .await
                .iter()
                .enumerate()
            {
                info!("{} #{}: {}", key, idx + 1, product);
            }
        }
        Ok(())
    })
}
