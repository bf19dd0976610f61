//! Storeprobe: page-object browser test suite for e-commerce storefronts.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌────────────┐   ┌───────────────┐
//! │ Scenario     │──►│ Page objects │──►│ BasePage   │──►│ BrowserDriver │
//! │ (suite)      │   │ Home/Results │   │ + Waiter   │   │ WebDriver/Mock│
//! └──────────────┘   └──────────────┘   └────────────┘   └───────────────┘
//!        │
//!        ▼
//! ┌──────────────┐   ┌──────────────┐   ┌────────────┐
//! │ SuiteRunner  │──►│ Reporter +   │──►│ RunSummary │──► email
//! │ (fixtures)   │   │ ResultsWriter│   │            │
//! └──────────────┘   └──────────────┘   └────────────┘
//! ```
//!
//! Drivers are created per test by a [`DriverProvider`]; the runner always
//! quits them. Page primitives wait explicitly for elements; best-effort
//! page helpers report an [`Outcome`] instead of failing the test.

#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

pub mod config;
pub mod driver;
mod error;
pub mod factory;
pub mod locator;
pub mod page;
pub mod pages;
pub mod report;
pub mod suite;
pub mod wait;

/// Video capture of test runs
#[cfg(feature = "media")]
pub mod media;

/// W3C WebDriver backend
#[cfg(feature = "browser")]
pub mod webdriver;

pub use config::{parse_recipients, BrowserKind, EmailConfig, Overrides, SessionConfig};
pub use driver::{BrowserDriver, ElementRef, MockDriver, MockElement, Screenshot};
pub use error::{PageResult, StoreProbeError};
pub use factory::{DriverFactory, DriverProvider, LaunchOptions};
pub use locator::{xpath_literal, Locator, Strategy};
pub use page::{BasePage, PageObject};
pub use pages::{
    HomePage, Outcome, Price, PriceRange, ProductResultsPage, ProductSummary, SortOption,
};
pub use report::{collect_attachments, EmailReport, Mailer, RunSummary};
pub use suite::{Reporter, Scenario, SuiteRunner, TestContext, TestRecord, TestStatus};
pub use wait::{WaitOptions, Waiter};

/// Prelude for scenario authors
pub mod prelude {
    pub use super::config::*;
    pub use super::driver::*;
    pub use super::error::*;
    pub use super::factory::*;
    pub use super::locator::*;
    pub use super::page::*;
    pub use super::pages::*;
    pub use super::suite::{ensure, Scenario, ScenarioFuture, TestContext};
    pub use super::wait::*;
}
