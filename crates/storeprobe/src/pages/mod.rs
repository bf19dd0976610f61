//! Storefront page objects.

pub mod home;
pub mod results;

pub use home::HomePage;
pub use results::{Outcome, Price, PriceRange, ProductResultsPage, ProductSummary, SortOption};
