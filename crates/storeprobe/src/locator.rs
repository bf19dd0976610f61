//! Element locators.
//!
//! A locator is an immutable (strategy, selector) pair. Page objects declare
//! their fixed locators as `const` items; locators built from runtime text
//! go through [`Locator::new`] which rejects empty selectors.

use crate::error::{PageResult, StoreProbeError};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

// =============================================================================
// STRATEGY
// =============================================================================

/// How a selector is interpreted by the browser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// Element `id` attribute
    Id,
    /// CSS selector
    Css,
    /// Single CSS class name
    ClassName,
    /// XPath expression
    XPath,
}

impl Strategy {
    /// Short prefix used when rendering a locator
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Css => "css",
            Self::ClassName => "class",
            Self::XPath => "xpath",
        }
    }
}

// =============================================================================
// LOCATOR
// =============================================================================

/// Immutable (strategy, selector) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    strategy: Strategy,
    selector: Cow<'static, str>,
}

impl Locator {
    /// Build a locator from runtime text, rejecting blank selectors
    pub fn new(strategy: Strategy, selector: impl Into<String>) -> PageResult<Self> {
        let selector = selector.into();
        if selector.trim().is_empty() {
            return Err(StoreProbeError::InvalidLocator {
                message: format!("empty {} selector", strategy.prefix()),
            });
        }
        Ok(Self {
            strategy,
            selector: Cow::Owned(selector),
        })
    }

    /// Locate by `id`
    #[must_use]
    pub const fn id(selector: &'static str) -> Self {
        Self::fixed(Strategy::Id, selector)
    }

    /// Locate by CSS selector
    #[must_use]
    pub const fn css(selector: &'static str) -> Self {
        Self::fixed(Strategy::Css, selector)
    }

    /// Locate by class name
    #[must_use]
    pub const fn class_name(selector: &'static str) -> Self {
        Self::fixed(Strategy::ClassName, selector)
    }

    /// Locate by XPath
    #[must_use]
    pub const fn xpath(selector: &'static str) -> Self {
        Self::fixed(Strategy::XPath, selector)
    }

    const fn fixed(strategy: Strategy, selector: &'static str) -> Self {
        Self {
            strategy,
            selector: Cow::Borrowed(selector),
        }
    }

    /// Strategy
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Raw selector text
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy.prefix(), self.selector)
    }
}

// =============================================================================
// XPATH LITERALS
// =============================================================================

/// Quote arbitrary text as an XPath 1.0 string literal.
///
/// XPath 1.0 has no escape sequences, so text containing both quote kinds
/// is split into a `concat()` of single- and double-quoted pieces.
#[must_use]
pub fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        return format!("'{text}'");
    }
    if !text.contains('"') {
        return format!("\"{text}\"");
    }

    let mut parts = Vec::new();
    for (i, chunk) in text.split('\'').enumerate() {
        if i > 0 {
            parts.push("\"'\"".to_string());
        }
        if !chunk.is_empty() {
            parts.push(format!("'{chunk}'"));
        }
    }
    format!("concat({})", parts.join(", "))
}
