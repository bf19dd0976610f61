//! Result and error types for Storeprobe.

use thiserror::Error;

/// Result type for Storeprobe operations
pub type PageResult<T> = Result<T, StoreProbeError>;

/// Errors that can occur while driving the storefront
#[derive(Debug, Error)]
pub enum StoreProbeError {
    /// Requested browser is not one of the supported kinds
    #[error("Unsupported browser: {name} (expected chrome or firefox)")]
    UnsupportedBrowser {
        /// Identifier that was requested
        name: String,
    },

    /// No driver binary could be resolved for the browser
    #[error("Could not resolve {binary}: set DRIVER_PATH or put it on PATH")]
    DriverUnresolved {
        /// Driver binary name (chromedriver, geckodriver)
        binary: String,
    },

    /// Resolved driver binary does not exist on disk
    #[error("Driver binary not found at {path}")]
    DriverNotFound {
        /// Path that was checked
        path: String,
    },

    /// Driver service or session could not be started
    #[error("Failed to create WebDriver session: {message}")]
    DriverCreation {
        /// Error message
        message: String,
    },

    /// Explicit wait elapsed before the element reached the expected state
    #[error("Element {locator} not found after {waited_ms}ms")]
    ElementNotFound {
        /// Rendered locator
        locator: String,
        /// Wait window in milliseconds
        waited_ms: u64,
    },

    /// Locator failed validation
    #[error("Invalid locator: {message}")]
    InvalidLocator {
        /// Error message
        message: String,
    },

    /// A browser command failed
    #[error("Driver command failed: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    Screenshot {
        /// Error message
        message: String,
    },

    /// Video recording error
    #[error("Video recording failed: {message}")]
    VideoRecording {
        /// Error message
        message: String,
    },

    /// Assertion inside a scenario failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Configuration could not be resolved
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Email composition or transport error
    #[error("Email error: {message}")]
    Email {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Archive error
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl StoreProbeError {
    /// Create a driver command error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error is an explicit-wait timeout
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::ElementNotFound { .. })
    }
}
