//! Explicit-wait polling.
//!
//! A single bounded window: the condition is checked immediately, then every
//! poll interval until it yields a value or the window closes.

use crate::config::SessionConfig;
use crate::error::{PageResult, StoreProbeError};
use std::future::Future;
use std::time::{Duration, Instant};

/// Default explicit wait (20 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 20_000;

/// Default polling interval (500ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive options from the session's explicit wait settings
    #[must_use]
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            timeout_ms: config.explicit_wait.as_millis() as u64,
            poll_interval_ms: config.poll_interval.as_millis() as u64,
        }
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Timeout as duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Poll interval as duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Polls async conditions inside one explicit-wait window
#[derive(Debug, Clone, Copy, Default)]
pub struct Waiter {
    options: WaitOptions,
}

impl Waiter {
    /// Create a waiter
    #[must_use]
    pub const fn new(options: WaitOptions) -> Self {
        Self { options }
    }

    /// Options in effect
    #[must_use]
    pub const fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// Poll `check` until it yields `Some`.
    ///
    /// Driver errors raised by `check` abort the wait immediately. When the
    /// window closes the result is `ElementNotFound` naming `description`.
    pub async fn until<T, F, Fut>(&self, description: &str, mut check: F) -> PageResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = PageResult<Option<T>>>,
    {
        let start = Instant::now();
        let timeout = self.options.timeout();
        let poll = self.options.poll_interval();

        loop {
            if let Some(value) = check().await? {
                return Ok(value);
            }
            let elapsed = start.elapsed();
            if elapsed >= timeout {
                break;
            }
            tokio::time::sleep(poll.min(timeout - elapsed)).await;
        }

        Err(StoreProbeError::ElementNotFound {
            locator: description.to_string(),
            waited_ms: self.options.timeout_ms,
        })
    }
}
