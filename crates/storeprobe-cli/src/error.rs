//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Storeprobe library error
    #[error("{0}")]
    StoreProbe(#[from] storeprobe::StoreProbeError),

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Logging could not be installed
    #[error("Logging setup failed: {message}")]
    Logging {
        /// Error message
        message: String,
    },

    /// The suite ran but some scenarios did not pass
    #[error("{failed} of {total} scenarios failed")]
    TestsFailed {
        /// Failed scenarios
        failed: usize,
        /// Executed scenarios
        total: usize,
    },
}

impl CliError {
    /// Create a logging setup error
    #[must_use]
    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }
}
