//! Subscriber setup: stderr plus an optional plain-text log file.

use crate::error::{CliError, CliResult};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter for `level`; `RUST_LOG` wins when no flag raised or lowered it
fn filter(level: &str) -> EnvFilter {
    if level == "info" {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    }
}

/// Install the global subscriber.
///
/// With `log_file` set, the file is truncated and receives the same events
/// without ANSI colors.
pub fn init(level: &str, log_file: Option<&Path>) -> CliResult<()> {
    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = File::create(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .with(filter(level))
        .try_init()
        .map_err(|e| CliError::logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_level_ignores_env() {
        assert_eq!(filter("debug").to_string(), "debug");
        assert_eq!(filter("warn").to_string(), "warn");
    }
}
