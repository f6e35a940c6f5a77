//! # Logging & Tracing Infrastructure
//!
//! Configures the `tracing-subscriber` stack for the core:
//! - Pretty, compact, and JSON output formats
//! - `EnvFilter`-based module-level filtering (`RUST_LOG` style)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//!
//! init_logging(LoggingConfig::default().with_format(LogFormat::Compact))
//!     .expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

use crate::error::{Error, Result};
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    Compact,
    /// Structured JSON format for machine parsing
    Json,
}

impl Default for LogFormat {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        return Self::Pretty;

        #[cfg(not(debug_assertions))]
        return Self::Json;
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// Filter directives (`RUST_LOG` syntax). Falls back to the `RUST_LOG`
    /// environment variable, then to `info`.
    pub filter: Option<String>,
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

/// Initialize the global tracing subscriber.
///
/// # Errors
///
/// Returns [`Error::Config`] if a global subscriber is already installed or
/// the filter directives fail to parse.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = match &config.filter {
        Some(directives) => EnvFilter::try_new(directives)
            .map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
    };

    result.map_err(|e| Error::Config(format!("Failed to install subscriber: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_builder() {
        let config = LoggingConfig::default()
            .with_format(LogFormat::Json)
            .with_filter("core_download=debug,info");

        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.filter.as_deref(), Some("core_download=debug,info"));
    }

    #[test]
    fn test_invalid_filter_rejected() {
        let result = init_logging(LoggingConfig::default().with_filter("core_download=notalevel"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_init_twice_fails() {
        // First init may race with other tests installing a subscriber; the
        // second call must fail either way.
        let _ = init_logging(LoggingConfig::default().with_format(LogFormat::Compact));
        let second = init_logging(LoggingConfig::default());
        assert!(second.is_err());
    }
}
