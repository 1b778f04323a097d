//! Logging configuration
//!
//! # Usage
//! ```rust,ignore
//! use traderai::config::logging::init_logging;
//! init_logging();
//! ```
//!
//! # Environment Variables
//! - `LOG_FORMAT`: Output format - `json` (default) or `pretty`
//! - `RUST_LOG`: Log level filter, takes precedence
//! - `LOG_LEVEL`: Application log level (`DEBUG` ... `CRITICAL`), used when `RUST_LOG` is unset

use tracing_subscriber::EnvFilter;

use super::constants::ENV_LOG_LEVEL;
use super::types::LogLevel;

/// Initialize logging with configurable format
///
/// Reads `LOG_FORMAT` from environment:
/// - `json` (default): Machine-parseable JSON output for production
/// - `pretty`: Human-readable output for development
pub fn init_logging() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive()));

    if log_format == "pretty" {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .pretty()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .init();
    }
}

/// Filter directive derived from `LOG_LEVEL`, `info` if unset or unknown
fn default_directive() -> &'static str {
    std::env::var(ENV_LOG_LEVEL)
        .ok()
        .and_then(|level| level.parse::<LogLevel>().ok())
        .map(|level| level.as_filter_directive())
        .unwrap_or("info")
}
