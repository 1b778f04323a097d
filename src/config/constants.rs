//! Configuration file layout, defaults and environment variable names
//!
//! This module centralizes the hardcoded values the settings pipeline falls
//! back to. The config root and target environment can themselves be
//! overridden via environment variables.

use std::path::PathBuf;

use super::types::{Environment, Settings};
use crate::error::Result;

// =============================================================================
// File Layout
// =============================================================================

/// Base configuration, always attempted
pub const DEFAULT_CONFIG_FILE: &str = "default.yaml";
/// Per-strategy YAML files, each with a `strategy:` section
pub const STRATEGIES_DIR: &str = "strategies";
/// Per-rule YAML files, each with a `risk:` section
pub const RULES_DIR: &str = "rules";

// =============================================================================
// Defaults
// =============================================================================

pub const DEFAULT_APP_NAME: &str = "traderai";
pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379/0";
pub const DEFAULT_MAX_POSITION_SIZE: f64 = 0.1;
pub const DEFAULT_MAX_DRAWDOWN: f64 = 0.2;
pub const DEFAULT_VAR_LIMIT: f64 = 0.05;
pub const DEFAULT_MAX_LATENCY_MS: u64 = 1000;

// =============================================================================
// Environment Variables
// =============================================================================

pub const ENV_APP_NAME: &str = "APP_NAME";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const ENV_REDIS_URL: &str = "REDIS_URL";
pub const ENV_MARKETS: &str = "MARKETS";
pub const ENV_MAX_POSITION_SIZE: &str = "MAX_POSITION_SIZE";
pub const ENV_MAX_DRAWDOWN: &str = "MAX_DRAWDOWN";
pub const ENV_VAR_LIMIT: &str = "VAR_LIMIT";
pub const ENV_MAX_LATENCY_MS: &str = "MAX_LATENCY_MS";

/// Configuration root directory (default: `configs`)
///
/// Environment variable: `CONFIG_DIR`
pub fn config_dir() -> PathBuf {
    std::env::var("CONFIG_DIR")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("configs"))
}

/// Target deployment environment (default: development)
///
/// Environment variable: `APP_ENV`
pub fn app_environment() -> Result<Environment> {
    match std::env::var("APP_ENV") {
        Ok(value) if !value.trim().is_empty() => value.parse(),
        _ => Ok(Environment::default()),
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Print the loaded settings (for startup logs); credentials are never logged
pub fn log_configuration(settings: &Settings) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("App:");
    tracing::info!("  - Name: {}", settings.app.name);
    tracing::info!("  - Log level: {}", settings.app.log_level);

    tracing::info!("Data:");
    for provider in &settings.data.providers {
        tracing::info!(
            "  - Provider {} at {} (api key: {}, secret key: {})",
            provider.name,
            provider.endpoint,
            if provider.api_key.is_some() { "set" } else { "unset" },
            if provider.secret_key.is_some() { "set" } else { "unset" },
        );
    }
    tracing::info!("  - Cache: {}", settings.data.cache.redis_url);

    tracing::info!("Trading:");
    let markets: Vec<String> = settings.trading.markets.iter().map(|m| m.to_string()).collect();
    tracing::info!("  - Markets: {:?}", markets);
    tracing::info!("  - Max position size: {}", settings.trading.max_position_size);
    tracing::info!("  - Max drawdown: {}", settings.trading.risk.max_drawdown);
    tracing::info!("  - VaR limit: {}", settings.trading.risk.var_limit);
    match settings.trading.risk.max_latency_ms {
        Some(ms) => tracing::info!("  - Max latency: {}ms", ms),
        None => tracing::info!("  - Max latency: unbounded"),
    }

    let mut strategies: Vec<&String> = settings.strategies.keys().collect();
    strategies.sort();
    let mut rules: Vec<&String> = settings.rules.keys().collect();
    rules.sort();
    tracing::info!("Strategies: {:?}", strategies);
    tracing::info!("Rules: {:?}", rules);
    tracing::info!("==================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial(env)]
    fn test_config_dir_default() {
        std::env::remove_var("CONFIG_DIR");
        assert_eq!(config_dir(), PathBuf::from("configs"));
    }

    #[test]
    #[serial(env)]
    fn test_config_dir_override() {
        std::env::set_var("CONFIG_DIR", "/etc/traderai");
        assert_eq!(config_dir(), PathBuf::from("/etc/traderai"));
        std::env::remove_var("CONFIG_DIR");
    }

    #[test]
    #[serial(env)]
    fn test_app_environment_from_env() {
        std::env::remove_var("APP_ENV");
        assert_eq!(app_environment().unwrap(), Environment::Development);

        std::env::set_var("APP_ENV", "production");
        assert_eq!(app_environment().unwrap(), Environment::Production);

        std::env::set_var("APP_ENV", "moon");
        assert!(app_environment().is_err());

        std::env::remove_var("APP_ENV");
    }
}
