//! Configuration types for application settings
//!
//! This module defines the typed records the merged YAML tree is validated
//! into. `Settings` is the root; it is built once and never mutated.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use super::constants::{DEFAULT_APP_NAME, DEFAULT_REDIS_URL};
use super::records::{RiskPolicy, StrategyConfig};
use crate::error::ConfigError;

// ============================================================================
// Enums
// ============================================================================

/// Deployment environment, selects `{environment}.yaml`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    /// Name of the environment-specific override file
    pub fn file_name(&self) -> String {
        format!("{}.yaml", self.as_str())
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ConfigError::Validation(format!(
                "unknown environment '{}' (expected development, staging or production)",
                other
            ))),
        }
    }
}

/// Supported market data / brokerage providers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderName {
    Alpaca,
    Binance,
    Oanda,
    Polygon,
    Csv,
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderName::Alpaca => write!(f, "alpaca"),
            ProviderName::Binance => write!(f, "binance"),
            ProviderName::Oanda => write!(f, "oanda"),
            ProviderName::Polygon => write!(f, "polygon"),
            ProviderName::Csv => write!(f, "csv"),
        }
    }
}

/// Tradable market categories
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    Stocks,
    Crypto,
    Forex,
    Commodities,
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Market::Stocks => write!(f, "stocks"),
            Market::Crypto => write!(f, "crypto"),
            Market::Forex => write!(f, "forex"),
            Market::Commodities => write!(f, "commodities"),
        }
    }
}

/// Application log level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Equivalent `tracing` filter directive
    pub fn as_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARNING"),
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "CRITICAL" => Ok(LogLevel::Critical),
            _ => Err(ConfigError::Validation(format!(
                "log level must be one of DEBUG, INFO, WARNING, ERROR, CRITICAL (got '{}')",
                s
            ))),
        }
    }
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Application-level settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            log_level: LogLevel::default(),
        }
    }
}

fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_string()
}

/// A market data or brokerage provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderConfig {
    pub name: ProviderName,
    /// Serialized redacted
    #[serde(default, serialize_with = "redact")]
    pub api_key: Option<String>,
    /// Serialized redacted
    #[serde(default, serialize_with = "redact")]
    pub secret_key: Option<String>,
    pub endpoint: String,
}

fn redact<S: Serializer>(secret: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    match secret {
        Some(_) => serializer.serialize_some("***"),
        None => serializer.serialize_none(),
    }
}

/// Cache backend settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
        }
    }
}

fn default_redis_url() -> String {
    DEFAULT_REDIS_URL.to_string()
}

/// Data sources and caching
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DataConfig {
    pub providers: Vec<ProviderConfig>,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl DataConfig {
    /// Find a configured provider by name
    pub fn provider(&self, name: ProviderName) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }
}

/// Portfolio-level risk limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskConfig {
    /// Maximum drawdown as a fraction of equity, in (0, 1]
    pub max_drawdown: f64,
    /// Value-at-risk limit as a fraction of equity, in (0, 1]
    pub var_limit: f64,
    #[serde(default)]
    pub max_latency_ms: Option<u64>,
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_fraction("trading.risk.max_drawdown", self.max_drawdown)?;
        check_fraction("trading.risk.var_limit", self.var_limit)?;
        Ok(())
    }
}

/// Trading universe and position sizing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradingConfig {
    pub markets: Vec<Market>,
    /// Largest single position as a fraction of equity, in (0, 1]
    pub max_position_size: f64,
    pub risk: RiskConfig,
}

impl TradingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_fraction("trading.max_position_size", self.max_position_size)?;
        self.risk.validate()
    }
}

/// Root application settings
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Settings {
    pub app: AppConfig,
    pub data: DataConfig,
    pub trading: TradingConfig,
    pub strategies: HashMap<String, StrategyConfig>,
    pub rules: HashMap<String, RiskPolicy>,
}

impl Settings {
    /// Validate all cross-field rules not expressed by the types
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.trading.validate()
    }

    /// Strategies with `enabled: true`
    pub fn enabled_strategies(&self) -> impl Iterator<Item = (&String, &StrategyConfig)> {
        self.strategies.iter().filter(|(_, s)| s.enabled)
    }
}

/// Rule: value must be in (0, 1]; NaN is rejected
pub(crate) fn check_fraction(field: &str, value: f64) -> Result<(), ConfigError> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(ConfigError::Validation(format!(
            "{} must be > 0 and <= 1 (got {})",
            field, value
        )));
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
