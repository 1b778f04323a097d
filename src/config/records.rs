//! Per-file strategy and risk policy records
//!
//! Each YAML file under `strategies/` or `rules/` holds one record in a
//! required top-level section (`strategy:` or `risk:`).

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::types::{check_fraction, Market};
use crate::error::ConfigError;

/// A record loaded from its own YAML file
pub trait Record: DeserializeOwned {
    /// Required top-level section holding the record
    const SECTION: &'static str;

    fn validate(&self) -> Result<(), ConfigError>;
}

/// Strategy definition from `strategies/<name>.yaml`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategyConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub markets: Vec<Market>,
    #[serde(default)]
    pub symbols: Vec<String>,
    /// Bar interval, e.g. "1m" or "1d"
    #[serde(default)]
    pub timeframe: Option<String>,
    /// Strategy-specific tuning values, passed through untouched
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_yaml::Value>,
}

impl Record for StrategyConfig {
    const SECTION: &'static str = "strategy";

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "strategy name cannot be empty".to_string(),
                ));
            }
        }

        if self.symbols.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "strategy symbols cannot contain empty entries".to_string(),
            ));
        }

        Ok(())
    }
}

/// Risk policy from `rules/<name>.yaml`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskPolicy {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub max_position_size: Option<f64>,
    #[serde(default)]
    pub stop_loss_pct: Option<f64>,
    #[serde(default)]
    pub take_profit_pct: Option<f64>,
    #[serde(default)]
    pub max_daily_loss: Option<f64>,
    #[serde(default)]
    pub max_open_positions: Option<u32>,
}

impl Record for RiskPolicy {
    const SECTION: &'static str = "risk";

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "risk policy name cannot be empty".to_string(),
                ));
            }
        }

        let fractions = [
            ("max_position_size", self.max_position_size),
            ("stop_loss_pct", self.stop_loss_pct),
            ("take_profit_pct", self.take_profit_pct),
            ("max_daily_loss", self.max_daily_loss),
        ];
        for (field, value) in fractions {
            if let Some(value) = value {
                check_fraction(field, value)?;
            }
        }

        if self.max_open_positions == Some(0) {
            return Err(ConfigError::Validation(
                "max_open_positions must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn default_enabled() -> bool {
    true
}
