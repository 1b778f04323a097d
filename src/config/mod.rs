//! Layered configuration loading and validation
//!
//! This module provides:
//! - Raw YAML trees and recursive merge (`merge`)
//! - YAML loading for config files, strategies and rules (`load_yaml`)
//! - Environment variable overrides (`build_env_overrides`)
//! - Typed, validated settings (`Settings`) and the process-wide accessor
//! - Logging configuration (`init_logging`)

pub mod constants;
mod loader;
pub mod logging;
mod overrides;
mod records;
mod settings;
mod tree;
mod types;

// Re-export types
pub use records::{Record, RiskPolicy, StrategyConfig};
pub use types::{
    AppConfig, CacheConfig, DataConfig, Environment, LogLevel, Market, ProviderConfig,
    ProviderName, RiskConfig, Settings, TradingConfig,
};

// Re-export pipeline functions
pub use loader::{load_rules_configs, load_strategy_configs, load_yaml, load_yaml_str};
pub use overrides::{build_env_overrides, build_overrides_with};
pub use settings::{
    init_settings, init_settings_in, load_settings, load_settings_with_env, settings,
};
pub use tree::{lookup, merge, RawConfig};

// Re-export logging functions
pub use logging::init_logging;
