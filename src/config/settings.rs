//! Settings pipeline and process-wide accessor
//!
//! `load_settings` runs the full pipeline and returns an owned `Settings`
//! for callers that pass configuration explicitly. `init_settings` runs it
//! once per process and hands out the cached `&'static Settings` afterwards.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use serde_yaml::Value;
use tracing::info;

use super::constants::{config_dir, DEFAULT_CONFIG_FILE, RULES_DIR, STRATEGIES_DIR};
use super::loader::{load_rules_configs, load_strategy_configs, load_yaml};
use super::overrides::{build_env_overrides, build_overrides_with};
use super::records::{RiskPolicy, StrategyConfig};
use super::tree::{kind_of, merge, RawConfig};
use super::types::{
    AppConfig, CacheConfig, DataConfig, Environment, ProviderConfig, Settings, TradingConfig,
};
use crate::error::{ConfigError, Result};

/// Top-level keys accepted in the merged tree
const TOP_LEVEL_KEYS: [&str; 5] = ["app", "data", "trading", "strategies", "rules"];

static SETTINGS: OnceCell<Settings> = OnceCell::new();

/// Return the process-wide settings, loading them on first call
///
/// The config root comes from `CONFIG_DIR` (default `configs`). Once
/// initialized, later calls return the cached value whatever `env` is.
pub fn init_settings(env: Environment) -> Result<&'static Settings> {
    init_settings_in(&config_dir(), env)
}

/// Like `init_settings`, with an explicit config root
///
/// Concurrent first callers block until a single initialization finishes.
/// A failed initialization caches nothing.
pub fn init_settings_in(config_root: &Path, env: Environment) -> Result<&'static Settings> {
    SETTINGS.get_or_try_init(|| {
        dotenvy::dotenv().ok();
        load_settings(config_root, env)
    })
}

/// Cached settings, if `init_settings` has succeeded
pub fn settings() -> Option<&'static Settings> {
    SETTINGS.get()
}

/// Run the full pipeline against the process environment, without caching
pub fn load_settings(config_root: &Path, env: Environment) -> Result<Settings> {
    let base = load_merged_yaml(config_root, env)?;
    let overrides = build_env_overrides(&base)?;
    finish(config_root, env, merge(&base, &overrides))
}

/// Run the full pipeline with `lookup` standing in for the process environment
pub fn load_settings_with_env<F>(
    config_root: &Path,
    env: Environment,
    lookup: F,
) -> Result<Settings>
where
    F: Fn(&str) -> Option<String>,
{
    let base = load_merged_yaml(config_root, env)?;
    let overrides = build_overrides_with(&base, lookup)?;
    finish(config_root, env, merge(&base, &overrides))
}

fn load_merged_yaml(config_root: &Path, env: Environment) -> Result<RawConfig> {
    info!(config_root = %config_root.display(), environment = %env, "Loading configuration");

    let default_config = load_yaml(&config_root.join(DEFAULT_CONFIG_FILE))?;
    let env_config = load_yaml(&config_root.join(env.file_name()))?;
    Ok(merge(&default_config, &env_config))
}

fn finish(config_root: &Path, env: Environment, tree: RawConfig) -> Result<Settings> {
    let strategies = load_strategy_configs(&config_root.join(STRATEGIES_DIR))?;
    let rules = load_rules_configs(&config_root.join(RULES_DIR))?;

    let settings = Settings::from_tree(tree, strategies, rules)?;
    info!(
        environment = %env,
        providers = settings.data.providers.len(),
        strategies = settings.strategies.len(),
        rules = settings.rules.len(),
        "Configuration loaded"
    );
    Ok(settings)
}

impl Settings {
    /// Validate a fully merged tree into `Settings`
    ///
    /// Reports the first violation: an unrecognized top-level key, a missing
    /// or mistyped section, an enumeration or a range. `strategies` and
    /// `rules` keys in the tree are replaced by the loaded maps.
    pub fn from_tree(
        tree: RawConfig,
        strategies: HashMap<String, StrategyConfig>,
        rules: HashMap<String, RiskPolicy>,
    ) -> Result<Self> {
        for key in tree.keys() {
            match key.as_str() {
                Some(k) if TOP_LEVEL_KEYS.contains(&k) => {}
                _ => {
                    return Err(ConfigError::Validation(format!(
                        "unrecognized top-level key {} (allowed: {})",
                        describe_key(key),
                        TOP_LEVEL_KEYS.join(", ")
                    )))
                }
            }
        }

        let app: AppConfig = typed(required(&tree, "app")?, "app")?;
        let data = data_section(required(&tree, "data")?)?;
        let trading: TradingConfig = typed(required(&tree, "trading")?, "trading")?;

        let settings = Settings {
            app,
            data,
            trading,
            strategies,
            rules,
        };
        settings.validate()?;
        Ok(settings)
    }
}

/// Providers are deserialized one by one so errors carry their index
fn data_section(value: &Value) -> Result<DataConfig> {
    let providers = match value.get("providers") {
        None => {
            return Err(ConfigError::Validation(
                "data.providers: missing required field".to_string(),
            ))
        }
        Some(Value::Sequence(entries)) => entries
            .iter()
            .enumerate()
            .map(|(i, entry)| typed::<ProviderConfig>(entry, &format!("data.providers[{}]", i)))
            .collect::<Result<Vec<_>>>()?,
        Some(other) => {
            return Err(ConfigError::Validation(format!(
                "data.providers: expected a list, found a {}",
                kind_of(other)
            )))
        }
    };

    let cache = match value.get("cache") {
        None | Some(Value::Null) => CacheConfig::default(),
        Some(cache) => typed(cache, "data.cache")?,
    };

    Ok(DataConfig { providers, cache })
}

fn required<'a>(tree: &'a RawConfig, section: &str) -> Result<&'a Value> {
    match tree.get(section) {
        Some(value @ Value::Mapping(_)) => Ok(value),
        Some(other) => Err(ConfigError::Validation(format!(
            "{}: expected a mapping, found a {}",
            section,
            kind_of(other)
        ))),
        None => Err(ConfigError::Validation(format!(
            "missing required section '{}'",
            section
        ))),
    }
}

fn typed<T: DeserializeOwned>(value: &Value, path: &str) -> Result<T> {
    serde_yaml::from_value(value.clone())
        .map_err(|e| ConfigError::Validation(format!("{}: {}", path, e)))
}

fn describe_key(key: &Value) -> String {
    match key.as_str() {
        Some(k) => format!("'{}'", k),
        None => format!("of type {}", kind_of(key)),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::load_yaml_str;
    use crate::config::types::{LogLevel, Market, ProviderName};
    use std::fs;
    use tempfile::tempdir;

    const VALID_TREE_YAML: &str = r#"
app:
  name: traderai
  log_level: DEBUG
data:
  providers:
    - name: alpaca
      endpoint: https://paper-api.alpaca.markets
    - name: csv
      endpoint: file:///data/bars
  cache:
    redis_url: redis://localhost:6379/2
trading:
  markets: [stocks, crypto]
  max_position_size: 0.1
  risk:
    max_drawdown: 0.2
    var_limit: 0.05
    max_latency_ms: 500
"#;

    fn from_yaml(yaml: &str) -> Result<Settings> {
        Settings::from_tree(load_yaml_str(yaml).unwrap(), HashMap::new(), HashMap::new())
    }

    fn no_vars(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_valid_tree() {
        let settings = from_yaml(VALID_TREE_YAML).unwrap();
        assert_eq!(settings.app.log_level, LogLevel::Debug);
        assert_eq!(settings.data.providers.len(), 2);
        assert_eq!(settings.data.providers[1].name, ProviderName::Csv);
        assert_eq!(settings.data.cache.redis_url, "redis://localhost:6379/2");
        assert_eq!(settings.trading.markets, vec![Market::Stocks, Market::Crypto]);
        assert_eq!(settings.trading.risk.max_latency_ms, Some(500));
    }

    #[test]
    fn test_unknown_top_level_key_rejected() {
        let yaml = format!("{}foo: bar\n", VALID_TREE_YAML);
        let err = from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("unrecognized top-level key 'foo'"));
    }

    #[test]
    fn test_unknown_provider_rejected_with_index() {
        let yaml = VALID_TREE_YAML.replace("name: csv", "name: ftx");
        let err = from_yaml(&yaml).unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(msg.contains("data.providers[1]"), "Got: {}", msg);
        assert!(msg.contains("ftx"), "Got: {}", msg);
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let yaml = VALID_TREE_YAML.replace("log_level: DEBUG", "log_level: VERBOSE");
        let msg = from_yaml(&yaml).unwrap_err().to_string();
        assert!(msg.contains("app:"), "Got: {}", msg);
        assert!(msg.contains("VERBOSE"), "Got: {}", msg);
    }

    #[test]
    fn test_unknown_market_rejected() {
        let yaml = VALID_TREE_YAML.replace("[stocks, crypto]", "[stocks, bonds]");
        let msg = from_yaml(&yaml).unwrap_err().to_string();
        assert!(msg.contains("trading:"), "Got: {}", msg);
        assert!(msg.contains("bonds"), "Got: {}", msg);
    }

    #[test]
    fn test_drawdown_range() {
        let too_high = VALID_TREE_YAML.replace("max_drawdown: 0.2", "max_drawdown: 1.5");
        let msg = from_yaml(&too_high).unwrap_err().to_string();
        assert!(msg.contains("trading.risk.max_drawdown"), "Got: {}", msg);

        let zero = VALID_TREE_YAML.replace("max_drawdown: 0.2", "max_drawdown: 0");
        assert!(from_yaml(&zero).is_err());

        let one = VALID_TREE_YAML.replace("max_drawdown: 0.2", "max_drawdown: 1.0");
        assert_eq!(from_yaml(&one).unwrap().trading.risk.max_drawdown, 1.0);
    }

    #[test]
    fn test_missing_section_rejected() {
        let err = from_yaml("app:\n  name: x\n").unwrap_err();
        assert!(err.to_string().contains("missing required section 'data'"));
    }

    #[test]
    fn test_scalar_section_rejected() {
        let yaml = VALID_TREE_YAML.replace(
            "app:\n  name: traderai\n  log_level: DEBUG\n",
            "app: traderai\n",
        );
        let err = from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("app: expected a mapping, found a string"));
    }

    #[test]
    fn test_tree_strategies_are_replaced_by_loaded_maps() {
        let yaml = format!("{}strategies:\n  inline:\n    enabled: true\n", VALID_TREE_YAML);
        let settings = from_yaml(&yaml).unwrap();
        assert!(settings.strategies.is_empty());
    }

    #[test]
    fn test_pipeline_with_empty_config_root_uses_defaults() {
        let dir = tempdir().unwrap();
        let settings =
            load_settings_with_env(dir.path(), Environment::Development, no_vars).unwrap();

        assert_eq!(settings.app.name, "traderai");
        assert_eq!(settings.app.log_level, LogLevel::Info);
        assert!(settings.data.providers.is_empty());
        assert_eq!(settings.data.cache.redis_url, "redis://localhost:6379/0");
        assert!(settings.trading.markets.is_empty());
        assert_eq!(settings.trading.max_position_size, 0.1);
        assert_eq!(settings.trading.risk.max_latency_ms, Some(1000));
    }

    #[test]
    fn test_pipeline_layers_env_file_and_variables() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("default.yaml"), VALID_TREE_YAML).unwrap();
        fs::write(
            dir.path().join("production.yaml"),
            concat!(
                "app:\n  log_level: WARNING\n",
                "trading:\n  markets: [forex]\n  risk:\n    var_limit: 0.02\n",
            ),
        )
        .unwrap();

        let lookup = |key: &str| match key {
            "MAX_DRAWDOWN" => Some("0.1".to_string()),
            "ALPACA_API_KEY" => Some("alpaca-key".to_string()),
            _ => None,
        };
        let settings = load_settings_with_env(dir.path(), Environment::Production, lookup).unwrap();

        assert_eq!(settings.app.name, "traderai");
        assert_eq!(settings.app.log_level, LogLevel::Warning);
        assert_eq!(settings.trading.markets, vec![Market::Forex]);
        assert_eq!(settings.trading.risk.var_limit, 0.02);
        assert_eq!(settings.trading.risk.max_drawdown, 0.1);
        assert_eq!(settings.trading.risk.max_latency_ms, Some(500));
        assert_eq!(settings.data.providers[0].api_key.as_deref(), Some("alpaca-key"));
        assert_eq!(settings.data.providers[1].api_key, None);
    }

    #[test]
    fn test_pipeline_surfaces_type_errors() {
        let dir = tempdir().unwrap();
        let lookup = |key: &str| (key == "VAR_LIMIT").then(|| "high".to_string());
        let err = load_settings_with_env(dir.path(), Environment::Staging, lookup).unwrap_err();
        assert!(matches!(err, ConfigError::Type { .. }));
    }

    #[test]
    fn test_pipeline_surfaces_env_file_parse_errors() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("staging.yaml"), "trading: [unclosed\n").unwrap();
        let err = load_settings_with_env(dir.path(), Environment::Staging, no_vars).unwrap_err();
        assert!(err.to_string().contains("staging.yaml"));
    }
}
