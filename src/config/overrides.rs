//! Environment variable overrides
//!
//! Builds an override tree from process environment variables. Each
//! recognized variable falls back to the value already in the merged base
//! tree, then to a literal default. The result is merged onto the base, so
//! environment variables win over every YAML layer.

use serde_yaml::{Mapping, Value};
use tracing::debug;

use super::constants::{
    DEFAULT_MAX_DRAWDOWN, DEFAULT_MAX_LATENCY_MS, DEFAULT_MAX_POSITION_SIZE, DEFAULT_VAR_LIMIT,
    ENV_APP_NAME, ENV_LOG_LEVEL, ENV_MARKETS, ENV_MAX_DRAWDOWN, ENV_MAX_LATENCY_MS,
    ENV_MAX_POSITION_SIZE, ENV_REDIS_URL, ENV_VAR_LIMIT,
};
use super::tree::{kind_of, lookup, RawConfig};
use crate::error::{ConfigError, Result};

/// Build the override tree from the process environment
pub fn build_env_overrides(base: &RawConfig) -> Result<RawConfig> {
    build_overrides_with(base, |key| std::env::var(key).ok())
}

/// Build the override tree using `env` to resolve variables
///
/// `env` returns `None` for unset variables. Keys with neither an
/// environment value nor a base value are left out so serde defaults apply.
/// A section whose base value is not a mapping gets no override at all, so
/// validation still sees (and rejects) the malformed value.
pub fn build_overrides_with<F>(base: &RawConfig, env: F) -> Result<RawConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut overrides = Mapping::new();

    if accepts_overrides(base, &["app"]) {
        overrides.insert("app".into(), Value::Mapping(app_overrides(base, &env)));
    }
    if accepts_overrides(base, &["data"]) {
        overrides.insert("data".into(), Value::Mapping(data_overrides(base, &env)));
    }
    if accepts_overrides(base, &["trading"]) {
        overrides.insert("trading".into(), Value::Mapping(trading_overrides(base, &env)?));
    }

    Ok(overrides)
}

/// Absent, `null` or a mapping; anything else is left for validation
fn accepts_overrides(base: &RawConfig, path: &[&str]) -> bool {
    matches!(
        lookup(base, path),
        None | Some(Value::Null) | Some(Value::Mapping(_))
    )
}

fn app_overrides<F>(base: &RawConfig, env: &F) -> Mapping
where
    F: Fn(&str) -> Option<String>,
{
    let mut app = Mapping::new();
    insert_some(&mut app, "name", resolve(env, ENV_APP_NAME, base, &["app", "name"]));
    insert_some(
        &mut app,
        "log_level",
        resolve(env, ENV_LOG_LEVEL, base, &["app", "log_level"]),
    );
    app
}

fn data_overrides<F>(base: &RawConfig, env: &F) -> Mapping
where
    F: Fn(&str) -> Option<String>,
{
    let mut data = Mapping::new();
    match lookup(base, &["data", "providers"]) {
        None | Some(Value::Null) => {
            data.insert("providers".into(), Value::Sequence(Vec::new()));
        }
        Some(Value::Sequence(providers)) => {
            let providers = providers.iter().map(|p| provider_overrides(p, env)).collect();
            data.insert("providers".into(), Value::Sequence(providers));
        }
        // Left for validation to reject
        Some(_) => {}
    }

    if accepts_overrides(base, &["data", "cache"]) {
        let mut cache = Mapping::new();
        insert_some(
            &mut cache,
            "redis_url",
            resolve(env, ENV_REDIS_URL, base, &["data", "cache", "redis_url"]),
        );
        data.insert("cache".into(), Value::Mapping(cache));
    }

    data
}

fn trading_overrides<F>(base: &RawConfig, env: &F) -> Result<Mapping>
where
    F: Fn(&str) -> Option<String>,
{
    let markets = match env(ENV_MARKETS) {
        Some(raw) => split_markets(&raw),
        None => match lookup(base, &["trading", "markets"]) {
            None | Some(Value::Null) => Value::Sequence(Vec::new()),
            Some(Value::String(raw)) => split_markets(raw),
            Some(other) => other.clone(),
        },
    };

    let mut trading = Mapping::new();
    trading.insert("markets".into(), markets);
    trading.insert(
        "max_position_size".into(),
        resolve_f64(
            env,
            ENV_MAX_POSITION_SIZE,
            base,
            &["trading", "max_position_size"],
            DEFAULT_MAX_POSITION_SIZE,
        )?,
    );

    if accepts_overrides(base, &["trading", "risk"]) {
        let mut risk = Mapping::new();
        risk.insert(
            "max_drawdown".into(),
            resolve_f64(
                env,
                ENV_MAX_DRAWDOWN,
                base,
                &["trading", "risk", "max_drawdown"],
                DEFAULT_MAX_DRAWDOWN,
            )?,
        );
        risk.insert(
            "var_limit".into(),
            resolve_f64(
                env,
                ENV_VAR_LIMIT,
                base,
                &["trading", "risk", "var_limit"],
                DEFAULT_VAR_LIMIT,
            )?,
        );
        risk.insert(
            "max_latency_ms".into(),
            resolve_u64(
                env,
                ENV_MAX_LATENCY_MS,
                base,
                &["trading", "risk", "max_latency_ms"],
                DEFAULT_MAX_LATENCY_MS,
            )?,
        );
        trading.insert("risk".into(), Value::Mapping(risk));
    }

    Ok(trading)
}

/// Environment value if set, else the current base value
fn resolve<F>(env: &F, var: &str, base: &RawConfig, path: &[&str]) -> Option<Value>
where
    F: Fn(&str) -> Option<String>,
{
    match env(var) {
        Some(value) => {
            debug!(var, "Applying environment override");
            Some(Value::from(value))
        }
        None => lookup(base, path).cloned(),
    }
}

/// Apply `{NAME}_API_KEY` / `{NAME}_SECRET_KEY` to one provider entry
fn provider_overrides<F>(provider: &Value, env: &F) -> Value
where
    F: Fn(&str) -> Option<String>,
{
    let Value::Mapping(entry) = provider else {
        return provider.clone();
    };
    let Some(name) = entry.get("name").and_then(Value::as_str) else {
        return provider.clone();
    };

    let prefix = name.to_uppercase();
    let mut entry = entry.clone();
    for (suffix, field) in [("API_KEY", "api_key"), ("SECRET_KEY", "secret_key")] {
        if let Some(secret) = env(&format!("{}_{}", prefix, suffix)) {
            debug!(provider = name, field, "Applying credential from environment");
            entry.insert(field.into(), Value::from(secret));
        }
    }
    Value::Mapping(entry)
}

/// Comma-separated market list; segments are trimmed and blanks dropped
fn split_markets(raw: &str) -> Value {
    Value::Sequence(
        raw.split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(Value::from)
            .collect(),
    )
}

fn resolve_f64<F>(
    env: &F,
    var: &str,
    base: &RawConfig,
    path: &[&str],
    default: f64,
) -> Result<Value>
where
    F: Fn(&str) -> Option<String>,
{
    let expected = "floating point number";
    if let Some(raw) = env(var) {
        return parse_number::<f64>(var, &raw, expected).map(Value::from);
    }

    let field = path.join(".");
    match lookup(base, path) {
        None | Some(Value::Null) => Ok(Value::from(default)),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Value::from)
            .ok_or_else(|| type_error(&field, n.to_string(), expected)),
        Some(Value::String(raw)) => parse_number::<f64>(&field, raw, expected).map(Value::from),
        Some(other) => Err(type_error(&field, kind_of(other).to_string(), expected)),
    }
}

/// Like `resolve_f64`, but an explicit `null` in the base stays `null`
///
/// Whole-valued floats in YAML (`1000.0`) are accepted; environment values
/// must be plain integers.
fn resolve_u64<F>(
    env: &F,
    var: &str,
    base: &RawConfig,
    path: &[&str],
    default: u64,
) -> Result<Value>
where
    F: Fn(&str) -> Option<String>,
{
    let expected = "non-negative integer";
    if let Some(raw) = env(var) {
        return parse_number::<u64>(var, &raw, expected).map(Value::from);
    }

    let field = path.join(".");
    match lookup(base, path) {
        None => Ok(Value::from(default)),
        Some(Value::Null) => Ok(Value::Null),
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().and_then(whole_u64))
            .map(Value::from)
            .ok_or_else(|| type_error(&field, n.to_string(), expected)),
        Some(Value::String(raw)) => parse_number::<u64>(&field, raw, expected).map(Value::from),
        Some(other) => Err(type_error(&field, kind_of(other).to_string(), expected)),
    }
}

fn whole_u64(value: f64) -> Option<u64> {
    let in_range = value.is_finite() && value >= 0.0 && value <= u64::MAX as f64;
    (in_range && value.fract() == 0.0).then(|| value as u64)
}

fn parse_number<T>(key: &str, raw: &str, expected: &'static str) -> Result<T>
where
    T: std::str::FromStr,
{
    raw.trim()
        .parse::<T>()
        .map_err(|_| type_error(key, raw.to_string(), expected))
}

fn type_error(key: &str, value: String, expected: &'static str) -> ConfigError {
    ConfigError::Type {
        key: key.to_string(),
        value,
        expected,
    }
}

fn insert_some(map: &mut Mapping, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        map.insert(key.into(), value);
    }
}

// ============================================================================
// Tests
// ============================================================================
