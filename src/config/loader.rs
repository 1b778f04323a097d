//! Configuration loader for YAML files
//!
//! This module reads YAML documents into raw trees and loads the per-file
//! strategy and rule records.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::{debug, info};

use super::records::{Record, RiskPolicy, StrategyConfig};
use super::tree::{kind_of, RawConfig};
use crate::error::{ConfigError, Result};

/// Load a YAML file into a raw configuration tree
///
/// - Missing file: empty tree, so per-environment files stay optional
/// - Empty document: empty tree
/// - Malformed YAML or a non-mapping root: `ConfigError::Parse`
///
/// # Example
/// ```ignore
/// use std::path::Path;
/// use traderai::config::load_yaml;
///
/// let tree = load_yaml(Path::new("configs/default.yaml"))?;
/// ```
pub fn load_yaml(path: &Path) -> Result<RawConfig> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "Config file not found, using empty tree");
            return Ok(RawConfig::new());
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    parse_tree(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a raw configuration tree from a YAML string (useful for testing)
pub fn load_yaml_str(yaml_content: &str) -> Result<RawConfig> {
    parse_tree(yaml_content).map_err(|source| ConfigError::Parse {
        path: PathBuf::from("<string>"),
        source,
    })
}

fn parse_tree(content: &str) -> std::result::Result<RawConfig, serde_yaml::Error> {
    match serde_yaml::from_str::<Value>(content)? {
        Value::Null => Ok(RawConfig::new()),
        Value::Mapping(mapping) => Ok(mapping),
        other => Err(serde::de::Error::custom(format!(
            "expected a mapping at the document root, found a {}",
            kind_of(&other)
        ))),
    }
}

/// Load every `strategies/*.yaml` file into a map keyed by file stem
pub fn load_strategy_configs(strategy_dir: &Path) -> Result<HashMap<String, StrategyConfig>> {
    load_records(strategy_dir)
}

/// Load every `rules/*.yaml` file into a map keyed by file stem
pub fn load_rules_configs(rules_dir: &Path) -> Result<HashMap<String, RiskPolicy>> {
    load_records(rules_dir)
}

fn load_records<T: Record>(dir: &Path) -> Result<HashMap<String, T>> {
    let mut records = HashMap::new();

    for path in yaml_files(dir)? {
        let Some(name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };

        let mut document = load_yaml(&path)?;
        let section = document.remove(T::SECTION).ok_or_else(|| {
            ConfigError::Validation(format!(
                "{}: missing required top-level '{}' section",
                path.display(),
                T::SECTION
            ))
        })?;

        let record: T = serde_yaml::from_value(section).map_err(|e| {
            ConfigError::Validation(format!(
                "{}: invalid '{}' section: {}",
                path.display(),
                T::SECTION,
                e
            ))
        })?;

        record.validate().map_err(|e| {
            ConfigError::Validation(format!("{}: {}", path.display(), describe(e)))
        })?;

        debug!(name = %name, path = %path.display(), "Loaded {} record", T::SECTION);
        records.insert(name, record);
    }

    if !records.is_empty() {
        info!(count = records.len(), dir = %dir.display(), "Loaded {} records", T::SECTION);
    }

    Ok(records)
}

/// Non-recursive `*.yaml` / `*.yml` listing in sorted order; missing dir is empty
fn yaml_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "Directory not found, nothing to load");
        return Ok(Vec::new());
    }

    let io_err = |source| ConfigError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml && path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    Ok(files)
}

/// Strip the validation prefix so nested messages read once
fn describe(err: ConfigError) -> String {
    match err {
        ConfigError::Validation(msg) => msg,
        other => other.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
