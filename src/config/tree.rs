//! Raw configuration tree and recursive merge
//!
//! YAML documents are kept as untyped `serde_yaml` mappings until every
//! layer has been merged. Only then is the tree validated into `Settings`.

use serde_yaml::{Mapping, Value};

/// Untyped nested configuration, as read from YAML
pub type RawConfig = Mapping;

/// Merge `overrides` onto `base`, returning a new tree
///
/// For every key in `overrides`:
/// - both values are mappings: merge recursively, base siblings survive
/// - anything else: the override value replaces the base value entirely
///
/// Sequences are never combined element-wise. `base` is left untouched and
/// its key order is kept; override-only keys are appended.
pub fn merge(base: &RawConfig, overrides: &RawConfig) -> RawConfig {
    let mut merged = base.clone();

    for (key, value) in overrides {
        let combined = match (merged.get(key), value) {
            (Some(Value::Mapping(existing)), Value::Mapping(incoming)) => {
                Value::Mapping(merge(existing, incoming))
            }
            _ => value.clone(),
        };
        merged.insert(key.clone(), combined);
    }

    merged
}

/// Look up a nested value by key path (e.g. `["trading", "risk", "var_limit"]`)
pub fn lookup<'a>(tree: &'a RawConfig, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut current = tree.get(*first)?;
    for key in rest {
        current = current.as_mapping()?.get(*key)?;
    }
    Some(current)
}

/// Human-readable name of a YAML value's kind, for error messages
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
