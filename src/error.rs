//! Configuration error types using thiserror
//!
//! Every failure in the settings pipeline surfaces as a `ConfigError`.
//! The only outcomes that are not errors are a missing YAML file (empty tree)
//! and a missing sub-resource directory (empty map).

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// Malformed YAML in a loaded file
    #[error("Error parsing YAML file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// An environment variable (or base value) could not be coerced to its target type
    #[error("Invalid value for {key}: '{value}' is not a valid {expected}")]
    Type {
        key: String,
        value: String,
        expected: &'static str,
    },

    /// A merged value violates a schema constraint
    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using ConfigError
pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_names_file() {
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("key: [unclosed").unwrap_err();
        let err = ConfigError::Parse {
            path: PathBuf::from("configs/default.yaml"),
            source: yaml_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Error parsing YAML file"), "Got: {}", msg);
        assert!(msg.contains("configs/default.yaml"), "Got: {}", msg);
    }

    #[test]
    fn test_type_error_display() {
        let err = ConfigError::Type {
            key: "MAX_DRAWDOWN".into(),
            value: "lots".into(),
            expected: "floating point number",
        };
        assert_eq!(
            err.to_string(),
            "Invalid value for MAX_DRAWDOWN: 'lots' is not a valid floating point number"
        );
    }

    #[test]
    fn test_validation_error_display() {
        let err = ConfigError::Validation("unrecognized top-level key 'foo'".into());
        assert_eq!(
            err.to_string(),
            "Configuration validation error: unrecognized top-level key 'foo'"
        );
    }

    #[test]
    fn test_io_error_keeps_source() {
        let err = ConfigError::Io {
            path: PathBuf::from("configs/rules"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("configs/rules"), "Got: {}", msg);
        assert!(msg.contains("denied"), "Got: {}", msg);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_config_error_is_debug_printable() {
        let err = ConfigError::Validation("test".into());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Validation"), "Got: {}", debug_str);
    }
}
