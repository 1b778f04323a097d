//! TraderAI configuration
//!
//! Loads layered YAML configuration and environment overrides into a
//! validated, immutable `Settings` value:
//! - `default.yaml` merged with `{environment}.yaml`
//! - environment variables applied on top
//! - per-file strategies and risk rules
//! - schema validation before anything downstream sees the result

pub mod config;
pub mod error;

pub use config::{init_settings, load_settings, Environment, Settings};
pub use error::ConfigError;
