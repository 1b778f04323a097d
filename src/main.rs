//! TraderAI configuration entry point
//!
//! Loads settings for the selected environment and prints them:
//! 1. Loads `.env` (if it exists)
//! 2. Initializes logging
//! 3. Picks the environment from the first argument or `APP_ENV`
//! 4. Runs the settings pipeline and logs a summary
//! 5. Prints the settings as JSON, credentials redacted

use anyhow::Context;
use tracing::{error, info};
use traderai::config::{self, constants, Environment};

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenvy::dotenv().ok();

    config::init_logging();

    let env: Environment = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => constants::app_environment()?,
    };

    info!(environment = %env, "Loading configuration from {}", constants::config_dir().display());
    let settings = match config::init_settings(env) {
        Ok(settings) => settings,
        Err(e) => {
            error!("[ERROR] Configuration failed: {}", e);
            std::process::exit(1);
        }
    };

    constants::log_configuration(settings);

    let json = serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;
    println!("{}", json);

    Ok(())
}
