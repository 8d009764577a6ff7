//! Application settings loaded from `food-share.toml`.
//!
//! The settings file is optional; a missing file yields defaults. `DATABASE_URL` from the
//! environment (or a `.env` file loaded by the binary) takes precedence over the file.

use super::database::{DEFAULT_DATABASE_URL, get_database_url};
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Settings file read when `FOOD_SHARE_CONFIG` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "food-share.toml";

/// How completing a claim interacts with the claimed listing's quantity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityPolicy {
    /// Claims never change listing quantities.
    #[default]
    Untracked,
    /// Completing a claim drains its listing to zero; empty listings cannot be claimed.
    ConsumeOnCompletion,
}

/// Parsed application settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Connection URL for the storage collaborator
    pub database_url: String,
    /// Quantity reconciliation applied on claim completion
    pub quantity_policy: QuantityPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            quantity_policy: QuantityPolicy::default(),
        }
    }
}

/// Parses settings from a TOML file.
///
/// # Errors
/// Returns `Error::Config` if the file cannot be read or is not valid TOML.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Loading configuration from {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })
}

/// Loads settings from `FOOD_SHARE_CONFIG` or [`DEFAULT_CONFIG_PATH`], then applies
/// the `DATABASE_URL` override.
///
/// A missing default file is not an error; an explicitly named file must exist.
pub fn load_app_config() -> Result<AppConfig> {
    let mut config = match std::env::var("FOOD_SHARE_CONFIG") {
        Ok(path) => load_config(path)?,
        Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => load_config(DEFAULT_CONFIG_PATH)?,
        Err(_) => {
            info!("No {DEFAULT_CONFIG_PATH} found, using default settings");
            AppConfig::default()
        }
    };

    config.database_url = get_database_url(&config.database_url);
    Ok(config)
}
