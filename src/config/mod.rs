/// Database connection, table creation and schema verification
pub mod database;

/// Application settings loaded from a TOML file and the environment
pub mod settings;

pub use settings::{AppConfig, QuantityPolicy, load_app_config};
