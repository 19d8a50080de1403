//! Application configuration schemas.
//!
//! All configuration structs are deserialized from an optional TOML file
//! plus `APIX_`-prefixed environment variables via the `config` crate.
//! Every section has serde defaults, so an empty source yields a usable
//! configuration.

pub mod database;
pub mod logging;
pub mod models;
pub mod pagination;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::models::ModelsConfig;
pub use self::pagination::PaginationConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default listing behaviour.
    #[serde(default)]
    pub pagination: PaginationConfig,
    /// Model resolution settings.
    #[serde(default)]
    pub models: ModelsConfig,
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file and the environment.
    ///
    /// The file is optional. Environment variables prefixed with `APIX_`
    /// override it, using `__` as the section separator
    /// (`APIX_PAGINATION__PER_PAGE=50`).
    pub fn load(path: &str) -> Result<Self, AppError> {
        debug!(path, "Loading configuration");

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("APIX")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Parse configuration from an in-memory TOML document.
    pub fn from_toml(contents: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}
