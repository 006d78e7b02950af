//! Configuration for the standalone server binary.

use std::env;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen address
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Path of the JSON schema file declaring the served kinds
    pub schema_file: String,
    /// SQL DSN for the backing store; in-memory when unset
    pub database_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let schema_file = env::var("SCHEMA_FILE").map_err(|_| ConfigError::MissingSchemaFile)?;

        let database_url = env::var("DATABASE_URL").ok();

        Ok(Self {
            host,
            port,
            schema_file,
            database_url,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("SCHEMA_FILE environment variable is required")]
    MissingSchemaFile,

    #[error("Invalid PORT value")]
    InvalidPort,
}
