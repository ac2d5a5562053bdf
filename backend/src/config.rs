//! Configuration management for the Bengkel Sparepart backend
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with BENGKEL_ prefix

use chrono::FixedOffset;
use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// Local calendar used for reports and rendered timestamps
    pub locale: LocaleConfig,

    /// Part image storage
    pub media: MediaConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWT tokens
    pub secret: String,

    /// Access token expiration in seconds
    pub access_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LocaleConfig {
    /// Fixed offset from UTC in hours (7 for WIB)
    pub utc_offset_hours: i32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MediaConfig {
    /// Directory where uploaded part images are written
    pub directory: String,

    /// Largest accepted upload in bytes
    pub max_image_bytes: usize,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("BENGKEL_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("jwt.access_token_expiry", 86400)?
            .set_default("locale.utc_offset_hours", 7)?
            .set_default("media.directory", "media")?
            .set_default("media.max_image_bytes", shared::MAX_IMAGE_BYTES as i64)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (BENGKEL_ prefix)
            .add_source(
                Environment::with_prefix("BENGKEL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.utc_offset()?;
        Ok(config)
    }

    /// The configured local offset
    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        let hours = self.locale.utc_offset_hours;
        if !(-12..=14).contains(&hours) {
            return Err(ConfigError::Message(format!(
                "locale.utc_offset_hours out of range: {}",
                hours
            )));
        }
        FixedOffset::east_opt(hours * 3600)
            .ok_or_else(|| ConfigError::Message("invalid utc offset".to_string()))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}
