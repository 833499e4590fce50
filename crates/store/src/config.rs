//! Store configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MADRONA_DATABASE_URL` - `PostgreSQL` connection string
//!
//! ## Optional
//! - `MADRONA_DB_MAX_CONNECTIONS` - connection pool size (default: 10)
//! - `MADRONA_DB_ACQUIRE_TIMEOUT_SECS` - pool acquire timeout (default: 10)

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Store application configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// Maximum number of pooled database connections
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection before failing
    pub acquire_timeout_secs: u64,
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = std::env::var("MADRONA_DATABASE_URL")
            .map(SecretString::from)
            .map_err(|_| ConfigError::MissingEnvVar("MADRONA_DATABASE_URL".to_string()))?;

        let max_connections = parse_optional_var(
            "MADRONA_DB_MAX_CONNECTIONS",
            std::env::var("MADRONA_DB_MAX_CONNECTIONS").ok().as_deref(),
            DEFAULT_MAX_CONNECTIONS,
        )?;

        let acquire_timeout_secs = parse_optional_var(
            "MADRONA_DB_ACQUIRE_TIMEOUT_SECS",
            std::env::var("MADRONA_DB_ACQUIRE_TIMEOUT_SECS")
                .ok()
                .as_deref(),
            DEFAULT_ACQUIRE_TIMEOUT_SECS,
        )?;

        Ok(Self {
            database_url,
            max_connections,
            acquire_timeout_secs,
        })
    }
}

/// Parse an optional numeric environment variable, falling back to a default.
fn parse_optional_var<T: std::str::FromStr>(
    name: &str,
    value: Option<&str>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidEnvVar(name.to_string(), raw.to_string())),
    }
}
