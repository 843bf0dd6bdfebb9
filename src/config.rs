//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::rates::RetryPolicy;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Base URL of the external currency conversion service
    pub rate_service_url: String,

    /// Total attempt budget for one rate service call
    pub rate_retry_max_attempts: u32,

    /// Wait after an HTTP 429 from the rate service (milliseconds)
    pub rate_retry_short_interval_ms: u64,

    /// Wait after an HTTP >= 500 from the rate service (milliseconds)
    pub rate_retry_long_interval_ms: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let rate_service_url = env::var("RATE_SERVICE_URL")
            .map_err(|_| ConfigError::MissingEnv("RATE_SERVICE_URL"))?;

        let rate_retry_max_attempts = env::var("RATE_RETRY_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "20".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("RATE_RETRY_MAX_ATTEMPTS"))?;

        let rate_retry_short_interval_ms = env::var("RATE_RETRY_SHORT_INTERVAL_MS")
            .unwrap_or_else(|_| "1000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("RATE_RETRY_SHORT_INTERVAL_MS"))?;

        let rate_retry_long_interval_ms = env::var("RATE_RETRY_LONG_INTERVAL_MS")
            .unwrap_or_else(|_| "300000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("RATE_RETRY_LONG_INTERVAL_MS"))?;

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            rate_service_url,
            rate_retry_max_attempts,
            rate_retry_short_interval_ms,
            rate_retry_long_interval_ms,
        })
    }

    /// Retry policy for the currency conversion gateway
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.rate_retry_max_attempts,
            short_interval: Duration::from_millis(self.rate_retry_short_interval_ms),
            long_interval: Duration::from_millis(self.rate_retry_long_interval_ms),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
