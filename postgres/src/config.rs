//! Store configuration.
//!
//! Connection settings are provided by the application, typically
//! from the environment; nothing here is hardcoded beyond defaults.

use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is missing or empty.
    #[error("missing {0} environment variable")]
    MissingVar(&'static str),
}

/// `PostgreSQL` connection configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Connection string, e.g. `postgres://localhost/workorder`.
    pub database_url: String,

    /// Maximum pool size.
    ///
    /// Default: 5
    pub max_connections: u32,

    /// How long to wait for a connection from the pool.
    ///
    /// Default: 5 seconds
    pub acquire_timeout: Duration,
}

impl StoreConfig {
    /// Create a configuration with default pool settings.
    #[must_use]
    pub const fn new(database_url: String) -> Self {
        Self {
            database_url,
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
        }
    }

    /// Set the maximum pool size.
    #[must_use]
    pub const fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Set the pool acquire timeout.
    #[must_use]
    pub const fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Load configuration from the environment.
    ///
    /// Reads `DATABASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVar`] if `DATABASE_URL` is
    /// unset or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var("DATABASE_URL") {
            Ok(url) if !url.is_empty() => Ok(Self::new(url)),
            _ => Err(ConfigError::MissingVar("DATABASE_URL")),
        }
    }
}
