//! Store configuration and connector selection.
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `postgres` (default) | `in_memory`
//! - `DB_HOST`, `DB_USER`, `DB_NAME`: required when `STORAGE_MODE=postgres`
//! - `DB_PORT`: store port (default: `5432`)
//! - `DB_PASSWORD`: store password (default: empty)
//! - `DB_RETRY_DELAY_SECS`: delay between connection attempts (default: `5`)
//!
//! # Example
//!
//! ```ignore
//! let config = StoreConfig::from_env()?;
//! let connector = create_connector(&config)?;
//! spawn_connect_loop(link, connector, config.retry_delay);
//! ```

use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgConnectOptions;
use thiserror::Error;

use super::link::{DEFAULT_RETRY_DELAY, StoreConnector};
use super::{InMemoryConnector, InMemoryItemRepository, PostgresConnector};

const DEFAULT_DB_PORT: u16 = 5432;

// =============================================================================
// Configuration Types
// =============================================================================

/// Which store backs the items table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// `PostgreSQL` for real deployments.
    #[default]
    Postgres,
    /// Process-local table, lost on exit. Development only.
    InMemory,
}

impl FromStr for StorageMode {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "in_memory" | "inmemory" | "memory" => Ok(Self::InMemory),
            _ => Err(ConfigurationError::InvalidStorageMode(value.to_string())),
        }
    }
}

/// Connection settings for the `PostgreSQL` store.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl DatabaseConfig {
    /// Builds `sqlx` connection options.
    #[must_use]
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub storage_mode: StorageMode,
    /// Present iff `storage_mode` is `Postgres`.
    pub database: Option<DatabaseConfig>,
    pub retry_delay: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_mode: StorageMode::InMemory,
            database: None,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl StoreConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if a value is malformed or a variable
    /// required by the selected storage mode is missing.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    ///
    /// Empty and whitespace-only values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if a value is malformed or a variable
    /// required by the selected storage mode is missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigurationError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let storage_mode = read("STORAGE_MODE")
            .map(|value| value.parse::<StorageMode>())
            .transpose()?
            .unwrap_or_default();

        let retry_delay = read("DB_RETRY_DELAY_SECS")
            .map(|value| parse_number::<u64>("DB_RETRY_DELAY_SECS", &value))
            .transpose()?
            .map_or(DEFAULT_RETRY_DELAY, Duration::from_secs);

        let database = match storage_mode {
            StorageMode::InMemory => None,
            StorageMode::Postgres => {
                let require = |name: &'static str| {
                    read(name).ok_or(ConfigurationError::MissingVariable(name))
                };
                let port = read("DB_PORT")
                    .map(|value| parse_number::<u16>("DB_PORT", &value))
                    .transpose()?
                    .unwrap_or(DEFAULT_DB_PORT);

                Some(DatabaseConfig {
                    host: require("DB_HOST")?,
                    port,
                    user: require("DB_USER")?,
                    // Passwords may legitimately be blank.
                    password: lookup("DB_PASSWORD").unwrap_or_default(),
                    database: require("DB_NAME")?,
                })
            }
        };

        Ok(Self {
            storage_mode,
            database,
            retry_delay,
        })
    }
}

/// Parses a numeric environment value.
///
/// # Errors
///
/// Returns `ConfigurationError::InvalidNumber` if `value` is not a valid `T`.
pub fn parse_number<T: FromStr>(
    variable: &'static str,
    value: &str,
) -> Result<T, ConfigurationError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigurationError::InvalidNumber {
            variable,
            value: value.to_string(),
        })
}

// =============================================================================
// Connector Selection
// =============================================================================

/// Creates the connector for the configured storage mode.
///
/// # Errors
///
/// Returns `ConfigurationError::MissingVariable` if the `PostgreSQL` mode was
/// selected without connection settings.
pub fn create_connector(
    config: &StoreConfig,
) -> Result<Arc<dyn StoreConnector + Send + Sync>, ConfigurationError> {
    match config.storage_mode {
        StorageMode::InMemory => Ok(Arc::new(InMemoryConnector::new(
            InMemoryItemRepository::new(),
        ))),
        StorageMode::Postgres => {
            let database = config
                .database
                .as_ref()
                .ok_or(ConfigurationError::MissingVariable("DB_HOST"))?;
            Ok(Arc::new(PostgresConnector::new(database.connect_options())))
        }
    }
}

// =============================================================================
// Configuration Error
// =============================================================================

/// Errors raised while reading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// `STORAGE_MODE` has an unknown value.
    #[error("Invalid STORAGE_MODE: '{0}'. Expected 'postgres' or 'in_memory'")]
    InvalidStorageMode(String),

    /// A required variable is not set.
    #[error("Missing required environment variable: {0}")]
    MissingVariable(&'static str),

    /// A numeric variable could not be parsed.
    #[error("Invalid value for {variable}: '{value}'")]
    InvalidNumber {
        variable: &'static str,
        value: String,
    },
}

// =============================================================================
// Tests
// =============================================================================
