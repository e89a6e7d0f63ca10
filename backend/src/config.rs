//! Configuration management for the warehouse inventory service
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with WIMS_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Which store backs the repositories
    pub storage: StorageConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT verification configuration
    pub jwt: JwtConfig,

    /// Audit side-channel configuration
    pub audit: AuditConfig,

    /// Ledger query limits
    pub ledger: LedgerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    #[serde(default)]
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Seconds to wait for a pooled connection
    pub acquire_timeout_secs: u64,

    /// Apply pending migrations at start-up
    pub run_migrations: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key the access tokens are signed with
    pub secret: String,

    /// Clock skew tolerated on `exp`, in seconds
    pub leeway_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuditConfig {
    /// Records buffered between the workflows and the audit writer
    pub channel_capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LedgerConfig {
    /// Rows returned by transaction history when no limit is given
    pub default_history_limit: u32,

    /// Upper bound applied to any requested history limit
    pub max_history_limit: u32,

    /// Most recent rows considered by the user activity summary
    pub activity_window: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_history_limit: 100,
            max_history_limit: 1000,
            activity_window: 100,
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("WIMS_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("storage.backend", "postgres")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("database.run_migrations", environment == "development")?
            .set_default("jwt.leeway_secs", 0)?
            .set_default("audit.channel_capacity", 1024)?
            .set_default("ledger.default_history_limit", 100)?
            .set_default("ledger.max_history_limit", 1000)?
            .set_default("ledger.activity_window", 100)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (WIMS_ prefix)
            .add_source(
                Environment::with_prefix("WIMS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
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
