//! Configuration management for the Labelworks backend
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with LW_ prefix

use std::sync::Arc;
use std::time::Duration;

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::reconciliation::{ArrivalDateReached, ArrivalPredicate, ArrivedFlag};

/// Main application configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Inventory reconciliation configuration
    #[serde(default)]
    pub inventory: InventoryConfig,
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
#[serde(default)]
pub struct InventoryConfig {
    /// Upper bound for a single recompute, in seconds
    pub recompute_timeout_secs: u64,

    /// Rule deciding when a purchase order counts as arrived
    pub arrival_rule: ArrivalRule,

    /// Attempts per change notification before giving up
    pub trigger_max_attempts: u32,

    /// Pause between notification attempts, in milliseconds
    pub trigger_retry_delay_ms: u64,

    /// Rebuild every material's inventory when the server starts
    pub recompute_on_startup: bool,
}

/// How arrival of a purchase order is decided.
/// Exactly one rule is active per process.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ArrivalRule {
    /// The order's `has_arrived` flag
    #[default]
    Flag,
    /// The arrival date is set and not in the future
    ArrivalDate,
}

impl ArrivalRule {
    pub fn predicate(self) -> Arc<dyn ArrivalPredicate> {
        match self {
            ArrivalRule::Flag => Arc::new(ArrivedFlag),
            ArrivalRule::ArrivalDate => Arc::new(ArrivalDateReached::today()),
        }
    }
}

impl InventoryConfig {
    pub fn recompute_timeout(&self) -> Duration {
        Duration::from_secs(self.recompute_timeout_secs)
    }

    pub fn trigger_retry_delay(&self) -> Duration {
        Duration::from_millis(self.trigger_retry_delay_ms)
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("LW_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("inventory.recompute_timeout_secs", 60)?
            .set_default("inventory.arrival_rule", "flag")?
            .set_default("inventory.trigger_max_attempts", 3)?
            .set_default("inventory.trigger_retry_delay_ms", 250)?
            .set_default("inventory.recompute_on_startup", true)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (LW_ prefix)
            .add_source(
                Environment::with_prefix("LW")
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

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/labelworks".to_string(),
            max_connections: 10,
            min_connections: 2,
        }
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            recompute_timeout_secs: 60,
            arrival_rule: ArrivalRule::Flag,
            trigger_max_attempts: 3,
            trigger_retry_delay_ms: 250,
            recompute_on_startup: true,
        }
    }
}
