// --- File: crates/fleetlink_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

// --- Database Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub url: String, // e.g. sqlite:fleetlink.db, overridable via FLEETLINK__DATABASE__URL
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:fleetlink.db".to_string(),
            max_connections: default_max_connections(),
        }
    }
}

// --- Presence Config ---
/// Staleness threshold used to derive online/offline status.
///
/// Fixed for the lifetime of the process.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PresenceConfig {
    #[serde(default = "default_online_threshold_secs")]
    pub online_threshold_secs: u64,
}

fn default_online_threshold_secs() -> u64 {
    20
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            online_threshold_secs: default_online_threshold_secs(),
        }
    }
}

// --- Queue Config ---
/// Command queue behaviour.
///
/// `redelivery_timeout_secs` is `None` unless explicitly configured: a claimed
/// command that is never acknowledged then stays `sent` forever. Setting it
/// makes such commands claimable again once they are older than the timeout.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct QueueConfig {
    #[serde(default)]
    pub redelivery_timeout_secs: Option<u64>,
}

// --- Logging Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct AppConfig {
    // Server config is mandatory in config files
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub presence: PresenceConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}
