//! Error types for the database layer

use fleetlink_common::FleetError;
use thiserror::Error;

/// Errors that can occur when working with the device and command stores
#[derive(Debug, Error)]
pub enum DbError {
    /// Error from SQLx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    /// Error with the database configuration
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// Error with database URL parsing
    #[error("Database URL error: {0}")]
    UrlError(String),

    /// Error with database pool creation
    #[error("Database pool error: {0}")]
    PoolError(String),

    /// Error with database query
    #[error("Database query error: {0}")]
    QueryError(String),

    /// Error with database transaction
    #[error("Database transaction error: {0}")]
    TransactionError(String),

    /// A stored value could not be turned back into a model
    #[error("Database decode error: {0}")]
    DecodeError(String),

    /// The referenced device does not exist
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// The referenced command does not exist
    #[error("Command not found: {0}")]
    CommandNotFound(i64),
}

impl From<DbError> for FleetError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::DeviceNotFound(device_id) => FleetError::DeviceNotFound(device_id),
            DbError::CommandNotFound(command_id) => FleetError::CommandNotFound(command_id),
            DbError::ConfigError(message) | DbError::UrlError(message) => {
                FleetError::ConfigError(message)
            }
            other => FleetError::DatabaseError(other.to_string()),
        }
    }
}
