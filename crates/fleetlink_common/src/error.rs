use std::fmt;
use thiserror::Error;

/// The boundary-facing error type for Fleetlink.
///
/// The two not-found variants are the only signals the command core produces
/// for well-formed input. `ValidationError` is raised by the HTTP boundary and
/// never reaches the core. Storage crates convert their own errors into this
/// type by implementing `From<SpecificError> for FleetError`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FleetError {
    /// An operation referenced a device id that is not registered
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// An acknowledgment referenced an unknown command id
    #[error("Command not found: {0}")]
    CommandNotFound(i64),

    /// Malformed input rejected at the boundary
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The storage layer failed
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for FleetError {
    fn status_code(&self) -> u16 {
        match self {
            FleetError::DeviceNotFound(_) => 404,
            FleetError::CommandNotFound(_) => 404,
            FleetError::ValidationError(_) => 400,
            FleetError::DatabaseError(_) => 500,
            FleetError::ConfigError(_) => 500,
            FleetError::InternalError(_) => 500,
        }
    }
}

impl FleetError {
    /// Whether this error is the caller's fault (4xx) rather than the server's.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

pub fn validation_error<T: fmt::Display>(message: T) -> FleetError {
    FleetError::ValidationError(message.to_string())
}
