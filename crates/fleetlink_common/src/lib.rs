// --- File: crates/fleetlink_common/src/lib.rs ---

// Declare modules within this crate
pub mod clock; // Time source abstraction
pub mod error; // Error taxonomy
pub mod http; // HTTP error mapping
pub mod logging; // Logging utilities
pub mod models; // Shared data structures

// Re-export error types and utilities for easier access
pub use error::{validation_error, FleetError, HttpStatusCode};

// Re-export HTTP utilities for easier access
pub use http::IntoHttpResponse;

pub use clock::{Clock, ManualClock, SystemClock};
pub use models::{
    Command, CommandStatus, Device, DeviceAttributes, DeviceLog, DeviceWithPresence,
    PolledCommand, UnknownCommandStatus,
};
