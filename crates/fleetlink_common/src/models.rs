// --- File: crates/fleetlink_common/src/models.rs ---

//! Data structures shared by the storage layer and the HTTP boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Informational display attributes reported by an agent on every registration.
///
/// None of these fields carry invariants; they are overwritten wholesale on
/// each heartbeat.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeviceAttributes {
    pub name: Option<String>,
    pub os_version: Option<String>,
    pub phone_number: Option<String>,
    /// Battery percentage, 0-100
    pub battery_level: Option<i64>,
}

/// A remote agent known to the registry.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Device {
    /// Opaque, stable identity chosen by the agent
    pub device_id: String,

    #[serde(flatten)]
    pub attributes: DeviceAttributes,

    /// Last registration or heartbeat; never moves backwards
    pub last_seen: DateTime<Utc>,

    /// Set on first registration and never changed
    pub created_at: DateTime<Utc>,
}

/// A device record annotated with its computed presence.
///
/// `online` is derived at query time and never stored.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceWithPresence {
    #[serde(flatten)]
    pub device: Device,
    pub online: bool,
}

/// Lifecycle state of a queued command.
///
/// A claim moves `Pending` to `Sent`; an acknowledgment moves any state to
/// `Executed`. Nothing returns to `Pending`.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    /// Enqueued, not yet handed to an agent
    Pending,
    /// Returned by a claim; considered delivered
    Sent,
    /// Acknowledged by the agent
    Executed,
}

impl CommandStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandStatus::Pending => "pending",
            CommandStatus::Sent => "sent",
            CommandStatus::Executed => "executed",
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown command status string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown command status '{0}'")]
pub struct UnknownCommandStatus(pub String);

impl FromStr for CommandStatus {
    type Err = UnknownCommandStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CommandStatus::Pending),
            "sent" => Ok(CommandStatus::Sent),
            "executed" => Ok(CommandStatus::Executed),
            other => Err(UnknownCommandStatus(other.to_string())),
        }
    }
}

/// A command queued for a device.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Command {
    /// Monotonic identity assigned by the queue
    pub command_id: i64,
    pub device_id: String,
    /// Free-form tag interpreted by the agent
    pub command_type: String,
    /// Opaque payload, passed through unmodified
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub command_data: serde_json::Value,
    pub status: CommandStatus,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub executed_at: Option<DateTime<Utc>>,
}

/// The view of a command handed to a polling agent.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolledCommand {
    pub command_id: i64,
    pub command_type: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub command_data: serde_json::Value,
}

impl From<Command> for PolledCommand {
    fn from(command: Command) -> Self {
        Self {
            command_id: command.command_id,
            command_type: command.command_type,
            command_data: command.command_data,
        }
    }
}

/// Auxiliary pass-through record reported by an agent (SMS, form data, ...).
///
/// Removed together with its device.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceLog {
    pub log_id: i64,
    pub device_id: String,
    pub kind: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
