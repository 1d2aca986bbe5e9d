//! Conversions between stored column values and model types.
//!
//! Timestamps are stored as UTC epoch milliseconds so that `MAX(last_seen)`
//! and the redelivery cutoff are plain integer comparisons; JSON payloads are
//! stored as text.

use crate::error::DbError;
use chrono::{DateTime, Utc};
use fleetlink_common::{Command, CommandStatus, Device, DeviceAttributes, DeviceLog};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(crate) fn from_millis(ms: i64) -> Result<DateTime<Utc>, DbError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| DbError::DecodeError(format!("timestamp out of range: {}", ms)))
}

fn opt_from_millis(ms: Option<i64>) -> Result<Option<DateTime<Utc>>, DbError> {
    ms.map(from_millis).transpose()
}

pub(crate) fn json_to_text(value: &serde_json::Value) -> Result<String, DbError> {
    serde_json::to_string(value).map_err(|e| DbError::DecodeError(e.to_string()))
}

fn text_to_json(text: &str) -> Result<serde_json::Value, DbError> {
    serde_json::from_str(text).map_err(|e| DbError::DecodeError(e.to_string()))
}

pub(crate) const DEVICE_COLUMNS: &str =
    "device_id, name, os_version, phone_number, battery_level, last_seen, created_at";

pub(crate) const COMMAND_COLUMNS: &str =
    "id, device_id, command_type, command_data, status, created_at, sent_at, executed_at";

pub(crate) const LOG_COLUMNS: &str = "id, device_id, kind, payload, created_at";

pub(crate) fn device_from_row(row: &SqliteRow) -> Result<Device, DbError> {
    Ok(Device {
        device_id: row.try_get("device_id")?,
        attributes: DeviceAttributes {
            name: row.try_get("name")?,
            os_version: row.try_get("os_version")?,
            phone_number: row.try_get("phone_number")?,
            battery_level: row.try_get("battery_level")?,
        },
        last_seen: from_millis(row.try_get("last_seen")?)?,
        created_at: from_millis(row.try_get("created_at")?)?,
    })
}

pub(crate) fn command_from_row(row: &SqliteRow) -> Result<Command, DbError> {
    let status: String = row.try_get("status")?;
    let command_data: String = row.try_get("command_data")?;

    Ok(Command {
        command_id: row.try_get("id")?,
        device_id: row.try_get("device_id")?,
        command_type: row.try_get("command_type")?,
        command_data: text_to_json(&command_data)?,
        status: status
            .parse::<CommandStatus>()
            .map_err(|e| DbError::DecodeError(e.to_string()))?,
        created_at: from_millis(row.try_get("created_at")?)?,
        sent_at: opt_from_millis(row.try_get("sent_at")?)?,
        executed_at: opt_from_millis(row.try_get("executed_at")?)?,
    })
}

pub(crate) fn log_from_row(row: &SqliteRow) -> Result<DeviceLog, DbError> {
    let payload: String = row.try_get("payload")?;

    Ok(DeviceLog {
        log_id: row.try_get("id")?,
        device_id: row.try_get("device_id")?,
        kind: row.try_get("kind")?,
        payload: text_to_json(&payload)?,
        created_at: from_millis(row.try_get("created_at")?)?,
    })
}
