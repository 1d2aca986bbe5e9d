//! Repository for auxiliary per-device log records
//!
//! Logs are pass-through storage (SMS, form data, ...) with no invariants of
//! their own. They exist as dependents of a device and are removed by its
//! cascade delete.

use crate::error::DbError;
use chrono::{DateTime, Utc};
use fleetlink_common::DeviceLog;

/// Repository for device log records
pub trait DeviceLogRepository: Send + Sync {
    /// Create the `device_logs` table if it does not exist
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Store a log record; fails with [`DbError::DeviceNotFound`] for unknown devices
    fn append(
        &self,
        device_id: &str,
        kind: &str,
        payload: &serde_json::Value,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<DeviceLog, DbError>> + Send;

    /// Log records of a device in insertion order
    fn list_for_device(
        &self,
        device_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<DeviceLog>, DbError>> + Send;
}
