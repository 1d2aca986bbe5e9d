//! Repository for the device registry
//!
//! Tracks known devices and their last-contact timestamps.

use crate::error::DbError;
use chrono::{DateTime, Utc};
use fleetlink_common::{Device, DeviceAttributes};

/// Repository for registered devices
pub trait DeviceRepository: Send + Sync {
    /// Create the `devices` table if it does not exist
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Register a device or record a heartbeat from it
    ///
    /// An unknown `device_id` is created with `created_at = last_seen = now`.
    /// A known one has every attribute overwritten and `last_seen` advanced to
    /// `now` (it never moves backwards). Returns the stored record.
    fn register_or_touch(
        &self,
        device_id: &str,
        attributes: &DeviceAttributes,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Device, DbError>> + Send;

    /// Find a device by id
    fn get(
        &self,
        device_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Device>, DbError>> + Send;

    /// All devices, oldest registration first
    fn list(&self) -> impl std::future::Future<Output = Result<Vec<Device>, DbError>> + Send;

    /// Delete a device together with all of its commands and log entries
    ///
    /// Atomic: either everything belonging to the device is removed or nothing
    /// is. Returns `false` if the device did not exist.
    fn delete(
        &self,
        device_id: &str,
    ) -> impl std::future::Future<Output = Result<bool, DbError>> + Send;

    /// Whether the backing store answers queries
    fn is_healthy(&self) -> impl std::future::Future<Output = bool> + Send;
}
