//! Repository for the per-device command queue
//!
//! Commands move `pending` → `sent` when a claim returns them and → `executed`
//! when acknowledged. They never return to `pending`.

use crate::error::DbError;
use chrono::{DateTime, Duration, Utc};
use fleetlink_common::Command;

/// Repository for queued commands
pub trait CommandRepository: Send + Sync {
    /// Create the `commands` table and its index if they do not exist
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Append a `pending` command for a device and return its id
    ///
    /// Fails with [`DbError::DeviceNotFound`] if the device is not registered.
    fn enqueue(
        &self,
        device_id: &str,
        command_type: &str,
        command_data: &serde_json::Value,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<i64, DbError>> + Send;

    /// Atomically move every claimable command of a device to `sent` and return them
    ///
    /// Claimable means `pending`, plus, when `redelivery_after` is set, `sent`
    /// commands whose `sent_at` is at least that old. The result is ordered by
    /// command id; an empty result is not an error. Concurrent claims for the
    /// same device receive disjoint sets. Fails with
    /// [`DbError::DeviceNotFound`] if the device is not registered.
    fn claim_pending(
        &self,
        device_id: &str,
        now: DateTime<Utc>,
        redelivery_after: Option<Duration>,
    ) -> impl std::future::Future<Output = Result<Vec<Command>, DbError>> + Send;

    /// Mark a command `executed`
    ///
    /// Unconditional and idempotent. Fails with [`DbError::CommandNotFound`]
    /// if the id is unknown.
    fn acknowledge(
        &self,
        command_id: i64,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Find a command by id
    fn get(
        &self,
        command_id: i64,
    ) -> impl std::future::Future<Output = Result<Option<Command>, DbError>> + Send;

    /// Every command of a device regardless of status, ordered by id
    fn list_for_device(
        &self,
        device_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Command>, DbError>> + Send;
}
