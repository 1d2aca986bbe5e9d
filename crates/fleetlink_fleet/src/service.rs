//! The polling gateway.
//!
//! [`FleetService`] composes the device registry, the command queue and the
//! device log store behind the operations the HTTP boundary calls. Each
//! operation reads the clock once and delegates; all state lives in the
//! repositories, so the service holds nothing between requests.

use chrono::Duration;
use fleetlink_common::{
    Clock, Command, Device, DeviceAttributes, DeviceLog, DeviceWithPresence, FleetError,
};
use fleetlink_config::AppConfig;
use fleetlink_db::{
    CommandRepository, DeviceLogRepository, DeviceRepository, FleetRepositories,
    SqlCommandRepository, SqlDeviceLogRepository, SqlDeviceRepository,
};
use std::sync::Arc;

use crate::presence::{secs_to_duration, PresenceEvaluator};

/// Gateway over the registry, queue and log store.
///
/// The type parameters default to the SQL repositories used by the server.
#[derive(Debug, Clone)]
pub struct FleetService<
    D = SqlDeviceRepository,
    C = SqlCommandRepository,
    L = SqlDeviceLogRepository,
> {
    devices: D,
    commands: C,
    logs: L,
    presence: PresenceEvaluator,
    clock: Arc<dyn Clock>,
    redelivery_after: Option<Duration>,
}

impl FleetService {
    /// Build the SQL-backed service with presence and redelivery taken from `config`.
    pub fn from_repositories(
        repositories: FleetRepositories,
        config: &AppConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(
            repositories.devices,
            repositories.commands,
            repositories.logs,
            clock,
        )
        .with_presence(PresenceEvaluator::from_secs(
            config.presence.online_threshold_secs,
        ))
        .with_redelivery(config.queue.redelivery_timeout_secs.map(secs_to_duration))
    }
}

impl<D, C, L> FleetService<D, C, L>
where
    D: DeviceRepository,
    C: CommandRepository,
    L: DeviceLogRepository,
{
    /// Create a service with the default presence threshold and no redelivery.
    pub fn new(devices: D, commands: C, logs: L, clock: Arc<dyn Clock>) -> Self {
        Self {
            devices,
            commands,
            logs,
            presence: PresenceEvaluator::default(),
            clock,
            redelivery_after: None,
        }
    }

    pub fn with_presence(mut self, presence: PresenceEvaluator) -> Self {
        self.presence = presence;
        self
    }

    /// Let claims also return `sent` commands unacknowledged for at least `after`.
    ///
    /// `None` keeps the baseline: a delivered command is never handed out again.
    pub fn with_redelivery(mut self, after: Option<Duration>) -> Self {
        self.redelivery_after = after;
        self
    }

    pub fn redelivery_after(&self) -> Option<Duration> {
        self.redelivery_after
    }

    /// Register a device or record a heartbeat.
    pub async fn register(
        &self,
        device_id: &str,
        attributes: &DeviceAttributes,
    ) -> Result<Device, FleetError> {
        let now = self.clock.now();
        Ok(self
            .devices
            .register_or_touch(device_id, attributes, now)
            .await?)
    }

    /// Every device, oldest first, with presence computed at call time.
    pub async fn list_devices(&self) -> Result<Vec<DeviceWithPresence>, FleetError> {
        let now = self.clock.now();
        let devices = self.devices.list().await?;
        Ok(devices
            .into_iter()
            .map(|device| self.presence.evaluate(device, now))
            .collect())
    }

    pub async fn get_device(&self, device_id: &str) -> Result<DeviceWithPresence, FleetError> {
        let now = self.clock.now();
        let device = self.require_device(device_id).await?;
        Ok(self.presence.evaluate(device, now))
    }

    /// Remove a device with all of its commands and logs.
    pub async fn delete_device(&self, device_id: &str) -> Result<(), FleetError> {
        if self.devices.delete(device_id).await? {
            Ok(())
        } else {
            Err(FleetError::DeviceNotFound(device_id.to_string()))
        }
    }

    /// Queue a command for a registered device and return its id.
    pub async fn enqueue_command(
        &self,
        device_id: &str,
        command_type: &str,
        command_data: &serde_json::Value,
    ) -> Result<i64, FleetError> {
        let now = self.clock.now();
        Ok(self
            .commands
            .enqueue(device_id, command_type, command_data, now)
            .await?)
    }

    /// Claim every deliverable command of a device, in id order.
    ///
    /// The returned commands are already `sent` when this resolves.
    pub async fn poll_commands(&self, device_id: &str) -> Result<Vec<Command>, FleetError> {
        let now = self.clock.now();
        Ok(self
            .commands
            .claim_pending(device_id, now, self.redelivery_after)
            .await?)
    }

    /// All commands of a device regardless of status.
    pub async fn command_history(&self, device_id: &str) -> Result<Vec<Command>, FleetError> {
        self.require_device(device_id).await?;
        Ok(self.commands.list_for_device(device_id).await?)
    }

    pub async fn get_command(&self, command_id: i64) -> Result<Command, FleetError> {
        self.commands
            .get(command_id)
            .await?
            .ok_or(FleetError::CommandNotFound(command_id))
    }

    /// Mark a command executed. Repeating the call is a no-op.
    pub async fn acknowledge_command(&self, command_id: i64) -> Result<(), FleetError> {
        let now = self.clock.now();
        Ok(self.commands.acknowledge(command_id, now).await?)
    }

    pub async fn append_log(
        &self,
        device_id: &str,
        kind: &str,
        payload: &serde_json::Value,
    ) -> Result<DeviceLog, FleetError> {
        let now = self.clock.now();
        Ok(self.logs.append(device_id, kind, payload, now).await?)
    }

    pub async fn list_logs(&self, device_id: &str) -> Result<Vec<DeviceLog>, FleetError> {
        self.require_device(device_id).await?;
        Ok(self.logs.list_for_device(device_id).await?)
    }

    /// Whether the storage layer is reachable.
    pub async fn health(&self) -> bool {
        self.devices.is_healthy().await
    }

    async fn require_device(&self, device_id: &str) -> Result<Device, FleetError> {
        self.devices
            .get(device_id)
            .await?
            .ok_or_else(|| FleetError::DeviceNotFound(device_id.to_string()))
    }
}
