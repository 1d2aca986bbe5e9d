//! Factory for creating the Fleetlink repositories
//!
//! All repositories share one [`DbClient`] and therefore one connection pool,
//! which is what lets the cascade delete and the queue operations serialize
//! on the same database.

use crate::error::DbError;
use crate::repositories::command::CommandRepository;
use crate::repositories::command_sql::SqlCommandRepository;
use crate::repositories::device::DeviceRepository;
use crate::repositories::device_log::DeviceLogRepository;
use crate::repositories::device_log_sql::SqlDeviceLogRepository;
use crate::repositories::device_sql::SqlDeviceRepository;
use crate::{DbClient, RepositoryFactory};

/// The full set of SQL repositories backing the server
#[derive(Debug, Clone)]
pub struct FleetRepositories {
    pub devices: SqlDeviceRepository,
    pub commands: SqlCommandRepository,
    pub logs: SqlDeviceLogRepository,
}

impl FleetRepositories {
    /// Create every table and index; safe to call on an existing database
    pub async fn init_schema(&self) -> Result<(), DbError> {
        self.devices.init_schema().await?;
        self.commands.init_schema().await?;
        self.logs.init_schema().await?;
        Ok(())
    }
}

/// Factory for creating the SQL repositories from a database client
#[derive(Debug, Clone, Default)]
pub struct FleetRepositoryFactory;

impl FleetRepositoryFactory {
    pub fn new() -> Self {
        Self
    }
}

impl RepositoryFactory<FleetRepositories, DbClient> for FleetRepositoryFactory {
    fn create_repository(&self, db_client: DbClient) -> FleetRepositories {
        FleetRepositories {
            devices: SqlDeviceRepository::new(db_client.clone()),
            commands: SqlCommandRepository::new(db_client.clone()),
            logs: SqlDeviceLogRepository::new(db_client),
        }
    }
}
