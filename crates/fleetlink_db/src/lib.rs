//! Database integration for Fleetlink
//!
//! Persists the device registry, the per-device command queue and auxiliary
//! device logs in SQLite through SQLx.
//!
//! # Example
//!
//! ```rust,no_run
//! use fleetlink_db::{DbClient, FleetRepositoryFactory, RepositoryFactory};
//!
//! async fn setup_db() -> Result<(), fleetlink_db::DbError> {
//!     let client = DbClient::from_url("sqlite:data/fleetlink.db").await?;
//!     let repositories = FleetRepositoryFactory::new().create_repository(client);
//!     repositories.init_schema().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
mod convert;
pub mod error;
pub mod repositories;
pub mod repository;

pub use client::DbClient;
pub use error::DbError;
pub use repository::RepositoryFactory;

pub use repositories::{
    CommandRepository, DeviceLogRepository, DeviceRepository, FleetRepositories,
    FleetRepositoryFactory, SqlCommandRepository, SqlDeviceLogRepository, SqlDeviceRepository,
};
