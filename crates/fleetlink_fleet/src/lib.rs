//! Device presence, polling gateway and HTTP routes for Fleetlink
//!
//! Agents register and heartbeat, poll for queued commands and acknowledge
//! them; operators enqueue commands, inspect devices and delete them. The
//! storage lives in `fleetlink-db`; this crate composes it and exposes it
//! over HTTP.
//!
//! # Example
//!
//! ```rust,no_run
//! use fleetlink_common::SystemClock;
//! use fleetlink_config::AppConfig;
//! use fleetlink_db::{DbClient, FleetRepositoryFactory, RepositoryFactory};
//! use fleetlink_fleet::{routes, FleetService};
//! use std::sync::Arc;
//!
//! async fn setup_app() -> Result<axum::Router, fleetlink_db::DbError> {
//!     let config = AppConfig::default();
//!     let client = DbClient::new(&config).await?;
//!     let repositories = FleetRepositoryFactory::new().create_repository(client);
//!     repositories.init_schema().await?;
//!
//!     let service = FleetService::from_repositories(repositories, &config, Arc::new(SystemClock));
//!     Ok(axum::Router::new().nest("/api", routes(service)))
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `POST /register` - Register a device or record a heartbeat
//! - `GET /devices` - List devices with presence
//! - `GET|DELETE /device/{id}` - Inspect or delete a device
//! - `POST /command` - Queue a command
//! - `GET /device/{id}/commands` - Poll (claim) queued commands
//! - `GET /device/{id}/history` - Every command of a device
//! - `GET /command/{id}` - Inspect a command
//! - `POST /command/{id}/execute` - Acknowledge a command
//! - `GET|POST /device/{id}/logs` - Device log records
//! - `GET /health` - Database health

#[cfg(feature = "openapi")]
pub mod doc;
pub mod handlers;
pub mod presence;
pub mod routes;
pub mod service;
pub mod validation;

pub use presence::{is_online, PresenceEvaluator, DEFAULT_ONLINE_THRESHOLD_SECS};
pub use routes::routes;
pub use service::FleetService;

#[cfg(feature = "openapi")]
pub mod openapi {
    pub use crate::doc::FleetApiDoc;
}
