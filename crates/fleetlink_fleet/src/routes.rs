use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tracing::info;

use crate::handlers::{
    acknowledge_command_handler, append_log_handler, command_history_handler,
    delete_device_handler, enqueue_command_handler, get_command_handler, get_device_handler,
    health_handler, list_devices_handler, list_logs_handler, poll_commands_handler,
    register_handler, FleetState,
};
use crate::service::FleetService;

/// Create the fleet routes for the API
///
/// The router is meant to be nested under `/api` by the backend.
///
/// # Arguments
///
/// * `service` - The gateway the handlers delegate to
///
/// # Returns
///
/// An Axum router with the device, command, log and health endpoints
pub fn routes(service: FleetService) -> Router {
    let state = Arc::new(FleetState { service });

    info!("Fleet routes initialized");

    Router::new()
        .route("/register", post(register_handler))
        .route("/devices", get(list_devices_handler))
        .route(
            "/device/{id}",
            get(get_device_handler).delete(delete_device_handler),
        )
        .route("/device/{id}/commands", get(poll_commands_handler))
        .route("/device/{id}/history", get(command_history_handler))
        .route(
            "/device/{id}/logs",
            get(list_logs_handler).post(append_log_handler),
        )
        .route("/command", post(enqueue_command_handler))
        .route("/command/{id}", get(get_command_handler))
        .route("/command/{id}/execute", post(acknowledge_command_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}
