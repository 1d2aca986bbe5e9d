//! HTTP handlers for the polling gateway
//!
//! Agents register, poll and acknowledge; operators enqueue, inspect and
//! delete. Each handler validates its input, calls [`FleetService`] and maps
//! failures through [`FleetError`]'s `IntoResponse` impl. Body deserialization
//! failures are validation errors as well. Client errors are
//! logged at `warn`, server errors at `error`.

use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use fleetlink_common::{
    Command, Device, DeviceAttributes, DeviceLog, DeviceWithPresence, FleetError, PolledCommand,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::service::FleetService;
use crate::validation;

/// Shared state for the fleet handlers
#[derive(Debug, Clone)]
pub struct FleetState {
    pub service: FleetService,
}

/// Registration or heartbeat from an agent
#[derive(Debug, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RegisterRequest {
    /// Stable identity chosen by the agent
    pub device_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub os_version: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Battery percentage, 0-100
    #[serde(default)]
    pub battery_level: Option<i64>,
}

impl RegisterRequest {
    fn attributes(&self) -> DeviceAttributes {
        DeviceAttributes {
            name: self.name.clone(),
            os_version: self.os_version.clone(),
            phone_number: self.phone_number.clone(),
            battery_level: self.battery_level,
        }
    }
}

/// Operator request to queue a command
#[derive(Debug, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EnqueueCommandRequest {
    pub device_id: String,
    /// Tag interpreted by the agent
    pub command_type: String,
    /// Opaque payload handed to the agent unchanged
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub command_data: serde_json::Value,
}

#[derive(Debug, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EnqueueCommandResponse {
    pub command_id: i64,
}

/// Auxiliary record reported by an agent
#[derive(Debug, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AppendLogRequest {
    /// Record kind, e.g. `sms` or `form`
    pub kind: String,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub payload: serde_json::Value,
}

#[derive(Debug, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    /// `ok` or `unavailable`
    pub status: String,
}

fn log_failure(operation: &str, err: &FleetError) {
    if err.is_client_error() {
        warn!("{} rejected: {}", operation, err);
    } else {
        error!("{} failed: {}", operation, err);
    }
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Device registered or refreshed", body = Device),
        (status = 400, description = "Invalid device id or attributes")
    ),
    tag = "Fleet"
))]
pub async fn register_handler(
    State(state): State<Arc<FleetState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<Device>, FleetError> {
    let result: Result<_, FleetError> = async {
        let Json(payload) = payload?;
        let device_id = validation::device_id(&payload.device_id)?;
        let attributes = payload.attributes();
        validation::attributes(&attributes)?;
        debug!("Heartbeat from device: {}", device_id);
        state.service.register(device_id, &attributes).await
    }
    .await;

    result
        .map(Json)
        .inspect_err(|err| log_failure("Register", err))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/devices",
    responses(
        (status = 200, description = "All devices with computed presence", body = Vec<DeviceWithPresence>)
    ),
    tag = "Fleet"
))]
pub async fn list_devices_handler(
    State(state): State<Arc<FleetState>>,
) -> Result<Json<Vec<DeviceWithPresence>>, FleetError> {
    state
        .service
        .list_devices()
        .await
        .map(Json)
        .inspect_err(|err| log_failure("List devices", err))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/device/{id}",
    params(("id" = String, Path, description = "Device id")),
    responses(
        (status = 200, description = "Device with computed presence", body = DeviceWithPresence),
        (status = 404, description = "Device not found")
    ),
    tag = "Fleet"
))]
pub async fn get_device_handler(
    State(state): State<Arc<FleetState>>,
    Path(id): Path<String>,
) -> Result<Json<DeviceWithPresence>, FleetError> {
    let result: Result<_, FleetError> = async {
        let device_id = validation::device_id(&id)?;
        state.service.get_device(device_id).await
    }
    .await;

    result
        .map(Json)
        .inspect_err(|err| log_failure("Get device", err))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/device/{id}",
    params(("id" = String, Path, description = "Device id")),
    responses(
        (status = 200, description = "Device and its commands and logs removed", body = SuccessResponse),
        (status = 404, description = "Device not found")
    ),
    tag = "Fleet"
))]
pub async fn delete_device_handler(
    State(state): State<Arc<FleetState>>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, FleetError> {
    let result: Result<_, FleetError> = async {
        let device_id = validation::device_id(&id)?;
        state.service.delete_device(device_id).await?;
        info!("Deleted device {} with its commands and logs", device_id);
        Ok(SuccessResponse { success: true })
    }
    .await;

    result
        .map(Json)
        .inspect_err(|err| log_failure("Delete device", err))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/command",
    request_body = EnqueueCommandRequest,
    responses(
        (status = 200, description = "Command queued", body = EnqueueCommandResponse),
        (status = 400, description = "Invalid device id or command type"),
        (status = 404, description = "Device not found")
    ),
    tag = "Fleet"
))]
pub async fn enqueue_command_handler(
    State(state): State<Arc<FleetState>>,
    payload: Result<Json<EnqueueCommandRequest>, JsonRejection>,
) -> Result<Json<EnqueueCommandResponse>, FleetError> {
    let result: Result<_, FleetError> = async {
        let Json(payload) = payload?;
        let device_id = validation::device_id(&payload.device_id)?;
        let command_type = validation::command_type(&payload.command_type)?;
        let command_id = state
            .service
            .enqueue_command(device_id, command_type, &payload.command_data)
            .await?;
        info!(
            "Queued command {} ({}) for device {}",
            command_id, command_type, device_id
        );
        Ok(EnqueueCommandResponse { command_id })
    }
    .await;

    result
        .map(Json)
        .inspect_err(|err| log_failure("Enqueue command", err))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/device/{id}/commands",
    params(("id" = String, Path, description = "Device id")),
    responses(
        (status = 200, description = "Commands delivered by this poll, oldest first", body = Vec<PolledCommand>),
        (status = 404, description = "Device not found")
    ),
    tag = "Fleet"
))]
pub async fn poll_commands_handler(
    State(state): State<Arc<FleetState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<PolledCommand>>, FleetError> {
    let result: Result<_, FleetError> = async {
        let device_id = validation::device_id(&id)?;
        let commands = state.service.poll_commands(device_id).await?;
        if !commands.is_empty() {
            info!(
                "Delivered {} command(s) to device {}",
                commands.len(),
                device_id
            );
        }
        Ok(commands.into_iter().map(PolledCommand::from).collect())
    }
    .await;

    result
        .map(Json)
        .inspect_err(|err| log_failure("Poll commands", err))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/device/{id}/history",
    params(("id" = String, Path, description = "Device id")),
    responses(
        (status = 200, description = "Every command of the device in any status", body = Vec<Command>),
        (status = 404, description = "Device not found")
    ),
    tag = "Fleet"
))]
pub async fn command_history_handler(
    State(state): State<Arc<FleetState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Command>>, FleetError> {
    let result: Result<_, FleetError> = async {
        let device_id = validation::device_id(&id)?;
        state.service.command_history(device_id).await
    }
    .await;

    result
        .map(Json)
        .inspect_err(|err| log_failure("Command history", err))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/command/{id}",
    params(("id" = i64, Path, description = "Command id")),
    responses(
        (status = 200, description = "The command", body = Command),
        (status = 404, description = "Command not found")
    ),
    tag = "Fleet"
))]
pub async fn get_command_handler(
    State(state): State<Arc<FleetState>>,
    Path(command_id): Path<i64>,
) -> Result<Json<Command>, FleetError> {
    state
        .service
        .get_command(command_id)
        .await
        .map(Json)
        .inspect_err(|err| log_failure("Get command", err))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/command/{id}/execute",
    params(("id" = i64, Path, description = "Command id")),
    responses(
        (status = 200, description = "Command marked executed", body = SuccessResponse),
        (status = 404, description = "Command not found")
    ),
    tag = "Fleet"
))]
pub async fn acknowledge_command_handler(
    State(state): State<Arc<FleetState>>,
    Path(command_id): Path<i64>,
) -> Result<Json<SuccessResponse>, FleetError> {
    let result: Result<_, FleetError> = async {
        state.service.acknowledge_command(command_id).await?;
        info!("Command {} executed", command_id);
        Ok(SuccessResponse { success: true })
    }
    .await;

    result
        .map(Json)
        .inspect_err(|err| log_failure("Acknowledge command", err))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/device/{id}/logs",
    params(("id" = String, Path, description = "Device id")),
    request_body = AppendLogRequest,
    responses(
        (status = 200, description = "Log record stored", body = DeviceLog),
        (status = 400, description = "Invalid device id or kind"),
        (status = 404, description = "Device not found")
    ),
    tag = "Fleet"
))]
pub async fn append_log_handler(
    State(state): State<Arc<FleetState>>,
    Path(id): Path<String>,
    payload: Result<Json<AppendLogRequest>, JsonRejection>,
) -> Result<Json<DeviceLog>, FleetError> {
    let result: Result<_, FleetError> = async {
        let Json(payload) = payload?;
        let device_id = validation::device_id(&id)?;
        let kind = validation::log_kind(&payload.kind)?;
        state
            .service
            .append_log(device_id, kind, &payload.payload)
            .await
    }
    .await;

    result
        .map(Json)
        .inspect_err(|err| log_failure("Append log", err))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/device/{id}/logs",
    params(("id" = String, Path, description = "Device id")),
    responses(
        (status = 200, description = "Log records of the device, oldest first", body = Vec<DeviceLog>),
        (status = 404, description = "Device not found")
    ),
    tag = "Fleet"
))]
pub async fn list_logs_handler(
    State(state): State<Arc<FleetState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<DeviceLog>>, FleetError> {
    let result: Result<_, FleetError> = async {
        let device_id = validation::device_id(&id)?;
        state.service.list_logs(device_id).await
    }
    .await;

    result
        .map(Json)
        .inspect_err(|err| log_failure("List logs", err))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Database reachable", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    ),
    tag = "Fleet"
))]
pub async fn health_handler(State(state): State<Arc<FleetState>>) -> Response {
    if state.service.health().await {
        (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
            }),
        )
            .into_response()
    } else {
        error!("Health check failed: database unreachable");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unavailable".to_string(),
            }),
        )
            .into_response()
    }
}
