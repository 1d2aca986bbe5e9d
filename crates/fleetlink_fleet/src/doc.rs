use utoipa::OpenApi;

use crate::handlers::{
    AppendLogRequest, EnqueueCommandRequest, EnqueueCommandResponse, HealthResponse,
    RegisterRequest, SuccessResponse,
};
use fleetlink_common::{
    Command, CommandStatus, Device, DeviceAttributes, DeviceLog, DeviceWithPresence,
    PolledCommand,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::register_handler,
        crate::handlers::list_devices_handler,
        crate::handlers::get_device_handler,
        crate::handlers::delete_device_handler,
        crate::handlers::enqueue_command_handler,
        crate::handlers::poll_commands_handler,
        crate::handlers::command_history_handler,
        crate::handlers::get_command_handler,
        crate::handlers::acknowledge_command_handler,
        crate::handlers::append_log_handler,
        crate::handlers::list_logs_handler,
        crate::handlers::health_handler,
    ),
    components(
        schemas(
            RegisterRequest,
            EnqueueCommandRequest,
            EnqueueCommandResponse,
            AppendLogRequest,
            SuccessResponse,
            HealthResponse,
            Device,
            DeviceAttributes,
            DeviceWithPresence,
            Command,
            CommandStatus,
            PolledCommand,
            DeviceLog,
        )
    ),
    tags(
        (name = "Fleet", description = "Device registry and command queue API")
    ),
    servers(
        (url = "/api", description = "Fleetlink API server")
    )
)]
pub struct FleetApiDoc;
