// --- File: crates/fleetlink_common/src/http.rs ---
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::{FleetError, HttpStatusCode};

/// Extension trait for FleetError to convert it to an Axum HTTP response.
pub trait IntoHttpResponse {
    /// Converts the error into an Axum HTTP response.
    fn into_http_response(self) -> Response;
}

impl IntoHttpResponse for FleetError {
    fn into_http_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "code": status_code.as_u16(),
            }
        }));

        (status_code, body).into_response()
    }
}

/// Implement IntoResponse for FleetError so handlers can return `Result<_, FleetError>`.
impl IntoResponse for FleetError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}

/// A request body that is not valid JSON for the expected shape is a
/// validation failure, answered with 400 and the usual error body.
impl From<JsonRejection> for FleetError {
    fn from(rejection: JsonRejection) -> Self {
        FleetError::ValidationError(rejection.body_text())
    }
}
