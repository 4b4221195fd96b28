//! Error types for the gateway crate.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use offboard_core::ValidationError;
use serde_json::json;

/// Errors that end a request before the script is invoked, plus startup
/// configuration failures.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// An error propagated from the executor layer.
    #[error("executor error: {0}")]
    Executor(#[from] offboard_executor::ExecutorError),

    /// The request body could not be parsed as JSON.
    #[error("Invalid JSON")]
    InvalidJson,

    /// The request body failed schema validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// A mock request arrived while mock mode is disabled.
    #[error("mock mode is disabled on this agent")]
    MockDisabled,

    /// No route matches the request path.
    #[error("Not found")]
    NotFound,

    /// The path exists but not for this method.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// An environment variable holds an unusable value.
    #[error("invalid configuration {key}: {reason}")]
    InvalidConfig {
        /// Variable name.
        key: &'static str,
        /// What was wrong with it.
        reason: String,
    },
}

impl GatewayError {
    /// HTTP status this error is reported with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::InvalidJson
            | GatewayError::Validation(_)
            | GatewayError::MockDisabled => StatusCode::BAD_REQUEST,
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::Executor(_) | GatewayError::InvalidConfig { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let timestamp = crate::response::now_rfc3339();
        let body = match &self {
            GatewayError::Validation(e) => json!({
                "error": self.to_string(),
                "field": e.field(),
                "rule": e.rule(),
                "timestamp": timestamp,
            }),
            _ => json!({"error": self.to_string(), "timestamp": timestamp}),
        };
        (status, Json(body)).into_response()
    }
}
