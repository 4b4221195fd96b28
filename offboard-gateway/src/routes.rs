//! Axum route handlers for the offboard agent API.

use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Extension, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use offboard_core::request::DEFAULT_TIMEOUT_SECS;
use offboard_core::{CorrelationId, TerminateRequest, ValidateRequest};
use offboard_executor::ScriptCommand;
use serde_json::Value;
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::{
    error::GatewayError,
    middleware::{cors_layer, correlate, make_span},
    response::{map_terminate, map_validate, now_rfc3339, MappedResponse, RequestContext},
    state::SharedState,
};

// ── Router ────────────────────────────────────────────────────────────────────

/// Build the application router over the given state.
pub fn create_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.allowed_origin);
    Router::new()
        .route("/health", get(health).fallback(method_not_allowed))
        .route("/validate", post(validate).fallback(method_not_allowed))
        .route("/terminate", post(terminate).fallback(method_not_allowed))
        .fallback(not_found)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(make_span)
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(middleware::from_fn_with_state(state.clone(), correlate))
        .with_state(state)
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// `GET /health`: liveness probe. Never touches the script.
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": now_rfc3339(),
        })),
    )
}

/// `POST /validate`: check that an account exists and may be terminated.
///
/// # Errors
/// Returns [`GatewayError::InvalidJson`] or [`GatewayError::Validation`] for
/// a bad body. Script failures are not errors here; they are mapped into
/// the response envelope.
pub async fn validate(
    State(state): State<SharedState>,
    Extension(execution_id): Extension<CorrelationId>,
    body: Bytes,
) -> Result<MappedResponse, GatewayError> {
    let json = parse_body(&body)?;
    let request = ValidateRequest::from_json(&json).inspect_err(|e| {
        tracing::warn!(correlation_id = %execution_id, error = %e, "validate request rejected");
    })?;

    tracing::info!(
        correlation_id = %execution_id,
        employee_upn = %request.employee_upn,
        "validating employee"
    );

    let command = ScriptCommand::from(&request);
    let outcome = state
        .invoker
        .invoke(&command, Duration::from_secs(DEFAULT_TIMEOUT_SECS), None)
        .await;

    let ctx = RequestContext {
        execution_id,
        employee_upn: &request.employee_upn,
        requester_upn: None,
        ticket_id: None,
        timeout_secs: DEFAULT_TIMEOUT_SECS,
        mock: false,
    };
    let mapped = map_validate(&outcome, &ctx, state.table);
    log_mapped(execution_id, &mapped, outcome.elapsed_ms());
    Ok(mapped)
}

/// `POST /terminate`: deprovision an account.
///
/// # Errors
/// Returns [`GatewayError::InvalidJson`] or [`GatewayError::Validation`] for
/// a bad body, and [`GatewayError::MockDisabled`] for a mock request when
/// mock mode is off.
pub async fn terminate(
    State(state): State<SharedState>,
    Extension(execution_id): Extension<CorrelationId>,
    body: Bytes,
) -> Result<MappedResponse, GatewayError> {
    let json = parse_body(&body)?;
    let request = TerminateRequest::from_json(&json).inspect_err(|e| {
        tracing::warn!(correlation_id = %execution_id, error = %e, "terminate request rejected");
    })?;

    if request.mock.is_some() && !state.allow_mock {
        tracing::warn!(correlation_id = %execution_id, "mock request refused");
        return Err(GatewayError::MockDisabled);
    }

    tracing::info!(
        correlation_id = %execution_id,
        employee_upn = %request.employee_upn,
        requester_upn = %request.requester_upn,
        ticket_id = %request.ticket_id,
        skip_approval = request.skip_approval,
        timeout_secs = request.timeout_secs,
        mock = request.mock.is_some(),
        "terminating employee"
    );

    let command = ScriptCommand::from(&request);
    let outcome = state
        .invoker
        .invoke(&command, Duration::from_secs(request.timeout_secs), request.mock)
        .await;

    let ctx = RequestContext {
        execution_id,
        employee_upn: &request.employee_upn,
        requester_upn: Some(&request.requester_upn),
        ticket_id: Some(&request.ticket_id),
        timeout_secs: request.timeout_secs,
        mock: request.mock.is_some(),
    };
    let mapped = map_terminate(&outcome, &ctx, state.table);
    log_mapped(execution_id, &mapped, outcome.elapsed_ms());
    Ok(mapped)
}

async fn not_found() -> GatewayError {
    GatewayError::NotFound
}

async fn method_not_allowed() -> GatewayError {
    GatewayError::MethodNotAllowed
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Parse a POST body. An empty body is treated as `{}` so the validator can
/// name the missing fields.
fn parse_body(body: &[u8]) -> Result<Value, GatewayError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_slice(body).map_err(|_| GatewayError::InvalidJson)
}

fn log_mapped(execution_id: CorrelationId, mapped: &MappedResponse, elapsed_ms: u64) {
    let status = mapped.status.as_u16();
    let exit_code = mapped.exit_code();
    if mapped.status.is_success() {
        tracing::info!(correlation_id = %execution_id, status, exit_code, elapsed_ms, "request completed");
    } else {
        tracing::warn!(correlation_id = %execution_id, status, exit_code, elapsed_ms, "request failed");
    }
}
