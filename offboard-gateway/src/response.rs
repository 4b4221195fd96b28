//! Response mapper: turns a [`ProcessOutcome`] into the HTTP contract.
//!
//! Classification goes through the [`ExitCodeTable`]; nothing here branches
//! on raw exit codes except the two `/validate` special cases (11 and 12).
//! Every function is total: unknown codes, signals and spawn failures all
//! produce a well-formed envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use offboard_core::exit_code::{GENERAL_ERROR_CODE, TIMEOUT_HTTP_STATUS};
use offboard_core::{Category, CorrelationId, ExitCodeEntry, ExitCodeTable, ProcessOutcome, Termination};
use serde::Serialize;
use serde_json::{Map, Value};

/// Exit code reported when the script was killed and never exited.
pub const SIGNALED_EXIT_CODE: i32 = -1;

/// Current time as RFC 3339 with millisecond precision.
#[must_use]
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(b: &bool) -> bool {
    !*b
}

/// Request fields echoed back in the envelope.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    pub execution_id: CorrelationId,
    pub employee_upn: &'a str,
    pub requester_upn: Option<&'a str>,
    pub ticket_id: Option<&'a str>,
    pub timeout_secs: u64,
    pub mock: bool,
}

/// Termination completed and the script reported the steps it ran.
#[derive(Debug, Clone, Serialize)]
pub struct SuccessEnvelope {
    pub success: bool,
    pub status: &'static str,
    pub exit_code: i32,
    pub employee_upn: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester_upn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    pub steps: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    pub execution_time_ms: u64,
    pub execution_id: CorrelationId,
    pub timestamp: String,
    #[serde(skip_serializing_if = "is_false")]
    pub mock: bool,
}

/// The account was already disabled; nothing changed.
#[derive(Debug, Clone, Serialize)]
pub struct IdempotentEnvelope {
    pub success: bool,
    pub idempotent: bool,
    pub status: &'static str,
    pub exit_code: i32,
    pub employee_upn: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    pub message: String,
    pub execution_time_ms: u64,
    pub execution_id: CorrelationId,
    pub timestamp: String,
    #[serde(skip_serializing_if = "is_false")]
    pub mock: bool,
}

/// Any failed invocation.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub status: &'static str,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
    pub exit_code: i32,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,
    pub employee_upn: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    pub execution_time_ms: u64,
    pub execution_id: CorrelationId,
    pub timestamp: String,
    #[serde(skip_serializing_if = "is_false")]
    pub mock: bool,
}

/// Account facts reported by `validate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeInfo {
    pub exists: bool,
    pub enabled: bool,
    pub protected: bool,
    #[serde(rename = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(rename = "protectedReason", skip_serializing_if = "Option::is_none")]
    pub protected_reason: Option<String>,
}

impl EmployeeInfo {
    /// Read account facts from script output. Accepts either a nested
    /// `employee` object or the fields at the top level.
    #[must_use]
    pub fn from_payload(payload: &Map<String, Value>) -> Self {
        let src = payload.get("employee").and_then(Value::as_object).unwrap_or(payload);
        let flag = |key: &str, default: bool| src.get(key).and_then(Value::as_bool).unwrap_or(default);
        let text = |key: &str| src.get(key).and_then(Value::as_str).map(str::to_owned);
        Self {
            exists: flag("exists", true),
            enabled: flag("enabled", true),
            protected: flag("protected", false),
            display_name: text("displayName"),
            department: text("department"),
            protected_reason: text("protectedReason"),
        }
    }
}

/// Body of a `/validate` response that did not fall through to the error
/// envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ValidateEnvelope {
    pub valid: bool,
    pub employee_upn: String,
    pub employee: EmployeeInfo,
    pub exit_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub execution_time_ms: u64,
    pub execution_id: CorrelationId,
    pub timestamp: String,
    #[serde(skip_serializing_if = "is_false")]
    pub mock: bool,
}

/// One of the response shapes.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    Success(SuccessEnvelope),
    Idempotent(IdempotentEnvelope),
    Error(ErrorEnvelope),
    Validate(ValidateEnvelope),
}

/// An envelope paired with the HTTP status it is sent with.
#[derive(Debug, Clone)]
pub struct MappedResponse {
    pub status: StatusCode,
    pub envelope: Envelope,
}

impl MappedResponse {
    fn new(status: u16, envelope: Envelope) -> Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self { status, envelope }
    }

    /// Exit code carried in the envelope.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match &self.envelope {
            Envelope::Success(e) => e.exit_code,
            Envelope::Idempotent(e) => e.exit_code,
            Envelope::Error(e) => e.exit_code,
            Envelope::Validate(e) => e.exit_code,
        }
    }
}

impl IntoResponse for MappedResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.envelope)).into_response()
    }
}

/// `status` string for an error category.
fn error_status(category: Category) -> &'static str {
    match category {
        Category::NotFound => "not_found",
        Category::Protected => "protected",
        Category::ConnectionFailed => "connection_failed",
        Category::OperationFailed => "operation_failed",
        _ => "error",
    }
}

/// Map a `/terminate` outcome.
#[must_use]
pub fn map_terminate(
    outcome: &ProcessOutcome,
    ctx: &RequestContext<'_>,
    table: &ExitCodeTable,
) -> MappedResponse {
    let code = match &outcome.termination {
        Termination::Exited(code) => *code,
        Termination::Signaled(signal) => return timeout_response(outcome, signal, ctx),
        Termination::SpawnFailed(err) => return spawn_failure_response(outcome, err, ctx),
        _ => return spawn_failure_response(outcome, "unknown termination", ctx),
    };

    let entry = table.classify(code);
    let payload = outcome.stdout_json();
    match entry.category {
        Category::Success => {
            let steps = payload
                .get("steps")
                .and_then(Value::as_array)
                .filter(|s| !s.is_empty())
                .cloned();
            let Some(steps) = steps else {
                return MappedResponse::new(
                    500,
                    Envelope::Error(ErrorEnvelope {
                        success: false,
                        status: "error",
                        error: "Script reported success but returned no completed steps".to_owned(),
                        error_details: Some(format!("exit code {code} with empty or missing steps")),
                        exit_code: GENERAL_ERROR_CODE,
                        retryable: false,
                        signal: None,
                        employee_upn: ctx.employee_upn.to_owned(),
                        ticket_id: ctx.ticket_id.map(str::to_owned),
                        execution_time_ms: outcome.elapsed_ms(),
                        execution_id: ctx.execution_id,
                        timestamp: now_rfc3339(),
                        mock: ctx.mock,
                    }),
                );
            };
            MappedResponse::new(
                entry.http_status,
                Envelope::Success(SuccessEnvelope {
                    success: true,
                    status: "success",
                    exit_code: code,
                    employee_upn: ctx.employee_upn.to_owned(),
                    requester_upn: ctx.requester_upn.map(str::to_owned),
                    ticket_id: ctx.ticket_id.map(str::to_owned),
                    steps,
                    completed_at: payload.get("completed_at").and_then(Value::as_str).map(str::to_owned),
                    execution_time_ms: outcome.elapsed_ms(),
                    execution_id: ctx.execution_id,
                    timestamp: now_rfc3339(),
                    mock: ctx.mock,
                }),
            )
        }
        Category::Idempotent => {
            let message = payload
                .get("message")
                .and_then(Value::as_str)
                .map_or_else(|| entry.description.to_owned(), str::to_owned);
            MappedResponse::new(
                entry.http_status,
                Envelope::Idempotent(IdempotentEnvelope {
                    success: true,
                    idempotent: true,
                    status: "already_disabled",
                    exit_code: code,
                    employee_upn: ctx.employee_upn.to_owned(),
                    ticket_id: ctx.ticket_id.map(str::to_owned),
                    message,
                    execution_time_ms: outcome.elapsed_ms(),
                    execution_id: ctx.execution_id,
                    timestamp: now_rfc3339(),
                    mock: ctx.mock,
                }),
            )
        }
        _ => error_response(outcome, &entry, ctx),
    }
}

/// Map a `/validate` outcome.
#[must_use]
pub fn map_validate(
    outcome: &ProcessOutcome,
    ctx: &RequestContext<'_>,
    table: &ExitCodeTable,
) -> MappedResponse {
    let code = match &outcome.termination {
        Termination::Exited(code) => *code,
        Termination::Signaled(signal) => return timeout_response(outcome, signal, ctx),
        Termination::SpawnFailed(err) => return spawn_failure_response(outcome, err, ctx),
        _ => return spawn_failure_response(outcome, "unknown termination", ctx),
    };

    let entry = table.classify(code);
    let payload = outcome.stdout_json();
    let mut employee = EmployeeInfo::from_payload(&payload);
    let (valid, warning, error) = match entry.category {
        Category::Success => (true, None, None),
        Category::Idempotent => {
            employee.enabled = false;
            (true, Some("Employee account is already disabled".to_owned()), None)
        }
        Category::Protected => {
            employee.protected = true;
            let error = outcome.stderr_message().unwrap_or(entry.description).to_owned();
            if employee.protected_reason.is_none() {
                employee.protected_reason = outcome.stderr_message().map(str::to_owned);
            }
            (false, None, Some(error))
        }
        _ => return error_response(outcome, &entry, ctx),
    };

    MappedResponse::new(
        entry.http_status,
        Envelope::Validate(ValidateEnvelope {
            valid,
            employee_upn: ctx.employee_upn.to_owned(),
            employee,
            exit_code: code,
            warning,
            error,
            execution_time_ms: outcome.elapsed_ms(),
            execution_id: ctx.execution_id,
            timestamp: now_rfc3339(),
            mock: ctx.mock,
        }),
    )
}

fn error_response(
    outcome: &ProcessOutcome,
    entry: &ExitCodeEntry,
    ctx: &RequestContext<'_>,
) -> MappedResponse {
    let (error, error_details) = match outcome.stderr_message() {
        Some(stderr) => (stderr.to_owned(), Some(entry.description.to_owned())),
        None => (entry.description.to_owned(), None),
    };
    MappedResponse::new(
        entry.http_status,
        Envelope::Error(ErrorEnvelope {
            success: false,
            status: error_status(entry.category),
            error,
            error_details,
            exit_code: entry.code,
            retryable: entry.retryable,
            signal: None,
            employee_upn: ctx.employee_upn.to_owned(),
            ticket_id: ctx.ticket_id.map(str::to_owned),
            execution_time_ms: outcome.elapsed_ms(),
            execution_id: ctx.execution_id,
            timestamp: now_rfc3339(),
            mock: ctx.mock,
        }),
    )
}

fn timeout_response(outcome: &ProcessOutcome, signal: &str, ctx: &RequestContext<'_>) -> MappedResponse {
    let error = if signal == offboard_executor::process::TIMEOUT_SIGNAL {
        format!("Script execution timeout after {}s (terminated by {signal})", ctx.timeout_secs)
    } else {
        format!("Script execution timeout: process killed by {signal}")
    };
    MappedResponse::new(
        TIMEOUT_HTTP_STATUS,
        Envelope::Error(ErrorEnvelope {
            success: false,
            status: "timeout",
            error,
            error_details: outcome.stderr_message().map(str::to_owned),
            exit_code: SIGNALED_EXIT_CODE,
            retryable: false,
            signal: Some(signal.to_owned()),
            employee_upn: ctx.employee_upn.to_owned(),
            ticket_id: ctx.ticket_id.map(str::to_owned),
            execution_time_ms: outcome.elapsed_ms(),
            execution_id: ctx.execution_id,
            timestamp: now_rfc3339(),
            mock: ctx.mock,
        }),
    )
}

fn spawn_failure_response(outcome: &ProcessOutcome, err: &str, ctx: &RequestContext<'_>) -> MappedResponse {
    MappedResponse::new(
        500,
        Envelope::Error(ErrorEnvelope {
            success: false,
            status: "error",
            error: "Failed to start offboarding script".to_owned(),
            error_details: Some(err.to_owned()),
            exit_code: GENERAL_ERROR_CODE,
            retryable: false,
            signal: None,
            employee_upn: ctx.employee_upn.to_owned(),
            ticket_id: ctx.ticket_id.map(str::to_owned),
            execution_time_ms: outcome.elapsed_ms(),
            execution_id: ctx.execution_id,
            timestamp: now_rfc3339(),
            mock: ctx.mock,
        }),
    )
}
