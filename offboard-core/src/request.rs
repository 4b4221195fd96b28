//! Typed request bodies for `/validate` and `/terminate`.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::error::ValidationError;
use crate::validation::{FieldSpec, Schema, TextRule};

/// Maximum length of a User Principal Name.
pub const MAX_UPN_LEN: usize = 320;

/// Maximum length of a ticket identifier.
pub const MAX_TICKET_LEN: usize = 50;

/// Script timeout used when the request does not set one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Largest timeout a caller may request.
pub const MAX_TIMEOUT_SECS: u64 = 3600;

/// Schema of the `/validate` body.
pub const VALIDATE_SCHEMA: Schema = Schema {
    fields: &[FieldSpec::required_text("employee_upn", MAX_UPN_LEN, TextRule::Upn)],
};

/// Schema of the `/terminate` body.
#[allow(clippy::cast_possible_wrap)]
pub const TERMINATE_SCHEMA: Schema = Schema {
    fields: &[
        FieldSpec::required_text("employee_upn", MAX_UPN_LEN, TextRule::Upn),
        FieldSpec::required_text("requester_upn", MAX_UPN_LEN, TextRule::Upn),
        FieldSpec::required_text("ticket_id", MAX_TICKET_LEN, TextRule::TicketId),
        FieldSpec::optional_text("termination_date", TextRule::IsoDate),
        FieldSpec::optional_bool("skip_approval", false),
        FieldSpec::optional_bool("mock", false),
        FieldSpec::optional_int("mock_exit_code", 0, 255, 0),
        FieldSpec::optional_int("timeout", 1, MAX_TIMEOUT_SECS as i64, DEFAULT_TIMEOUT_SECS as i64),
    ],
};

/// Body of `POST /validate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct ValidateRequest {
    /// Account to look up.
    pub employee_upn: String,
}

impl ValidateRequest {
    /// Validate a raw JSON body and build the typed request.
    ///
    /// # Errors
    /// Returns the first [`ValidationError`] reported by [`VALIDATE_SCHEMA`].
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let v = VALIDATE_SCHEMA.validate(body)?;
        Ok(Self { employee_upn: v.required_text("employee_upn")? })
    }
}

/// Synthetic outcome requested by the orchestrator for integration tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MockDirective {
    /// Exit code the invoker must pretend the script returned.
    pub exit_code: u8,
}

/// Body of `POST /terminate`, normalized with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct TerminateRequest {
    /// Account to deprovision.
    pub employee_upn: String,
    /// Person who asked for the termination, for the audit trail.
    pub requester_upn: String,
    /// Ticket that authorizes the termination (e.g. `HR-1234`).
    pub ticket_id: String,
    /// Effective date, if not immediate.
    pub termination_date: Option<NaiveDate>,
    /// Forwarded to the script; approval gating happens upstream.
    pub skip_approval: bool,
    /// Script timeout in seconds, in `[1, 3600]`.
    pub timeout_secs: u64,
    /// Set when the caller asked for a synthetic outcome.
    pub mock: Option<MockDirective>,
}

impl TerminateRequest {
    /// Validate a raw JSON body and build the typed request.
    ///
    /// # Errors
    /// Returns the first [`ValidationError`] reported by [`TERMINATE_SCHEMA`].
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let v = TERMINATE_SCHEMA.validate(body)?;

        let termination_date = match v.text("termination_date") {
            Some(s) => Some(NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
                ValidationError::Format {
                    field: "termination_date",
                    format: "ISO-8601 date (YYYY-MM-DD)",
                }
            })?),
            None => None,
        };

        let timeout_secs = v
            .integer("timeout")
            .and_then(|t| u64::try_from(t).ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let mock = v.flag("mock").then(|| MockDirective {
            exit_code: v
                .integer("mock_exit_code")
                .and_then(|c| u8::try_from(c).ok())
                .unwrap_or(0),
        });

        Ok(Self {
            employee_upn: v.required_text("employee_upn")?,
            requester_upn: v.required_text("requester_upn")?,
            ticket_id: v.required_text("ticket_id")?,
            termination_date,
            skip_approval: v.flag("skip_approval"),
            timeout_secs,
            mock,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn terminate(body: &Value) -> TerminateRequest {
        match TerminateRequest::from_json(body) {
            Ok(r) => r,
            Err(e) => panic!("unexpected validation error: {e}"),
        }
    }

    #[test]
    fn validate_request_accepts_plus_and_subdomain() {
        for upn in ["test@ii-us.com", "test@mail.ii-us.com", "test+tag@ii-us.com"] {
            assert!(ValidateRequest::from_json(&json!({"employee_upn": upn})).is_ok(), "{upn}");
        }
    }

    #[test]
    fn validate_request_rejects_extra_fields() {
        let err = ValidateRequest::from_json(&json!({
            "employee_upn": "test@ii-us.com",
            "extra_field": "not allowed"
        }))
        .err();
        assert!(matches!(err, Some(ValidationError::AdditionalProperty { .. })));
    }

    #[test]
    fn validate_request_missing_upn_names_field() {
        let err = ValidateRequest::from_json(&json!({})).err();
        let msg = err.map(|e| e.to_string()).unwrap_or_default();
        assert_eq!(msg, "employee_upn is required");
    }

    #[test]
    fn terminate_defaults_are_applied() {
        let req = terminate(&json!({
            "employee_upn": "test@x.com",
            "requester_upn": "admin@x.com",
            "ticket_id": "HR-1"
        }));
        assert_eq!(req.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(!req.skip_approval);
        assert!(req.mock.is_none());
        assert!(req.termination_date.is_none());
    }

    #[test]
    fn terminate_accepts_all_optional_fields() {
        let req = terminate(&json!({
            "employee_upn": "test@ii-us.com",
            "requester_upn": "admin@ii-us.com",
            "ticket_id": "HR-1234",
            "termination_date": "2024-01-15",
            "skip_approval": true,
            "mock": true,
            "mock_exit_code": 21,
            "timeout": 600
        }));
        assert_eq!(req.timeout_secs, 600);
        assert!(req.skip_approval);
        assert_eq!(req.mock, Some(MockDirective { exit_code: 21 }));
        assert_eq!(req.termination_date, NaiveDate::from_ymd_opt(2024, 1, 15));
    }

    #[test]
    fn mock_exit_code_without_mock_flag_is_ignored() {
        let req = terminate(&json!({
            "employee_upn": "test@ii-us.com",
            "requester_upn": "admin@ii-us.com",
            "ticket_id": "HR-1234",
            "mock_exit_code": 12
        }));
        assert!(req.mock.is_none());
    }

    #[test]
    fn mock_exit_code_out_of_range_is_rejected() {
        let err = TerminateRequest::from_json(&json!({
            "employee_upn": "test@ii-us.com",
            "requester_upn": "admin@ii-us.com",
            "ticket_id": "HR-1234",
            "mock": true,
            "mock_exit_code": 256
        }))
        .err();
        assert!(matches!(err, Some(ValidationError::Range { field: "mock_exit_code", .. })));
    }

    #[test]
    fn terminate_missing_fields_are_named() {
        let cases = [
            (json!({"requester_upn": "admin@ii-us.com", "ticket_id": "TEST-001"}), "employee_upn"),
            (json!({"employee_upn": "test@ii-us.com", "ticket_id": "TEST-001"}), "requester_upn"),
            (json!({"employee_upn": "test@ii-us.com", "requester_upn": "admin@ii-us.com"}), "ticket_id"),
        ];
        for (body, field) in cases {
            let err = TerminateRequest::from_json(&body).err();
            assert_eq!(err, Some(ValidationError::Required { field }), "missing {field}");
        }
    }

    #[test]
    fn script_tags_in_upn_are_rejected() {
        let err = TerminateRequest::from_json(&json!({
            "employee_upn": "<script>alert(1)</script>@ii-us.com",
            "requester_upn": "admin@ii-us.com",
            "ticket_id": "HR-1234"
        }))
        .err();
        assert_eq!(err, Some(ValidationError::UnsafeCharacters { field: "employee_upn" }));
    }

    #[test]
    fn metacharacters_in_termination_date_are_unsafe_not_format() {
        let err = TerminateRequest::from_json(&json!({
            "employee_upn": "test@ii-us.com",
            "requester_upn": "admin@ii-us.com",
            "ticket_id": "HR-1234",
            "termination_date": "2024-01-15;rm -rf /"
        }))
        .err();
        assert_eq!(err, Some(ValidationError::UnsafeCharacters { field: "termination_date" }));
    }

    #[test]
    fn malformed_clean_termination_date_is_format_error() {
        let err = TerminateRequest::from_json(&json!({
            "employee_upn": "test@ii-us.com",
            "requester_upn": "admin@ii-us.com",
            "ticket_id": "HR-1234",
            "termination_date": "2024-02-30"
        }))
        .err();
        assert!(matches!(err, Some(ValidationError::Format { field: "termination_date", .. })));
    }
}
