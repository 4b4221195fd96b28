//! Fuzz target: `/terminate` body parsing and validation.
//!
//! Accepted requests must respect the documented bounds.

#![no_main]

use libfuzzer_sys::fuzz_target;
use offboard_core::request::{MAX_TICKET_LEN, MAX_TIMEOUT_SECS, MAX_UPN_LEN};
use offboard_core::validation::contains_unsafe_chars;
use offboard_core::TerminateRequest;

fuzz_target!(|data: &[u8]| {
    let Ok(body) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    if let Ok(request) = TerminateRequest::from_json(&body) {
        for field in [&request.employee_upn, &request.requester_upn, &request.ticket_id] {
            assert!(!contains_unsafe_chars(field));
        }
        assert!(request.employee_upn.len() <= MAX_UPN_LEN);
        assert!(request.ticket_id.len() <= MAX_TICKET_LEN);
        assert!((1..=MAX_TIMEOUT_SECS).contains(&request.timeout_secs));
    }
});
