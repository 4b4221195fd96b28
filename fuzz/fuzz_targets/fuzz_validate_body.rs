//! Fuzz target: `/validate` body parsing and validation.
//!
//! Any accepted UPN must be free of shell metacharacters.

#![no_main]

use libfuzzer_sys::fuzz_target;
use offboard_core::validation::contains_unsafe_chars;
use offboard_core::ValidateRequest;

fuzz_target!(|data: &[u8]| {
    let Ok(body) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    if let Ok(request) = ValidateRequest::from_json(&body) {
        assert!(!contains_unsafe_chars(&request.employee_upn));
    }
});
