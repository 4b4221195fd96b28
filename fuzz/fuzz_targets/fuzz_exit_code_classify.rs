//! Fuzz target: exit-code classification is total.

#![no_main]

use libfuzzer_sys::fuzz_target;
use offboard_core::{Category, ExitCodeTable};

fuzz_target!(|code: i32| {
    let entry = ExitCodeTable::standard().classify(code);
    assert_eq!(entry.code, code);
    assert_eq!(entry.retryable, entry.category == Category::ConnectionFailed);
    assert!(matches!(entry.http_status, 200 | 403 | 404 | 500 | 503));
});
