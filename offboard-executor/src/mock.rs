//! Synthetic outcomes for orchestrator integration tests.
//!
//! When a request carries `mock: true` the script is never spawned; the
//! outcome below stands in for it.

use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use offboard_core::ProcessOutcome;
use serde_json::json;

use crate::command::ScriptCommand;

/// Steps reported by a mocked successful termination.
pub const MOCK_STEPS: &[&str] = &[
    "Connected to Microsoft Graph",
    "Connected to Exchange Online",
    "Licenses removed",
    "Mailbox converted to shared",
    "AD account disabled",
    "User moved to Disabled Users OU",
    "AD Sync triggered",
];

/// Build the outcome the script would have produced for `exit_code`.
///
/// `elapsed` is left at zero; [`ScriptInvoker`](crate::ScriptInvoker) stamps
/// the measured time.
#[must_use]
pub fn synthetic_outcome(command: &ScriptCommand, exit_code: u8) -> ProcessOutcome {
    let stdout = match exit_code {
        0 => json!({
            "success": true,
            "employee_upn": command.employee_upn(),
            "steps": MOCK_STEPS,
            "completed_at": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        })
        .to_string(),
        11 => json!({
            "message": "Employee already disabled",
            "idempotent": true,
        })
        .to_string(),
        _ => String::new(),
    };
    ProcessOutcome::exited(i32::from(exit_code), stdout, String::new(), Duration::ZERO)
}
