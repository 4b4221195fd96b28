//! Exit-code classification table for the offboarding script.
//!
//! The script reports its outcome through its process exit code. This module
//! holds the immutable mapping from exit code to HTTP status, category and
//! retryability. It is built once on first use and shared read-only for the
//! rest of the process lifetime.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// Outcome category of a script run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Category {
    /// All requested steps were performed.
    Success,
    /// The account was already in the target state.
    Idempotent,
    /// The account does not exist in the directory.
    NotFound,
    /// The account is excluded from termination by policy.
    Protected,
    /// A directory, mailbox or identity service could not be reached.
    ConnectionFailed,
    /// A deprovisioning step failed after connecting.
    OperationFailed,
    /// Anything else, including unrecognized exit codes.
    GeneralError,
}

impl Category {
    /// Returns the snake-case name used in response bodies.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Idempotent => "idempotent",
            Self::NotFound => "not_found",
            Self::Protected => "protected",
            Self::ConnectionFailed => "connection_failed",
            Self::OperationFailed => "operation_failed",
            Self::GeneralError => "general_error",
        }
    }

    /// Returns `true` for categories that produce a 2xx response.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success | Self::Idempotent)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the exit-code table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct ExitCodeEntry {
    /// Process exit code.
    pub code: i32,
    /// HTTP status returned for this code.
    pub http_status: u16,
    /// Outcome category.
    pub category: Category,
    /// Whether a caller may resend the same request later.
    pub retryable: bool,
    /// Human-readable description, used when the script wrote nothing to stderr.
    pub description: &'static str,
}

impl ExitCodeEntry {
    const fn new(
        code: i32,
        http_status: u16,
        category: Category,
        retryable: bool,
        description: &'static str,
    ) -> Self {
        Self { code, http_status, category, retryable, description }
    }
}

/// Exit code used for general script errors and spawn failures.
pub const GENERAL_ERROR_CODE: i32 = 1;

/// HTTP status for a script killed by signal (timeout).
pub const TIMEOUT_HTTP_STATUS: u16 = 504;

const STANDARD_ENTRIES: &[ExitCodeEntry] = &[
    ExitCodeEntry::new(0, 200, Category::Success, false, "Employee terminated successfully"),
    ExitCodeEntry::new(1, 500, Category::GeneralError, false, "General error"),
    ExitCodeEntry::new(10, 404, Category::NotFound, false, "Employee not found in Active Directory"),
    ExitCodeEntry::new(11, 200, Category::Idempotent, false, "Employee already disabled"),
    ExitCodeEntry::new(12, 403, Category::Protected, false, "Account is protected and cannot be terminated"),
    ExitCodeEntry::new(20, 503, Category::ConnectionFailed, true, "Failed to connect to Microsoft Graph"),
    ExitCodeEntry::new(21, 503, Category::ConnectionFailed, true, "Failed to connect to Exchange Online"),
    ExitCodeEntry::new(22, 503, Category::ConnectionFailed, true, "Failed to connect to Active Directory"),
    ExitCodeEntry::new(30, 500, Category::OperationFailed, false, "License removal failed"),
    ExitCodeEntry::new(31, 500, Category::OperationFailed, false, "Mailbox conversion failed"),
    ExitCodeEntry::new(32, 500, Category::OperationFailed, false, "AD account disable failed"),
    ExitCodeEntry::new(33, 500, Category::OperationFailed, false, "OU move failed"),
    ExitCodeEntry::new(40, 500, Category::OperationFailed, false, "AD Sync trigger failed"),
];

static STANDARD_TABLE: LazyLock<ExitCodeTable> =
    LazyLock::new(|| ExitCodeTable::from_entries(STANDARD_ENTRIES));

/// Immutable exit code → [`ExitCodeEntry`] mapping.
#[derive(Debug, Clone)]
pub struct ExitCodeTable {
    entries: BTreeMap<i32, ExitCodeEntry>,
}

impl ExitCodeTable {
    /// Build a table from a list of rows. Later rows replace earlier ones with
    /// the same code.
    #[must_use]
    pub fn from_entries(rows: &[ExitCodeEntry]) -> Self {
        Self { entries: rows.iter().map(|e| (e.code, *e)).collect() }
    }

    /// The process-wide table, initialized on first access.
    #[must_use]
    pub fn standard() -> &'static Self {
        &STANDARD_TABLE
    }

    /// Look up a known exit code.
    #[must_use]
    pub fn get(&self, code: i32) -> Option<&ExitCodeEntry> {
        self.entries.get(&code)
    }

    /// Classify any exit code. Total: unknown codes degrade to a general
    /// error (HTTP 500, not retryable) that keeps the raw code.
    #[must_use]
    pub fn classify(&self, code: i32) -> ExitCodeEntry {
        self.get(code).copied().unwrap_or(ExitCodeEntry {
            code,
            http_status: 500,
            category: Category::GeneralError,
            retryable: false,
            description: "Unknown error",
        })
    }

    /// Iterate over every known row in ascending code order.
    pub fn iter(&self) -> impl Iterator<Item = &ExitCodeEntry> {
        self.entries.values()
    }

    /// Number of known codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
