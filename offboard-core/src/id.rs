use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Identifier attached to every log line and response of a single request.
///
/// Unique for the lifetime of the process. Rendered as `req-<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct CorrelationId(pub u64);

impl CorrelationId {
    /// Returns the inner sequence number.
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{:06}", self.0)
    }
}

impl From<CorrelationId> for String {
    fn from(id: CorrelationId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for CorrelationId {
    type Error = std::num::ParseIntError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.strip_prefix("req-").unwrap_or(&s).parse().map(Self)
    }
}

/// Monotonic source of [`CorrelationId`]s.
///
/// One instance is created at startup and shared by every request handler.
#[derive(Debug, Default)]
pub struct CorrelationCounter {
    next: AtomicU64,
}

impl CorrelationCounter {
    /// Create a counter whose first id is `1`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id.
    pub fn next_id(&self) -> CorrelationId {
        CorrelationId(self.next.fetch_add(1, Ordering::Relaxed) + 1)
    }
}
