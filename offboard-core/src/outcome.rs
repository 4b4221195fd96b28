use std::time::Duration;

use serde::Serialize;

/// How a script invocation ended.
///
/// A process either exits with a code, is terminated by a signal, or never
/// starts. The enum makes the three cases mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Termination {
    /// The process exited on its own.
    Exited(i32),
    /// The process was killed by a signal (e.g. `"SIGTERM"` after a timeout).
    Signaled(String),
    /// The process could not be started.
    SpawnFailed(String),
}

/// The result of one script invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct ProcessOutcome {
    /// How the process ended.
    pub termination: Termination,
    /// Captured standard output, lossily decoded as UTF-8.
    pub stdout: String,
    /// Captured standard error, lossily decoded as UTF-8.
    pub stderr: String,
    /// Wall-clock time from invocation start to outcome.
    pub elapsed: Duration,
}

impl ProcessOutcome {
    /// Outcome of a process that exited with `code`.
    #[must_use]
    pub fn exited(code: i32, stdout: String, stderr: String, elapsed: Duration) -> Self {
        Self { termination: Termination::Exited(code), stdout, stderr, elapsed }
    }

    /// Outcome of a process terminated by `signal`.
    #[must_use]
    pub fn signaled(
        signal: impl Into<String>,
        stdout: String,
        stderr: String,
        elapsed: Duration,
    ) -> Self {
        Self { termination: Termination::Signaled(signal.into()), stdout, stderr, elapsed }
    }

    /// Outcome of a process that never started.
    #[must_use]
    pub fn spawn_failed(error: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            termination: Termination::SpawnFailed(error.into()),
            stdout: String::new(),
            stderr: String::new(),
            elapsed,
        }
    }

    /// The exit code, if the process exited on its own.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self.termination {
            Termination::Exited(code) => Some(code),
            _ => None,
        }
    }

    /// The terminating signal name, if the process was killed.
    #[must_use]
    pub fn signal(&self) -> Option<&str> {
        match &self.termination {
            Termination::Signaled(sig) => Some(sig),
            _ => None,
        }
    }

    /// The spawn error text, if the process never started.
    #[must_use]
    pub fn spawn_error(&self) -> Option<&str> {
        match &self.termination {
            Termination::SpawnFailed(err) => Some(err),
            _ => None,
        }
    }

    /// Elapsed wall-clock time in whole milliseconds, saturating.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }

    /// Parse stdout as a JSON object.
    ///
    /// Non-JSON output, or JSON that is not an object, yields an empty map.
    #[must_use]
    pub fn stdout_json(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::from_str::<serde_json::Value>(self.stdout.trim()) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }

    /// Trimmed stderr, or `None` when the script wrote nothing useful.
    #[must_use]
    pub fn stderr_message(&self) -> Option<&str> {
        let trimmed = self.stderr.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}
