//! Script invoker: the single entry point handlers use to run the script.
//!
//! The invoker:
//! 1. Builds the argument vector for the command
//! 2. Short-circuits to a synthetic outcome when a mock is requested
//! 3. Otherwise runs the script through the configured [`ScriptBackend`]
//!
//! # Cancel Safety
//! Cancel safe as long as the backend is; the process backend spawns with
//! `kill_on_drop`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use offboard_core::{MockDirective, ProcessOutcome};

use crate::backend::ScriptBackend;
use crate::command::ScriptCommand;
use crate::mock::synthetic_outcome;
use crate::ExecutorError;

/// Runs [`ScriptCommand`]s through a shared backend.
#[derive(Clone)]
pub struct ScriptInvoker {
    backend: Arc<dyn ScriptBackend>,
}

impl std::fmt::Debug for ScriptInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptInvoker").finish_non_exhaustive()
    }
}

impl ScriptInvoker {
    /// Create an invoker over the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn ScriptBackend>) -> Self {
        Self { backend }
    }

    /// Run `command`, waiting at most `timeout`.
    ///
    /// With a `mock` directive the backend is bypassed and the synthetic
    /// outcome for the requested exit code is returned instead.
    pub async fn invoke(
        &self,
        command: &ScriptCommand,
        timeout: Duration,
        mock: Option<MockDirective>,
    ) -> ProcessOutcome {
        if let Some(MockDirective { exit_code }) = mock {
            tracing::info!(action = command.action(), exit_code, "mock mode, script not spawned");
            let start = Instant::now();
            let mut outcome = synthetic_outcome(command, exit_code);
            outcome.elapsed = start.elapsed();
            return outcome;
        }
        self.backend.run(&command.argv(), timeout).await
    }

    /// Forward to the backend's readiness check.
    ///
    /// # Errors
    /// Propagates errors from [`ScriptBackend::health_check`].
    pub async fn health_check(&self) -> Result<(), ExecutorError> {
        self.backend.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct RecordingBackend {
        calls: Mutex<Vec<(Vec<String>, Duration)>>,
    }

    #[async_trait]
    impl ScriptBackend for RecordingBackend {
        async fn run(&self, argv: &[String], timeout: Duration) -> ProcessOutcome {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push((argv.to_vec(), timeout));
            }
            ProcessOutcome::exited(0, "{\"steps\":[\"A\"]}".to_owned(), String::new(), Duration::ZERO)
        }

        async fn health_check(&self) -> Result<(), ExecutorError> {
            Ok(())
        }
    }

    fn validate_command() -> ScriptCommand {
        ScriptCommand::Validate { employee_upn: "test@ii-us.com".to_owned() }
    }

    #[tokio::test]
    async fn invoke_passes_argv_and_timeout_to_backend() {
        let backend = Arc::new(RecordingBackend::default());
        let invoker = ScriptInvoker::new(backend.clone());
        let outcome = invoker.invoke(&validate_command(), Duration::from_secs(7), None).await;
        assert_eq!(outcome.exit_code(), Some(0));

        let calls = match backend.calls.lock() {
            Ok(c) => c.clone(),
            Err(e) => panic!("lock poisoned: {e}"),
        };
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, validate_command().argv());
        assert_eq!(calls[0].1, Duration::from_secs(7));
    }

    #[tokio::test]
    async fn mock_directive_bypasses_backend() {
        let backend = Arc::new(RecordingBackend::default());
        let invoker = ScriptInvoker::new(backend.clone());
        let outcome = invoker
            .invoke(&validate_command(), Duration::from_secs(7), Some(MockDirective { exit_code: 21 }))
            .await;
        assert_eq!(outcome.exit_code(), Some(21));

        let calls = match backend.calls.lock() {
            Ok(c) => c.len(),
            Err(e) => panic!("lock poisoned: {e}"),
        };
        assert_eq!(calls, 0, "mock mode must not reach the backend");
    }

    #[tokio::test]
    async fn mock_outcome_reports_measured_elapsed() {
        let invoker = ScriptInvoker::new(Arc::new(RecordingBackend::default()));
        let wall = Instant::now();
        let outcome = invoker
            .invoke(&validate_command(), Duration::from_secs(7), Some(MockDirective { exit_code: 0 }))
            .await;
        assert!(outcome.elapsed <= wall.elapsed(), "elapsed must be measured inside the call");
    }
}
