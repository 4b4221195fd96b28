//! Script backend abstraction trait.
//!
//! Separates argument construction and mock handling from the mechanics of
//! running a child process, so handlers can be tested without spawning.

use std::time::Duration;

use async_trait::async_trait;
use offboard_core::ProcessOutcome;

use crate::ExecutorError;

/// Runs the offboarding script with a literal argument vector.
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Cancel Safety
/// Dropping a `run` future must not leak a running child process.
#[async_trait]
pub trait ScriptBackend: Send + Sync {
    /// Run the script with `argv` and wait at most `timeout` for it to exit.
    ///
    /// Never fails: spawn failures and timeouts are encoded in the returned
    /// [`ProcessOutcome`].
    async fn run(&self, argv: &[String], timeout: Duration) -> ProcessOutcome;

    /// Check that the script and its interpreter are present.
    ///
    /// # Errors
    /// Returns [`ExecutorError::ScriptNotFound`] or
    /// [`ExecutorError::InterpreterNotFound`] if the environment is not ready.
    async fn health_check(&self) -> Result<(), ExecutorError>;
}
