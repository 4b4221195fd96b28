//! Error types for the executor crate.

use std::path::PathBuf;

/// Errors raised while configuring or checking the script backend.
///
/// Script runs themselves never fail with this type: a run that cannot start
/// is reported as a spawn failure inside
/// [`ProcessOutcome`](offboard_core::ProcessOutcome).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ExecutorError {
    /// Script file not found at the configured path.
    #[error("script not found at {path}")]
    ScriptNotFound { path: PathBuf },

    /// Interpreter binary not found at the given path or in `PATH`.
    #[error("interpreter not found: {path}")]
    InterpreterNotFound { path: PathBuf },

    /// A configuration value could not be parsed.
    #[error("invalid value for {key}: {reason}")]
    InvalidConfig { key: &'static str, reason: String },
}
