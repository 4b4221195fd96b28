//! Shared per-process state handed to every handler.

use std::sync::Arc;

use offboard_core::{CorrelationCounter, ExitCodeTable};
use offboard_executor::{ProcessBackend, ScriptBackend, ScriptInvoker};

use crate::config::AgentConfig;

/// Read-mostly state shared by all requests.
///
/// The correlation counter is the only field that changes after startup.
#[derive(Debug)]
pub struct AppState {
    /// Runs the offboarding script.
    pub invoker: ScriptInvoker,
    /// Source of per-request correlation ids.
    pub counter: CorrelationCounter,
    /// Exit-code classification consulted by the response mapper.
    pub table: &'static ExitCodeTable,
    /// `Access-Control-Allow-Origin` value.
    pub allowed_origin: String,
    /// Whether `mock: true` requests are honoured.
    pub allow_mock: bool,
}

/// Handle stored in the router.
pub type SharedState = Arc<AppState>;

impl AppState {
    /// State for the real agent: a process backend built from `config`.
    #[must_use]
    pub fn from_config(config: &AgentConfig) -> Self {
        let backend = Arc::new(ProcessBackend::new(config.script.clone()));
        let mut state = Self::with_backend(backend);
        state.allowed_origin.clone_from(&config.allowed_origin);
        state.allow_mock = config.allow_mock;
        state
    }

    /// State over an arbitrary backend with default CORS and mock settings.
    #[must_use]
    pub fn with_backend(backend: Arc<dyn ScriptBackend>) -> Self {
        Self {
            invoker: ScriptInvoker::new(backend),
            counter: CorrelationCounter::new(),
            table: ExitCodeTable::standard(),
            allowed_origin: "*".to_owned(),
            allow_mock: true,
        }
    }
}
