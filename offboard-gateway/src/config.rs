//! Agent configuration, read once from the environment at startup.

use std::net::SocketAddr;

use offboard_executor::ScriptConfig;

use crate::error::GatewayError;

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

/// Everything the binary needs to serve requests.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct AgentConfig {
    /// Socket the HTTP server binds to.
    pub listen_addr: SocketAddr,

    /// Value of `Access-Control-Allow-Origin`. `*` allows any origin.
    pub allowed_origin: String,

    /// Whether requests may set `mock: true`.
    pub allow_mock: bool,

    /// How the offboarding script is launched.
    pub script: ScriptConfig,
}

impl AgentConfig {
    /// Load from `OFFBOARD_*` environment variables.
    ///
    /// # Errors
    /// Returns [`GatewayError::InvalidConfig`] for an unparsable value, or
    /// [`GatewayError::Executor`] if the script settings are invalid.
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AgentConfig::from_env`] but reads from an arbitrary source.
    ///
    /// # Errors
    /// See [`AgentConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GatewayError> {
        let raw_addr = lookup("OFFBOARD_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_owned());
        let listen_addr: SocketAddr = raw_addr.trim().parse().map_err(|e| GatewayError::InvalidConfig {
            key: "OFFBOARD_LISTEN_ADDR",
            reason: format!("'{raw_addr}': {e}"),
        })?;

        let allowed_origin = lookup("OFFBOARD_ALLOWED_ORIGIN")
            .map(|o| o.trim().to_owned())
            .filter(|o| !o.is_empty())
            .unwrap_or_else(|| "*".to_owned());

        let allow_mock = match lookup("OFFBOARD_ALLOW_MOCK") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| GatewayError::InvalidConfig {
                key: "OFFBOARD_ALLOW_MOCK",
                reason: format!("expected true or false, got '{raw}'"),
            })?,
            None => true,
        };

        let script = ScriptConfig::from_lookup(&lookup)?;

        Ok(Self { listen_addr, allowed_origin, allow_mock, script })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
