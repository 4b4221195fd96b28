//! Script location and process-control settings.

use std::path::PathBuf;
use std::time::Duration;

use crate::ExecutorError;

/// Default grace period between SIGTERM and a forced kill.
pub const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(5);

/// How to launch the offboarding script.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ScriptConfig {
    /// Interpreter that runs the script (e.g. `pwsh`). `None` executes the
    /// script file directly.
    pub interpreter: Option<PathBuf>,

    /// Arguments placed between the interpreter and the script path.
    pub interpreter_args: Vec<String>,

    /// Path to the offboarding script.
    pub script_path: PathBuf,

    /// How long a timed-out script may take to exit after SIGTERM before it
    /// is force-killed.
    pub kill_grace: Duration,
}

impl ScriptConfig {
    /// Run `script_path` directly, with no interpreter.
    #[must_use]
    pub fn direct(script_path: PathBuf) -> Self {
        Self {
            interpreter: None,
            interpreter_args: Vec::new(),
            script_path,
            kill_grace: DEFAULT_KILL_GRACE,
        }
    }

    /// Run `script_path` through PowerShell 7 in non-interactive mode.
    #[must_use]
    pub fn powershell(script_path: PathBuf) -> Self {
        Self {
            interpreter: Some(PathBuf::from("pwsh")),
            interpreter_args: ["-NoProfile", "-NonInteractive", "-File"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            script_path,
            kill_grace: DEFAULT_KILL_GRACE,
        }
    }

    /// Run the script through `interpreter` with the given leading arguments.
    #[must_use]
    pub fn with_interpreter(mut self, interpreter: impl Into<PathBuf>, args: &[&str]) -> Self {
        self.interpreter = Some(interpreter.into());
        self.interpreter_args = args.iter().map(|a| (*a).to_owned()).collect();
        self
    }

    /// Replace the kill grace period.
    #[must_use]
    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    /// Load settings from `OFFBOARD_*` environment variables.
    ///
    /// | variable | default |
    /// |---|---|
    /// | `OFFBOARD_SCRIPT_PATH` | `scripts/Invoke-Offboarding.ps1` |
    /// | `OFFBOARD_INTERPRETER` | `pwsh` (empty runs the script directly) |
    /// | `OFFBOARD_INTERPRETER_ARGS` | `-NoProfile -NonInteractive -File` |
    /// | `OFFBOARD_KILL_GRACE_SECS` | `5` |
    ///
    /// # Errors
    /// Returns [`ExecutorError::InvalidConfig`] if `OFFBOARD_KILL_GRACE_SECS`
    /// is not a non-negative integer.
    pub fn from_env() -> Result<Self, ExecutorError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ScriptConfig::from_env`] but reads from an arbitrary source.
    ///
    /// # Errors
    /// See [`ScriptConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ExecutorError> {
        let script_path = lookup("OFFBOARD_SCRIPT_PATH")
            .map_or_else(|| PathBuf::from("scripts/Invoke-Offboarding.ps1"), PathBuf::from);

        let mut config = match lookup("OFFBOARD_INTERPRETER") {
            Some(i) if i.trim().is_empty() => Self::direct(script_path),
            Some(i) => {
                let mut c = Self::powershell(script_path);
                c.interpreter = Some(PathBuf::from(i));
                c
            }
            None => Self::powershell(script_path),
        };

        if let Some(args) = lookup("OFFBOARD_INTERPRETER_ARGS") {
            config.interpreter_args = args.split_whitespace().map(str::to_owned).collect();
        }

        if let Some(raw) = lookup("OFFBOARD_KILL_GRACE_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|e| ExecutorError::InvalidConfig {
                key: "OFFBOARD_KILL_GRACE_SECS",
                reason: format!("{e}"),
            })?;
            config.kill_grace = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// The program actually spawned: the interpreter, or the script itself.
    #[must_use]
    pub fn program(&self) -> &std::path::Path {
        self.interpreter.as_deref().unwrap_or(&self.script_path)
    }

    /// Arguments that precede the per-request argument vector.
    #[must_use]
    pub fn leading_args(&self) -> Vec<std::ffi::OsString> {
        match self.interpreter {
            Some(_) => self
                .interpreter_args
                .iter()
                .map(Into::into)
                .chain(std::iter::once(self.script_path.clone().into_os_string()))
                .collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ScriptConfig, ExecutorError> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
        ScriptConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_use_powershell() {
        let config = match load(&[]) {
            Ok(c) => c,
            Err(e) => panic!("unexpected error: {e}"),
        };
        assert_eq!(config.program(), std::path::Path::new("pwsh"));
        let leading = config.leading_args();
        assert_eq!(leading.len(), 4);
        assert_eq!(leading[3], std::ffi::OsString::from("scripts/Invoke-Offboarding.ps1"));
        assert_eq!(config.kill_grace, DEFAULT_KILL_GRACE);
    }

    #[test]
    fn empty_interpreter_runs_script_directly() {
        let config = match load(&[("OFFBOARD_INTERPRETER", ""), ("OFFBOARD_SCRIPT_PATH", "/opt/offboard.sh")]) {
            Ok(c) => c,
            Err(e) => panic!("unexpected error: {e}"),
        };
        assert_eq!(config.program(), std::path::Path::new("/opt/offboard.sh"));
        assert!(config.leading_args().is_empty());
    }

    #[test]
    fn interpreter_args_are_split_on_whitespace() {
        let config = match load(&[("OFFBOARD_INTERPRETER", "sh"), ("OFFBOARD_INTERPRETER_ARGS", "-e  ")]) {
            Ok(c) => c,
            Err(e) => panic!("unexpected error: {e}"),
        };
        assert_eq!(config.interpreter_args, vec!["-e".to_owned()]);
    }

    #[test]
    fn invalid_kill_grace_is_rejected() {
        let result = load(&[("OFFBOARD_KILL_GRACE_SECS", "soon")]);
        assert!(matches!(
            result,
            Err(ExecutorError::InvalidConfig { key: "OFFBOARD_KILL_GRACE_SECS", .. })
        ));
    }
}
