//! Per-request argument vectors for the offboarding script.
//!
//! Arguments are produced as discrete strings and handed to the OS as an
//! argv array. Nothing here is ever joined into a shell command line.

use offboard_core::{TerminateRequest, ValidateRequest};

/// A script action with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScriptCommand {
    /// Look up an account without changing it.
    Validate { employee_upn: String },
    /// Deprovision an account.
    Terminate {
        employee_upn: String,
        requester_upn: String,
        ticket_id: String,
        termination_date: Option<String>,
        skip_approval: bool,
    },
}

impl ScriptCommand {
    /// Subcommand name passed as the first script argument.
    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            Self::Validate { .. } => "validate",
            Self::Terminate { .. } => "terminate",
        }
    }

    /// The account the command targets.
    #[must_use]
    pub fn employee_upn(&self) -> &str {
        match self {
            Self::Validate { employee_upn } | Self::Terminate { employee_upn, .. } => employee_upn,
        }
    }

    /// Build the argument vector, subcommand first.
    #[must_use]
    pub fn argv(&self) -> Vec<String> {
        let mut argv = vec![self.action().to_owned()];
        match self {
            Self::Validate { employee_upn } => {
                argv.extend(["--employee-upn".to_owned(), employee_upn.clone()]);
            }
            Self::Terminate { employee_upn, requester_upn, ticket_id, termination_date, skip_approval } => {
                argv.extend([
                    "--employee-upn".to_owned(),
                    employee_upn.clone(),
                    "--requester-upn".to_owned(),
                    requester_upn.clone(),
                    "--ticket-id".to_owned(),
                    ticket_id.clone(),
                ]);
                if let Some(date) = termination_date {
                    argv.extend(["--termination-date".to_owned(), date.clone()]);
                }
                if *skip_approval {
                    argv.push("--skip-approval".to_owned());
                }
            }
        }
        argv
    }
}

impl From<&ValidateRequest> for ScriptCommand {
    fn from(req: &ValidateRequest) -> Self {
        Self::Validate { employee_upn: req.employee_upn.clone() }
    }
}

impl From<&TerminateRequest> for ScriptCommand {
    fn from(req: &TerminateRequest) -> Self {
        Self::Terminate {
            employee_upn: req.employee_upn.clone(),
            requester_upn: req.requester_upn.clone(),
            ticket_id: req.ticket_id.clone(),
            termination_date: req.termination_date.map(|d| d.format("%Y-%m-%d").to_string()),
            skip_approval: req.skip_approval,
        }
    }
}
