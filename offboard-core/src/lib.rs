//! Core types for the offboard identity-deprovisioning agent.
//!
//! Defines the request schemas and validator, the exit-code classification
//! table, the process outcome model and correlation identifiers. Nothing in
//! this crate performs I/O.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod exit_code;
pub mod id;
pub mod outcome;
pub mod request;
pub mod validation;

pub use error::{Rule, ValidationError};
pub use exit_code::{Category, ExitCodeEntry, ExitCodeTable};
pub use id::{CorrelationCounter, CorrelationId};
pub use outcome::{ProcessOutcome, Termination};
pub use request::{MockDirective, TerminateRequest, ValidateRequest};
pub use validation::{Schema, Validated};
