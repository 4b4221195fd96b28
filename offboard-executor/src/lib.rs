//! Process invoker for the offboard agent.
//!
//! Builds the script's argument vector, runs it as a child process under a
//! timeout (or synthesizes an outcome in mock mode), and reports exactly how
//! it ended.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod backend;
pub mod command;
pub mod config;
pub mod error;
pub mod invoker;
pub mod mock;
pub mod process;

pub use backend::ScriptBackend;
pub use command::ScriptCommand;
pub use config::ScriptConfig;
pub use error::ExecutorError;
pub use invoker::ScriptInvoker;
pub use process::ProcessBackend;
