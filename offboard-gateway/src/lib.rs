//! HTTP gateway for the offboard agent.
//!
//! Exposes `/health`, `/validate` and `/terminate` to the workflow
//! orchestrator, runs the offboarding script through `offboard-executor` and
//! maps each outcome onto a typed, retry-aware JSON response.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod error;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;
