//! Data Transfer Objects for the HTTP API
//!
//! Request and response bodies exchanged between the orchestrator and its
//! clients (CLI, web front-end).

pub mod project;
pub mod session;
pub mod workflow;
