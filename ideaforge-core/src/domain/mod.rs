//! Core domain types
//!
//! This module contains the core domain structures used across IdeaForge services.
//! They are shared between the orchestrator (persists and executes) and the
//! client/CLI (reads).

pub mod output;
pub mod project;
pub mod run;
pub mod session;
pub mod stage;
