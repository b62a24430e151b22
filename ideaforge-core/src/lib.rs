//! IdeaForge Core
//!
//! Core types and abstractions for the IdeaForge ideation pipeline.
//!
//! This crate contains:
//! - Domain types: Core business entities (Run, StageOutput, Project, etc.)
//! - Contracts: The structured output shape of each pipeline stage
//! - State: The immutable pipeline state threaded through the stages
//! - DTOs: Data transfer objects for the HTTP API

pub mod contract;
pub mod domain;
pub mod dto;
pub mod payload;
pub mod state;
