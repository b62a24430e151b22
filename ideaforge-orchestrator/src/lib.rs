//! IdeaForge orchestrator
//!
//! Turns a raw product idea into a conceptual design through five
//! LLM-backed stages, persisting every stage output as it is produced.

pub mod api;
pub mod config;
pub mod db;
pub mod knowledge;
pub mod llm;
pub mod pipeline;
pub mod repository;
pub mod retrieval;
pub mod service;
pub mod store;
