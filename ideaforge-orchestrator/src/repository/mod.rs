//! Repository Module
//!
//! Data access layer for the orchestrator.
//! Each repository handles database operations for a specific domain entity.

pub mod knowledge;
pub mod output;
pub mod project;
pub mod run;
pub mod session;

// Re-export for convenience
pub use knowledge as knowledge_repository;
pub use output as output_repository;
pub use project as project_repository;
pub use run as run_repository;
pub use session as session_repository;
