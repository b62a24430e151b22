//! Service Module
//!
//! Business logic layer for the orchestrator.
//! Services sit between the API and the repositories/pipeline and own the
//! ownership, limit and validation rules.

pub mod project;
pub mod rate_limit;
pub mod session;
pub mod workflow;

// Re-export for convenience
pub use project as project_service;
pub use session as session_service;
pub use workflow as workflow_service;

pub use rate_limit::RateLimit;
