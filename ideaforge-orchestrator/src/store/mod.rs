//! Workflow persistence
//!
//! The orchestrator only needs a handful of operations on runs and stage
//! outputs. They sit behind [`WorkflowStore`] so the pipeline can be driven
//! against Postgres in production and an in-memory store in tests.

mod memory;
mod postgres;

pub use memory::MemoryWorkflowStore;
pub use postgres::PgWorkflowStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ideaforge_core::domain::output::StageOutput;
use ideaforge_core::domain::run::{InvalidTransition, Run, RunStatus};
use ideaforge_core::domain::stage::Stage;
use uuid::Uuid;

/// Store error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("run {0} not found")]
    RunNotFound(Uuid),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Creates a Running run with the next version number for the project
    async fn create_run(&self, project_id: Uuid) -> Result<Run, StoreError>;

    /// Moves a Running run into `status`; terminal runs are rejected
    async fn finish_run(
        &self,
        run_id: Uuid,
        status: RunStatus,
        error_message: Option<String>,
    ) -> Result<Run, StoreError>;

    /// Creates or replaces the generated payload of (run, stage)
    async fn upsert_output(
        &self,
        run_id: Uuid,
        stage: Stage,
        json_output: serde_json::Value,
        citations: Vec<String>,
    ) -> Result<StageOutput, StoreError>;

    async fn find_run(&self, run_id: Uuid) -> Result<Option<Run>, StoreError>;

    async fn list_outputs(&self, run_id: Uuid) -> Result<Vec<StageOutput>, StoreError>;

    /// Number of runs of a project started strictly after `since`
    async fn count_runs_since(
        &self,
        project_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64, StoreError>;
}
