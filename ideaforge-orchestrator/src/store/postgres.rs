//! Postgres-backed workflow store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ideaforge_core::domain::output::StageOutput;
use ideaforge_core::domain::run::{InvalidTransition, Run, RunStatus};
use ideaforge_core::domain::stage::Stage;
use sqlx::PgPool;
use uuid::Uuid;

use crate::repository::{output_repository, run_repository};
use crate::store::{StoreError, WorkflowStore};

#[derive(Clone)]
pub struct PgWorkflowStore {
    pool: PgPool,
}

impl PgWorkflowStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkflowStore for PgWorkflowStore {
    async fn create_run(&self, project_id: Uuid) -> Result<Run, StoreError> {
        Ok(run_repository::create(&self.pool, project_id).await?)
    }

    async fn finish_run(
        &self,
        run_id: Uuid,
        status: RunStatus,
        error_message: Option<String>,
    ) -> Result<Run, StoreError> {
        if let Some(run) =
            run_repository::finish(&self.pool, run_id, status, error_message.as_deref()).await?
        {
            return Ok(run);
        }

        // Nothing updated: either the run is gone or it is already terminal
        match run_repository::find_by_id(&self.pool, run_id).await? {
            Some(current) => Err(InvalidTransition {
                run_id,
                from: current.status,
                to: status,
            }
            .into()),
            None => Err(StoreError::RunNotFound(run_id)),
        }
    }

    async fn upsert_output(
        &self,
        run_id: Uuid,
        stage: Stage,
        json_output: serde_json::Value,
        citations: Vec<String>,
    ) -> Result<StageOutput, StoreError> {
        Ok(output_repository::upsert(&self.pool, run_id, stage, json_output, citations).await?)
    }

    async fn find_run(&self, run_id: Uuid) -> Result<Option<Run>, StoreError> {
        Ok(run_repository::find_by_id(&self.pool, run_id).await?)
    }

    async fn list_outputs(&self, run_id: Uuid) -> Result<Vec<StageOutput>, StoreError> {
        Ok(output_repository::list_by_run(&self.pool, run_id).await?)
    }

    async fn count_runs_since(
        &self,
        project_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        Ok(run_repository::count_since(&self.pool, project_id, since).await?)
    }
}
