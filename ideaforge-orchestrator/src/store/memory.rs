//! In-memory workflow store
//!
//! Keeps runs and outputs in process memory. Used by tests and anywhere the
//! pipeline runs without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ideaforge_core::domain::output::StageOutput;
use ideaforge_core::domain::run::{Run, RunStatus};
use ideaforge_core::domain::stage::Stage;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::{StoreError, WorkflowStore};

#[derive(Default)]
pub struct MemoryWorkflowStore {
    runs: RwLock<HashMap<Uuid, Run>>,
    outputs: RwLock<HashMap<(Uuid, Stage), StageOutput>>,
}

impl MemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a run as-is, bypassing version numbering
    pub async fn insert_run(&self, run: Run) {
        self.runs.write().await.insert(run.id, run);
    }
}

#[async_trait]
impl WorkflowStore for MemoryWorkflowStore {
    async fn create_run(&self, project_id: Uuid) -> Result<Run, StoreError> {
        let mut runs = self.runs.write().await;
        let previous = runs.values().filter(|r| r.project_id == project_id).count();

        let run = Run::start(project_id, previous as i32 + 1);
        runs.insert(run.id, run.clone());
        Ok(run)
    }

    async fn finish_run(
        &self,
        run_id: Uuid,
        status: RunStatus,
        error_message: Option<String>,
    ) -> Result<Run, StoreError> {
        let mut runs = self.runs.write().await;
        let run = runs.get_mut(&run_id).ok_or(StoreError::RunNotFound(run_id))?;
        run.finish(status, error_message)?;
        Ok(run.clone())
    }

    async fn upsert_output(
        &self,
        run_id: Uuid,
        stage: Stage,
        json_output: serde_json::Value,
        citations: Vec<String>,
    ) -> Result<StageOutput, StoreError> {
        if !self.runs.read().await.contains_key(&run_id) {
            return Err(StoreError::RunNotFound(run_id));
        }

        let now = Utc::now();
        let mut outputs = self.outputs.write().await;
        let output = outputs
            .entry((run_id, stage))
            .and_modify(|existing| {
                existing.json_output = json_output.clone();
                existing.citations = citations.clone();
                existing.updated_at = now;
            })
            .or_insert_with(|| StageOutput {
                id: Uuid::new_v4(),
                run_id,
                stage,
                json_output,
                citations,
                user_edits: None,
                created_at: now,
                updated_at: now,
            });

        Ok(output.clone())
    }

    async fn find_run(&self, run_id: Uuid) -> Result<Option<Run>, StoreError> {
        Ok(self.runs.read().await.get(&run_id).cloned())
    }

    async fn list_outputs(&self, run_id: Uuid) -> Result<Vec<StageOutput>, StoreError> {
        let mut outputs: Vec<StageOutput> = self
            .outputs
            .read()
            .await
            .values()
            .filter(|o| o.run_id == run_id)
            .cloned()
            .collect();
        outputs.sort_by_key(|o| o.stage);
        Ok(outputs)
    }

    async fn count_runs_since(
        &self,
        project_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        let count = self
            .runs
            .read()
            .await
            .values()
            .filter(|r| r.project_id == project_id && r.started_at > since)
            .count();
        Ok(count as i64)
    }
}
