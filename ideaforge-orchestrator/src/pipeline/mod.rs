//! Pipeline orchestrator
//!
//! Runs the five stages of a workflow in order against a single
//! [`PipelineState`]. Each stage output is persisted before the next stage
//! starts, so a reader polling the run sees outputs appear one by one. The
//! first failing stage ends the run as `Failed`; everything already saved
//! stays visible.

mod error;
pub mod stages;

#[cfg(test)]
mod tests;

pub use error::StageError;
pub use stages::run_stage;

use ideaforge_core::domain::output::StageOutput;
use ideaforge_core::domain::run::{Run, RunStatus};
use ideaforge_core::domain::stage::Stage;
use ideaforge_core::dto::workflow::RunDetail;
use ideaforge_core::state::{PipelineState, StageUpdate};
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::llm::StructuredGenerator;
use crate::retrieval::Retriever;
use crate::store::{StoreError, WorkflowStore};

/// Capabilities handed to every stage function
#[derive(Clone)]
pub struct StageContext {
    pub generator: Arc<dyn StructuredGenerator>,
    pub retriever: Arc<dyn Retriever>,
}

#[derive(Clone)]
pub struct PipelineOrchestrator {
    store: Arc<dyn WorkflowStore>,
    ctx: StageContext,
}

impl PipelineOrchestrator {
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        generator: Arc<dyn StructuredGenerator>,
        retriever: Arc<dyn Retriever>,
    ) -> Self {
        Self {
            store,
            ctx: StageContext {
                generator,
                retriever,
            },
        }
    }

    pub fn store(&self) -> &Arc<dyn WorkflowStore> {
        &self.store
    }

    /// Creates a run and executes it in the background.
    ///
    /// Returns as soon as the run exists, with status `Running`.
    pub async fn start_workflow(
        &self,
        project_id: Uuid,
        idea_text: impl Into<String>,
        domain: Option<String>,
    ) -> Result<Run, StoreError> {
        let run = self.store.create_run(project_id).await?;
        info!(
            "Started run {} (version {}) for project {}",
            run.id, run.version, project_id
        );

        let state = PipelineState::new(project_id, idea_text, domain);
        let orchestrator = self.clone();
        let background = run.clone();
        tokio::spawn(async move {
            let run_id = background.id;
            if let Err(e) = orchestrator.execute(background, state).await {
                error!("Run {} could not be finalized: {}", run_id, e);
            }
        });

        Ok(run)
    }

    /// Runs every stage in order and records the terminal status
    pub async fn execute(&self, run: Run, state: PipelineState) -> Result<Run, StoreError> {
        let mut state = state;

        for stage in Stage::ALL {
            debug!("Run {}: entering {} stage", run.id, stage.label());

            match self.advance(run.id, stage, &state).await {
                Ok(update) => state = state.apply(update),
                Err(e) => {
                    let message = format!("{} stage failed: {}", stage.label(), e);
                    error!("Run {} failed: {}", run.id, message);
                    return self
                        .store
                        .finish_run(run.id, RunStatus::Failed, Some(message))
                        .await;
                }
            }
        }

        let finished = self
            .store
            .finish_run(run.id, RunStatus::Completed, None)
            .await?;
        info!(
            "Run {} completed with stages {:?}",
            run.id,
            state.completed_stages()
        );
        Ok(finished)
    }

    async fn advance(
        &self,
        run_id: Uuid,
        stage: Stage,
        state: &PipelineState,
    ) -> Result<StageUpdate, StageError> {
        let update = run_stage(stage, state, &self.ctx).await?;
        self.save_output(run_id, stage, &update).await?;
        Ok(update)
    }

    /// Persists a stage update as the (run, stage) output, replacing any
    /// earlier generated payload
    pub async fn save_output(
        &self,
        run_id: Uuid,
        stage: Stage,
        update: &StageUpdate,
    ) -> Result<StageOutput, StageError> {
        if update.stage() != stage {
            return Err(StageError::Precondition(format!(
                "{} stage produced a {} payload",
                stage,
                update.stage()
            )));
        }

        let json_output = update
            .payload
            .to_json()
            .map_err(|e| StageError::Parse(e.to_string()))?;

        let output = self
            .store
            .upsert_output(run_id, stage, json_output, update.citations.clone())
            .await?;
        debug!("Run {}: saved {} output {}", run_id, stage, output.id);
        Ok(output)
    }

    /// The run with every output saved so far
    pub async fn get_run(&self, run_id: Uuid) -> Result<RunDetail, StoreError> {
        let run = self
            .store
            .find_run(run_id)
            .await?
            .ok_or(StoreError::RunNotFound(run_id))?;
        let outputs = self.store.list_outputs(run_id).await?;
        Ok(RunDetail::new(run, outputs))
    }
}
