//! Workflow Service
//!
//! Starting runs, reading them back and overlaying user edits.

use ideaforge_core::domain::project::Project;
use ideaforge_core::domain::run::Run;
use ideaforge_core::domain::stage::Stage;
use ideaforge_core::dto::workflow::{RunDetail, SaveEdits};
use ideaforge_core::payload::StagePayload;
use sqlx::PgPool;
use uuid::Uuid;

use crate::pipeline::PipelineOrchestrator;
use crate::repository::{output_repository, project_repository};
use crate::service::RateLimit;
use crate::store::StoreError;

/// Service error type
#[derive(Debug)]
pub enum WorkflowError {
    ProjectNotFound(Uuid),
    RunNotFound(Uuid),
    OutputNotFound(Uuid),
    RateLimited(RateLimit),
    ValidationError(String),
    DatabaseError(sqlx::Error),
    StoreError(StoreError),
}

impl From<sqlx::Error> for WorkflowError {
    fn from(err: sqlx::Error) -> Self {
        WorkflowError::DatabaseError(err)
    }
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RunNotFound(id) => WorkflowError::RunNotFound(id),
            StoreError::Database(e) => WorkflowError::DatabaseError(e),
            other => WorkflowError::StoreError(other),
        }
    }
}

/// Start a new run of a project owned by the session
///
/// Returns immediately; stages execute in the background.
pub async fn start_run(
    pool: &PgPool,
    orchestrator: &PipelineOrchestrator,
    limit: RateLimit,
    session_id: Uuid,
    project_id: Uuid,
) -> Result<Run, WorkflowError> {
    let project = project_repository::find_by_id(pool, project_id)
        .await?
        .filter(|p| p.session_id == session_id)
        .ok_or(WorkflowError::ProjectNotFound(project_id))?;

    launch_run(pool, orchestrator, limit, project).await
}

/// Rate-limit check, project touch, then the background run.
///
/// Nothing is started unless every fallible step before it succeeded.
async fn launch_run(
    pool: &PgPool,
    orchestrator: &PipelineOrchestrator,
    limit: RateLimit,
    project: Project,
) -> Result<Run, WorkflowError> {
    if !limit.allows(orchestrator.store().as_ref(), project.id).await? {
        tracing::warn!("Run rate limit hit for project {}", project.id);
        return Err(WorkflowError::RateLimited(limit));
    }

    project_repository::touch(pool, project.id).await?;

    let run = orchestrator
        .start_workflow(project.id, project.idea_text, project.domain)
        .await?;

    Ok(run)
}

/// Get a run and its outputs, if the run's project belongs to the session
pub async fn get_run(
    pool: &PgPool,
    orchestrator: &PipelineOrchestrator,
    session_id: Uuid,
    run_id: Uuid,
) -> Result<RunDetail, WorkflowError> {
    let detail = orchestrator.get_run(run_id).await?;

    let owned = project_repository::find_by_id(pool, detail.run.project_id)
        .await?
        .is_some_and(|p| p.session_id == session_id);
    if !owned {
        return Err(WorkflowError::RunNotFound(run_id));
    }

    Ok(detail)
}

/// Replace the user edit overlay of an output
pub async fn save_edits(pool: &PgPool, session_id: Uuid, req: SaveEdits) -> Result<(), WorkflowError> {
    let (output, owner) = output_repository::find_with_owner(pool, req.output_id)
        .await?
        .ok_or(WorkflowError::OutputNotFound(req.output_id))?;

    if owner != session_id {
        return Err(WorkflowError::OutputNotFound(req.output_id));
    }

    validate_edits(output.stage, &req.user_edits)?;

    if !output_repository::update_user_edits(pool, output.id, req.user_edits).await? {
        return Err(WorkflowError::OutputNotFound(output.id));
    }

    tracing::info!("Saved edits on {} output {}", output.stage, output.id);
    Ok(())
}

/// User edits must be a complete, valid value of the stage's contract
pub fn validate_edits(stage: Stage, edits: &serde_json::Value) -> Result<(), WorkflowError> {
    if !edits.is_object() {
        return Err(WorkflowError::ValidationError(
            "userEdits must be a JSON object".to_string(),
        ));
    }

    StagePayload::from_json(stage, edits.clone())
        .map(|_| ())
        .map_err(|e| WorkflowError::ValidationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{GenerationError, GenerationRequest, StructuredGenerator};
    use crate::retrieval::{RetrievalQuery, RetrievedChunk, Retriever};
    use crate::store::{MemoryWorkflowStore, WorkflowStore};
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::json;
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_valid_edits_accepted() {
        let edits = json!({
            "summary": "Edited summary",
            "recommendedNextSteps": ["Talk to five baristas"]
        });
        assert!(validate_edits(Stage::Final, &edits).is_ok());
    }

    #[test]
    fn test_edits_must_match_stage_contract() {
        let edits = json!({"summary": "Edited summary"});
        assert!(matches!(
            validate_edits(Stage::Final, &edits),
            Err(WorkflowError::ValidationError(_))
        ));

        // a valid final report is not a valid intake
        let report = json!({"summary": "s", "recommendedNextSteps": []});
        assert!(validate_edits(Stage::Intake, &report).is_err());
    }

    #[test]
    fn test_edits_must_be_object() {
        assert!(validate_edits(Stage::Risks, &json!(["risk"])).is_err());
        assert!(validate_edits(Stage::Risks, &json!(null)).is_err());
    }

    struct Unused;

    #[async_trait]
    impl StructuredGenerator for Unused {
        async fn complete(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
            Err(GenerationError::EmptyResponse)
        }
    }

    #[async_trait]
    impl Retriever for Unused {
        async fn retrieve(&self, _query: &RetrievalQuery) -> Vec<RetrievedChunk> {
            Vec::new()
        }
    }

    #[tokio::test]
    async fn test_no_run_starts_when_touch_fails() {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://ideaforge@127.0.0.1:1/ideaforge")
            .unwrap();
        let store = Arc::new(MemoryWorkflowStore::new());
        let orchestrator =
            PipelineOrchestrator::new(store.clone(), Arc::new(Unused), Arc::new(Unused));

        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            title: "Mug".to_string(),
            idea_text: "A self-stirring mug".to_string(),
            domain: None,
            created_at: now,
            updated_at: now,
        };
        let project_id = project.id;

        let err = launch_run(&pool, &orchestrator, RateLimit::default(), project)
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::DatabaseError(_)));
        let started = store
            .count_runs_since(project_id, now - chrono::Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(started, 0);
    }

    #[test]
    fn test_store_errors_map() {
        let id = Uuid::new_v4();
        assert!(matches!(
            WorkflowError::from(StoreError::RunNotFound(id)),
            WorkflowError::RunNotFound(found) if found == id
        ));
    }
}
