//! Workflow API Handlers
//!
//! Triggering runs, polling them, and saving user edits.

use axum::{
    Json,
    extract::{Path, State},
};
use ideaforge_core::dto::workflow::{
    RunDetail, RunStarted, SaveEdits, SaveEditsResponse, StartWorkflow,
};
use uuid::Uuid;

use crate::api::AppState;
use crate::api::error::ApiResult;
use crate::api::session::SessionId;
use crate::service::workflow_service;

/// POST /workflow/run
/// Start a run; stages execute in the background
pub async fn start_run(
    State(state): State<AppState>,
    SessionId(session_id): SessionId,
    Json(req): Json<StartWorkflow>,
) -> ApiResult<Json<RunStarted>> {
    tracing::info!("Starting workflow for project: {}", req.project_id);

    let run = workflow_service::start_run(
        &state.pool,
        &state.orchestrator,
        state.settings.rate_limit,
        session_id,
        req.project_id,
    )
    .await?;

    Ok(Json(RunStarted::from(&run)))
}

/// GET /workflow/run/{run_id}
/// Run status and every stage output saved so far
pub async fn get_run(
    State(state): State<AppState>,
    SessionId(session_id): SessionId,
    Path(run_id): Path<Uuid>,
) -> ApiResult<Json<RunDetail>> {
    tracing::debug!("Getting run: {}", run_id);

    let detail =
        workflow_service::get_run(&state.pool, &state.orchestrator, session_id, run_id).await?;
    Ok(Json(detail))
}

/// POST /workflow/saveEdits
/// Overlay user edits on a stage output
pub async fn save_edits(
    State(state): State<AppState>,
    SessionId(session_id): SessionId,
    Json(req): Json<SaveEdits>,
) -> ApiResult<Json<SaveEditsResponse>> {
    workflow_service::save_edits(&state.pool, session_id, req).await?;
    Ok(Json(SaveEditsResponse { success: true }))
}
