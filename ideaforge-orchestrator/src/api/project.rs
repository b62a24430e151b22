//! Project API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use ideaforge_core::domain::project::Project;
use ideaforge_core::dto::project::{CreateProject, ProjectDetail, ProjectSummary};
use uuid::Uuid;

use crate::api::AppState;
use crate::api::error::ApiResult;
use crate::api::session::SessionId;
use crate::service::project_service;

/// GET /projects
/// List the caller's projects with their latest run
pub async fn list_projects(
    State(state): State<AppState>,
    SessionId(session_id): SessionId,
) -> ApiResult<Json<Vec<ProjectSummary>>> {
    tracing::debug!("Listing projects for session: {}", session_id);

    let projects = project_service::list_projects(&state.pool, session_id).await?;
    Ok(Json(projects))
}

/// POST /projects
/// Create a project
pub async fn create_project(
    State(state): State<AppState>,
    SessionId(session_id): SessionId,
    Json(req): Json<CreateProject>,
) -> ApiResult<Json<Project>> {
    let project = project_service::create_project(
        &state.pool,
        session_id,
        req,
        state.settings.project_limit,
    )
    .await?;

    Ok(Json(project))
}

/// GET /projects/{id}
/// Get a project with its latest run and outputs
pub async fn get_project(
    State(state): State<AppState>,
    SessionId(session_id): SessionId,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProjectDetail>> {
    tracing::debug!("Getting project: {}", id);

    let project = project_service::get_project(&state.pool, session_id, id).await?;
    Ok(Json(project))
}
