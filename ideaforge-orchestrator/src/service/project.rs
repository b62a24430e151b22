//! Project Service
//!
//! Business logic for projects owned by a session.

use ideaforge_core::domain::project::Project;
use ideaforge_core::dto::project::{CreateProject, ProjectDetail, ProjectSummary};
use ideaforge_core::dto::workflow::RunDetail;
use sqlx::PgPool;
use uuid::Uuid;

use crate::repository::{output_repository, project_repository, run_repository};

/// Service error type
#[derive(Debug)]
pub enum ProjectError {
    NotFound(Uuid),
    /// The project belongs to another session
    Forbidden(Uuid),
    ValidationError(String),
    LimitReached(u32),
    DatabaseError(sqlx::Error),
}

impl From<sqlx::Error> for ProjectError {
    fn from(err: sqlx::Error) -> Self {
        ProjectError::DatabaseError(err)
    }
}

/// Create a project for the session
pub async fn create_project(
    pool: &PgPool,
    session_id: Uuid,
    req: CreateProject,
    limit: u32,
) -> Result<Project, ProjectError> {
    req.validate().map_err(ProjectError::ValidationError)?;

    let existing = project_repository::count_by_session(pool, session_id).await?;
    check_project_limit(existing, limit)?;

    let project = project_repository::create(pool, session_id, req).await?;
    tracing::info!("Project created: {} for session: {}", project.id, session_id);

    Ok(project)
}

/// List the session's projects, most recently updated first
pub async fn list_projects(
    pool: &PgPool,
    session_id: Uuid,
) -> Result<Vec<ProjectSummary>, ProjectError> {
    let projects = project_repository::list_by_session(pool, session_id).await?;

    let mut summaries = Vec::with_capacity(projects.len());
    for project in projects {
        let latest_run = run_repository::find_latest_for_project(pool, project.id).await?;
        summaries.push(ProjectSummary {
            project,
            latest_run,
        });
    }

    Ok(summaries)
}

/// Get a project with the full detail of its latest run
pub async fn get_project(
    pool: &PgPool,
    session_id: Uuid,
    id: Uuid,
) -> Result<ProjectDetail, ProjectError> {
    let project = find_owned(pool, session_id, id).await?;

    let latest_run = match run_repository::find_latest_for_project(pool, id).await? {
        Some(run) => {
            let outputs = output_repository::list_by_run(pool, run.id).await?;
            Some(RunDetail::new(run, outputs))
        }
        None => None,
    };

    Ok(ProjectDetail {
        project,
        latest_run,
    })
}

/// Load a project and check it belongs to `session_id`
pub async fn find_owned(pool: &PgPool, session_id: Uuid, id: Uuid) -> Result<Project, ProjectError> {
    let project = project_repository::find_by_id(pool, id)
        .await?
        .ok_or(ProjectError::NotFound(id))?;

    if project.session_id != session_id {
        return Err(ProjectError::Forbidden(id));
    }

    Ok(project)
}

fn check_project_limit(existing: i64, limit: u32) -> Result<(), ProjectError> {
    if existing >= i64::from(limit) {
        return Err(ProjectError::LimitReached(limit));
    }
    Ok(())
}
