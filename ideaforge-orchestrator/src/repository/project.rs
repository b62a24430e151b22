//! Project Repository
//!
//! Handles all database operations related to projects.

use ideaforge_core::domain::project::Project;
use ideaforge_core::dto::project::CreateProject;
use sqlx::PgPool;
use uuid::Uuid;

/// Create a new project in the database
pub async fn create(
    pool: &PgPool,
    session_id: Uuid,
    req: CreateProject,
) -> Result<Project, sqlx::Error> {
    let now = chrono::Utc::now();

    let project = Project {
        id: Uuid::new_v4(),
        session_id,
        title: req.title.trim().to_string(),
        idea_text: req.idea_text.trim().to_string(),
        domain: req
            .domain
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO projects (id, session_id, title, idea_text, domain, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(project.id)
    .bind(project.session_id)
    .bind(&project.title)
    .bind(&project.idea_text)
    .bind(&project.domain)
    .bind(project.created_at)
    .bind(project.updated_at)
    .execute(pool)
    .await?;

    Ok(project)
}

/// Find a project by ID
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Project>, sqlx::Error> {
    let row = sqlx::query_as::<_, ProjectRow>(
        r#"
        SELECT id, session_id, title, idea_text, domain, created_at, updated_at
        FROM projects
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// List projects of a session, most recently updated first
pub async fn list_by_session(pool: &PgPool, session_id: Uuid) -> Result<Vec<Project>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ProjectRow>(
        r#"
        SELECT id, session_id, title, idea_text, domain, created_at, updated_at
        FROM projects
        WHERE session_id = $1
        ORDER BY updated_at DESC
        "#,
    )
    .bind(session_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Count projects owned by a session
pub async fn count_by_session(pool: &PgPool, session_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE session_id = $1")
        .bind(session_id)
        .fetch_one(pool)
        .await
}

/// Bump `updated_at` so the project sorts first in listings
pub async fn touch(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE projects SET updated_at = $1 WHERE id = $2")
        .bind(chrono::Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct ProjectRow {
    id: Uuid,
    session_id: Uuid,
    title: String,
    idea_text: String,
    domain: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            id: row.id,
            session_id: row.session_id,
            title: row.title,
            idea_text: row.idea_text,
            domain: row.domain,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
