//! Run Repository
//!
//! Handles all database operations related to workflow runs.

use ideaforge_core::domain::run::{Run, RunStatus};
use sqlx::PgPool;
use uuid::Uuid;

const RUN_COLUMNS: &str =
    "id, project_id, status, version, started_at, finished_at, error_message";

/// Create a new run in the Running state.
///
/// The version is one more than the highest version the project already has.
/// The project row is locked for the duration, so concurrent creates for one
/// project get distinct versions.
pub async fn create(pool: &PgPool, project_id: Uuid) -> Result<Run, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT id FROM projects WHERE id = $1 FOR UPDATE")
        .bind(project_id)
        .fetch_optional(&mut *tx)
        .await?;

    let mut run = Run::start(project_id, 0);
    run.version = sqlx::query_scalar(
        r#"
        INSERT INTO workflow_runs (id, project_id, status, version, started_at)
        SELECT $1, $2, $3, COALESCE(MAX(version), 0) + 1, $4
        FROM workflow_runs WHERE project_id = $2
        RETURNING version
        "#,
    )
    .bind(run.id)
    .bind(run.project_id)
    .bind(run.status.as_str())
    .bind(run.started_at)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(run)
}

/// Find a run by ID
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Run>, sqlx::Error> {
    let row = sqlx::query_as::<_, RunRow>(&format!(
        "SELECT {} FROM workflow_runs WHERE id = $1",
        RUN_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(Run::try_from).transpose()
}

/// Find the most recent run of a project
pub async fn find_latest_for_project(
    pool: &PgPool,
    project_id: Uuid,
) -> Result<Option<Run>, sqlx::Error> {
    let row = sqlx::query_as::<_, RunRow>(&format!(
        "SELECT {} FROM workflow_runs WHERE project_id = $1 ORDER BY started_at DESC LIMIT 1",
        RUN_COLUMNS
    ))
    .bind(project_id)
    .fetch_optional(pool)
    .await?;

    row.map(Run::try_from).transpose()
}

/// Count runs of a project started after `since`
pub async fn count_since(
    pool: &PgPool,
    project_id: Uuid,
    since: chrono::DateTime<chrono::Utc>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM workflow_runs WHERE project_id = $1 AND started_at > $2",
    )
    .bind(project_id)
    .bind(since)
    .fetch_one(pool)
    .await
}

/// Move a Running run into a terminal state.
///
/// Returns `None` when no Running run with this id exists, so a terminal run
/// is never overwritten.
pub async fn finish(
    pool: &PgPool,
    run_id: Uuid,
    status: RunStatus,
    error_message: Option<&str>,
) -> Result<Option<Run>, sqlx::Error> {
    let row = sqlx::query_as::<_, RunRow>(&format!(
        r#"
        UPDATE workflow_runs
        SET status = $1, finished_at = $2, error_message = $3
        WHERE id = $4 AND status = $5
        RETURNING {}
        "#,
        RUN_COLUMNS
    ))
    .bind(status.as_str())
    .bind(chrono::Utc::now())
    .bind(error_message)
    .bind(run_id)
    .bind(RunStatus::Running.as_str())
    .fetch_optional(pool)
    .await?;

    row.map(Run::try_from).transpose()
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct RunRow {
    id: Uuid,
    project_id: Uuid,
    status: String,
    version: i32,
    started_at: chrono::DateTime<chrono::Utc>,
    finished_at: Option<chrono::DateTime<chrono::Utc>>,
    error_message: Option<String>,
}

impl TryFrom<RunRow> for Run {
    type Error = sqlx::Error;

    fn try_from(row: RunRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<RunStatus>()
            .map_err(|e| sqlx::Error::Decode(e.into()))?;

        Ok(Run {
            id: row.id,
            project_id: row.project_id,
            status,
            version: row.version,
            started_at: row.started_at,
            finished_at: row.finished_at,
            error_message: row.error_message,
        })
    }
}
