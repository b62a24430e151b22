//! Stage Output Repository
//!
//! Handles all database operations related to stage outputs.

use ideaforge_core::domain::output::StageOutput;
use ideaforge_core::domain::stage::Stage;
use sqlx::PgPool;
use uuid::Uuid;

/// Insert the output of a stage, or update it if the run already has one
pub async fn upsert(
    pool: &PgPool,
    run_id: Uuid,
    stage: Stage,
    json_output: serde_json::Value,
    citations: Vec<String>,
) -> Result<StageOutput, sqlx::Error> {
    let now = chrono::Utc::now();

    let row = sqlx::query_as::<_, OutputRow>(
        r#"
        INSERT INTO workflow_outputs (id, run_id, stage, json_output, citations, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        ON CONFLICT (run_id, stage) DO UPDATE
        SET json_output = EXCLUDED.json_output,
            citations = EXCLUDED.citations,
            updated_at = EXCLUDED.updated_at
        RETURNING id, run_id, stage, json_output, citations, user_edits, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(run_id)
    .bind(stage.as_str())
    .bind(json_output)
    .bind(citations)
    .bind(now)
    .fetch_one(pool)
    .await?;

    row.try_into()
}

/// List all outputs of a run
pub async fn list_by_run(pool: &PgPool, run_id: Uuid) -> Result<Vec<StageOutput>, sqlx::Error> {
    let rows = sqlx::query_as::<_, OutputRow>(
        r#"
        SELECT id, run_id, stage, json_output, citations, user_edits, created_at, updated_at
        FROM workflow_outputs
        WHERE run_id = $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(run_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(StageOutput::try_from).collect()
}

/// Find an output together with the session that owns its project
pub async fn find_with_owner(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<(StageOutput, Uuid)>, sqlx::Error> {
    let row = sqlx::query_as::<_, OwnedOutputRow>(
        r#"
        SELECT o.id, o.run_id, o.stage, o.json_output, o.citations, o.user_edits,
               o.created_at, o.updated_at, p.session_id
        FROM workflow_outputs o
        JOIN workflow_runs r ON r.id = o.run_id
        JOIN projects p ON p.id = r.project_id
        WHERE o.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let session_id = row.session_id;
            Ok(Some((row.output.try_into()?, session_id)))
        }
        None => Ok(None),
    }
}

/// Replace the user edit overlay of an output
pub async fn update_user_edits(
    pool: &PgPool,
    id: Uuid,
    user_edits: serde_json::Value,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE workflow_outputs
        SET user_edits = $1, updated_at = $2
        WHERE id = $3
        "#,
    )
    .bind(user_edits)
    .bind(chrono::Utc::now())
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct OutputRow {
    id: Uuid,
    run_id: Uuid,
    stage: String,
    json_output: serde_json::Value,
    citations: Vec<String>,
    user_edits: Option<serde_json::Value>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(sqlx::FromRow)]
struct OwnedOutputRow {
    #[sqlx(flatten)]
    output: OutputRow,
    session_id: Uuid,
}

impl TryFrom<OutputRow> for StageOutput {
    type Error = sqlx::Error;

    fn try_from(row: OutputRow) -> Result<Self, Self::Error> {
        let stage = row
            .stage
            .parse::<Stage>()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(StageOutput {
            id: row.id,
            run_id: row.run_id,
            stage,
            json_output: row.json_output,
            citations: row.citations,
            user_edits: row.user_edits,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
