use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

/// Dimension of `text-embedding-004` vectors
pub const EMBEDDING_DIMENSIONS: usize = 768;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Create sessions table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id UUID PRIMARY KEY,
            created_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create projects table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            id UUID PRIMARY KEY,
            session_id UUID NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
            title VARCHAR(80) NOT NULL,
            idea_text TEXT NOT NULL,
            domain TEXT,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create workflow runs table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS workflow_runs (
            id UUID PRIMARY KEY,
            project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            status VARCHAR(20) NOT NULL,
            version INTEGER NOT NULL,
            started_at TIMESTAMPTZ NOT NULL,
            finished_at TIMESTAMPTZ,
            error_message TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create stage outputs table, one row per (run, stage)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS workflow_outputs (
            id UUID PRIMARY KEY,
            run_id UUID NOT NULL REFERENCES workflow_runs(id) ON DELETE CASCADE,
            stage VARCHAR(20) NOT NULL,
            json_output JSONB NOT NULL,
            citations TEXT[] NOT NULL DEFAULT '{}',
            user_edits JSONB,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL,
            UNIQUE (run_id, stage)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for better query performance
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_projects_session ON projects(session_id, updated_at DESC)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_runs_project ON workflow_runs(project_id, started_at DESC)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_runs_project_version ON workflow_runs(project_id, version)",
    )
    .execute(pool)
    .await?;

    run_knowledge_migrations(pool).await;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}

/// Knowledge tables need pgvector. Without it the orchestrator still serves
/// workflows, retrieval just comes back empty.
async fn run_knowledge_migrations(pool: &PgPool) {
    if let Err(e) = sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
        .execute(pool)
        .await
    {
        tracing::warn!(
            "pgvector extension unavailable, knowledge retrieval disabled: {}",
            e
        );
        return;
    }

    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS knowledge_documents (
            id UUID PRIMARY KEY,
            title TEXT NOT NULL,
            source TEXT NOT NULL,
            tags TEXT[] NOT NULL DEFAULT '{}',
            content TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL
        )
        "#
        .to_string(),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS knowledge_chunks (
                id UUID PRIMARY KEY,
                document_id UUID NOT NULL REFERENCES knowledge_documents(id) ON DELETE CASCADE,
                chunk_text TEXT NOT NULL,
                embedding vector({}) NOT NULL,
                metadata JSONB NOT NULL DEFAULT '{{}}',
                created_at TIMESTAMPTZ NOT NULL
            )
            "#,
            EMBEDDING_DIMENSIONS
        ),
        "CREATE INDEX IF NOT EXISTS idx_chunks_document ON knowledge_chunks(document_id)"
            .to_string(),
    ];

    for statement in statements {
        if let Err(e) = sqlx::query(&statement).execute(pool).await {
            tracing::warn!("Knowledge migration failed, retrieval disabled: {}", e);
            return;
        }
    }
}
