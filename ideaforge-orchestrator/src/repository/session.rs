//! Session Repository
//!
//! Handles all database operations related to anonymous sessions.

use ideaforge_core::domain::session::Session;
use sqlx::PgPool;
use uuid::Uuid;

/// Create a new session in the database
pub async fn create(pool: &PgPool) -> Result<Session, sqlx::Error> {
    let session = Session {
        id: Uuid::new_v4(),
        created_at: chrono::Utc::now(),
    };

    sqlx::query("INSERT INTO sessions (id, created_at) VALUES ($1, $2)")
        .bind(session.id)
        .bind(session.created_at)
        .execute(pool)
        .await?;

    Ok(session)
}

/// Find a session by ID
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Session>, sqlx::Error> {
    let row = sqlx::query_as::<_, SessionRow>("SELECT id, created_at FROM sessions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| Session {
        id: r.id,
        created_at: r.created_at,
    }))
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: Uuid,
    created_at: chrono::DateTime<chrono::Utc>,
}
