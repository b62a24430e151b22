//! Session Service
//!
//! Anonymous sessions: the only identity the API knows.

use ideaforge_core::domain::session::Session;
use sqlx::PgPool;
use uuid::Uuid;

use crate::repository::session_repository;

/// Service error type
#[derive(Debug)]
pub enum SessionError {
    NotFound(Uuid),
    DatabaseError(sqlx::Error),
}

impl From<sqlx::Error> for SessionError {
    fn from(err: sqlx::Error) -> Self {
        SessionError::DatabaseError(err)
    }
}

/// Reuse the presented session when it exists, otherwise start a new one
pub async fn init_session(pool: &PgPool, presented: Option<Uuid>) -> Result<Session, SessionError> {
    if let Some(id) = presented {
        if let Some(session) = session_repository::find_by_id(pool, id).await? {
            tracing::debug!("Reusing session {}", id);
            return Ok(session);
        }
    }

    let session = session_repository::create(pool).await?;
    tracing::info!("Session created: {}", session.id);
    Ok(session)
}

/// Look up a session that must already exist
pub async fn resolve_session(pool: &PgPool, id: Uuid) -> Result<Session, SessionError> {
    session_repository::find_by_id(pool, id)
        .await?
        .ok_or(SessionError::NotFound(id))
}
