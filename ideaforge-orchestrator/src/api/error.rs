//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::service::project::ProjectError;
use crate::service::session::SessionError;
use crate::service::workflow::WorkflowError;
use crate::store::StoreError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    TooManyRequests(String),
    DatabaseError(sqlx::Error),
    InternalError(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::DatabaseError(_) | ApiError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::TooManyRequests(msg) => msg,
            ApiError::DatabaseError(err) => {
                tracing::error!("Database error: {:?}", err);
                "Internal server error".to_string()
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                msg
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::DatabaseError(err)
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(_) => ApiError::Unauthorized("Invalid session".to_string()),
            SessionError::DatabaseError(err) => ApiError::DatabaseError(err),
        }
    }
}

impl From<ProjectError> for ApiError {
    fn from(err: ProjectError) -> Self {
        match err {
            ProjectError::NotFound(id) => ApiError::NotFound(format!("Project {} not found", id)),
            ProjectError::Forbidden(_) => ApiError::Forbidden("Forbidden".to_string()),
            ProjectError::ValidationError(msg) => ApiError::BadRequest(msg),
            ProjectError::LimitReached(limit) => ApiError::TooManyRequests(format!(
                "Project limit reached ({} per session)",
                limit
            )),
            ProjectError::DatabaseError(err) => ApiError::DatabaseError(err),
        }
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::ProjectNotFound(id) => {
                ApiError::NotFound(format!("Project {} not found", id))
            }
            WorkflowError::RunNotFound(id) => ApiError::NotFound(format!("Run {} not found", id)),
            WorkflowError::OutputNotFound(id) => {
                ApiError::NotFound(format!("Output {} not found", id))
            }
            WorkflowError::RateLimited(limit) => ApiError::TooManyRequests(format!(
                "Rate limit exceeded: at most {} runs per {} seconds",
                limit.max_runs,
                limit.window.as_secs()
            )),
            WorkflowError::ValidationError(msg) => ApiError::BadRequest(msg),
            WorkflowError::DatabaseError(err) => ApiError::DatabaseError(err),
            WorkflowError::StoreError(err) => ApiError::from(err),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RunNotFound(id) => ApiError::NotFound(format!("Run {} not found", id)),
            StoreError::Database(err) => ApiError::DatabaseError(err),
            StoreError::InvalidTransition(err) => ApiError::InternalError(err.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
