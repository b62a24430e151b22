//! API Module
//!
//! HTTP API layer for the orchestrator.
//! Each submodule handles endpoints for a specific domain.

pub mod error;
pub mod health;
pub mod project;
pub mod session;
pub mod workflow;

use axum::{
    Router,
    routing::{get, post},
};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::pipeline::PipelineOrchestrator;
use crate::service::RateLimit;

/// Per-request limits and flags taken from configuration
#[derive(Debug, Clone, Copy)]
pub struct ApiSettings {
    pub project_limit: u32,
    pub rate_limit: RateLimit,
    pub cookie_secure: bool,
}

impl From<&Config> for ApiSettings {
    fn from(config: &Config) -> Self {
        Self {
            project_limit: config.project_limit,
            rate_limit: RateLimit::new(config.run_rate_limit, config.run_rate_window),
            cookie_secure: config.cookie_secure,
        }
    }
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub orchestrator: PipelineOrchestrator,
    pub settings: ApiSettings,
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Session endpoints
        .route("/session/init", post(session::init_session))
        // Project endpoints
        .route(
            "/projects",
            get(project::list_projects).post(project::create_project),
        )
        .route("/projects/{id}", get(project::get_project))
        // Workflow endpoints
        .route("/workflow/run", post(workflow::start_run))
        .route("/workflow/run/{run_id}", get(workflow::get_run))
        .route("/workflow/saveEdits", post(workflow::save_edits))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
