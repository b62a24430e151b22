//! IdeaForge HTTP Client
//!
//! A small, typed client for the IdeaForge orchestrator API, used by the CLI.
//!
//! # Example
//!
//! ```no_run
//! use ideaforge_client::IdeaforgeClient;
//! use ideaforge_core::dto::project::CreateProject;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut client = IdeaforgeClient::new("http://localhost:8080");
//!     let session = client.init_session().await?;
//!     client.set_session(session.session_id);
//!
//!     let project = client.create_project(CreateProject {
//!         title: "Smart Mug".to_string(),
//!         idea_text: "A mug that keeps coffee at the perfect temperature".to_string(),
//!         domain: None,
//!     }).await?;
//!
//!     let started = client.start_run(project.id).await?;
//!     println!("Run {} is {}", started.run_id, started.status);
//!     Ok(())
//! }
//! ```

pub mod error;
mod projects;
mod session;
mod workflow;

pub use error::{ClientError, Result};

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Header carrying the anonymous session id
pub const SESSION_HEADER: &str = "x-session-id";

/// HTTP client for the IdeaForge orchestrator API
///
/// Every endpoint except health and session bootstrap is scoped to an
/// anonymous session, sent as the `x-session-id` header.
#[derive(Debug, Clone)]
pub struct IdeaforgeClient {
    /// Base URL of the orchestrator (e.g., "http://localhost:8080")
    base_url: String,
    /// Session the requests act on behalf of
    session_id: Option<Uuid>,
    client: Client,
}

impl IdeaforgeClient {
    /// Create a new client without a session
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session_id: None,
            client,
        }
    }

    /// Attach a session to every subsequent request
    pub fn with_session(mut self, session_id: Uuid) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn set_session(&mut self, session_id: Uuid) {
        self.session_id = Some(session_id);
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    /// Get the base URL of the orchestrator
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Adds the session header, failing if no session is configured
    fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        let session_id = self.session_id.ok_or(ClientError::MissingSession)?;
        Ok(builder.header(SESSION_HEADER, session_id.to_string()))
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code and deserialize the JSON body
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    // =============================================================================
    // Health
    // =============================================================================

    /// Check whether the orchestrator is reachable
    pub async fn health(&self) -> Result<bool> {
        let response = self.client.get(self.url("/health")).send().await?;
        Ok(response.status().is_success())
    }
}
