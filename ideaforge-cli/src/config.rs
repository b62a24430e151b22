//! Configuration module
//!
//! Connection settings shared by every command.

use ideaforge_client::IdeaforgeClient;
use uuid::Uuid;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the orchestrator service
    pub orchestrator_url: String,
    /// Session the commands act on behalf of
    pub session_id: Option<Uuid>,
}

impl Config {
    /// Client for the configured orchestrator, carrying the session if one is set
    pub fn client(&self) -> IdeaforgeClient {
        let client = IdeaforgeClient::new(&self.orchestrator_url);
        match self.session_id {
            Some(id) => client.with_session(id),
            None => client,
        }
    }
}
