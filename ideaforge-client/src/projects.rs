//! Project endpoints

use crate::IdeaforgeClient;
use crate::error::Result;
use ideaforge_core::domain::project::Project;
use ideaforge_core::dto::project::{CreateProject, ProjectDetail, ProjectSummary};
use uuid::Uuid;

impl IdeaforgeClient {
    /// Create a project in the current session
    pub async fn create_project(&self, req: CreateProject) -> Result<Project> {
        let request = self.authorized(self.client.post(self.url("/projects")))?;
        let response = request.json(&req).send().await?;

        self.handle_response(response).await
    }

    /// List the session's projects with their latest run
    pub async fn list_projects(&self) -> Result<Vec<ProjectSummary>> {
        let request = self.authorized(self.client.get(self.url("/projects")))?;
        let response = request.send().await?;

        self.handle_response(response).await
    }

    /// Get a project with the full detail of its latest run
    pub async fn get_project(&self, id: Uuid) -> Result<ProjectDetail> {
        let request = self.authorized(self.client.get(self.url(&format!("/projects/{}", id))))?;
        let response = request.send().await?;

        self.handle_response(response).await
    }
}
