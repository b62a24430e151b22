//! Workflow endpoints

use std::time::Duration;

use crate::IdeaforgeClient;
use crate::error::Result;
use ideaforge_core::dto::workflow::{
    RunDetail, RunStarted, SaveEdits, SaveEditsResponse, StartWorkflow,
};
use uuid::Uuid;

impl IdeaforgeClient {
    // =============================================================================
    // Runs
    // =============================================================================

    /// Trigger the pipeline for a project
    ///
    /// Returns as soon as the run exists; stages execute on the server.
    pub async fn start_run(&self, project_id: Uuid) -> Result<RunStarted> {
        let request = self.authorized(self.client.post(self.url("/workflow/run")))?;
        let response = request.json(&StartWorkflow { project_id }).send().await?;

        self.handle_response(response).await
    }

    /// Get a run and every stage output saved so far
    pub async fn get_run(&self, run_id: Uuid) -> Result<RunDetail> {
        let request =
            self.authorized(self.client.get(self.url(&format!("/workflow/run/{}", run_id))))?;
        let response = request.send().await?;

        self.handle_response(response).await
    }

    /// Poll a run until it reaches a terminal status
    ///
    /// `on_update` is called with every snapshot, including the final one.
    pub async fn wait_for_run<F>(
        &self,
        run_id: Uuid,
        interval: Duration,
        mut on_update: F,
    ) -> Result<RunDetail>
    where
        F: FnMut(&RunDetail),
    {
        loop {
            let detail = self.get_run(run_id).await?;
            on_update(&detail);

            if detail.run.status.is_terminal() {
                return Ok(detail);
            }

            tracing::debug!("Run {} still {}, polling again", run_id, detail.run.status);
            tokio::time::sleep(interval).await;
        }
    }

    // =============================================================================
    // Edits
    // =============================================================================

    /// Overlay user edits on a stage output
    pub async fn save_edits(
        &self,
        output_id: Uuid,
        user_edits: serde_json::Value,
    ) -> Result<SaveEditsResponse> {
        let request = self.authorized(self.client.post(self.url("/workflow/saveEdits")))?;
        let response = request
            .json(&SaveEdits {
                output_id,
                user_edits,
            })
            .send()
            .await?;

        self.handle_response(response).await
    }
}
