//! Workflow DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::output::StageOutput;
use crate::domain::run::{Run, RunStatus};
use crate::domain::stage::Stage;

/// Request to trigger the pipeline for a project
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartWorkflow {
    pub project_id: Uuid,
}

/// Response to a trigger: the run exists and is executing in the background
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStarted {
    pub run_id: Uuid,
    pub status: RunStatus,
}

impl From<&Run> for RunStarted {
    fn from(run: &Run) -> Self {
        RunStarted {
            run_id: run.id,
            status: run.status,
        }
    }
}

/// A run together with every stage output persisted so far
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunDetail {
    #[serde(flatten)]
    pub run: Run,
    pub outputs: Vec<StageOutput>,
}

impl RunDetail {
    /// Builds the detail view, ordering outputs by pipeline position
    pub fn new(run: Run, mut outputs: Vec<StageOutput>) -> Self {
        outputs.sort_by_key(|o| o.stage);
        Self { run, outputs }
    }

    pub fn output(&self, stage: Stage) -> Option<&StageOutput> {
        self.outputs.iter().find(|o| o.stage == stage)
    }

    pub fn stages(&self) -> Vec<Stage> {
        self.outputs.iter().map(|o| o.stage).collect()
    }
}

/// Request to overlay user edits on a stage output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveEdits {
    pub output_id: Uuid,
    pub user_edits: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveEditsResponse {
    pub success: bool,
}
