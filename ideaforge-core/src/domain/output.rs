//! Stage output domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::stage::Stage;

/// Persisted result of one stage within a run.
///
/// At most one exists per (run, stage); saving again updates it in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOutput {
    pub id: Uuid,
    pub run_id: Uuid,
    pub stage: Stage,
    /// Generated payload, shaped by the stage contract
    pub json_output: serde_json::Value,
    /// Knowledge chunk ids supplied as context to the generation call
    pub citations: Vec<String>,
    /// Overlay saved by the user on top of the generated payload
    pub user_edits: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StageOutput {
    /// The payload a reader should see: user edits win over generated output
    pub fn effective_output(&self) -> &serde_json::Value {
        self.user_edits.as_ref().unwrap_or(&self.json_output)
    }
}
