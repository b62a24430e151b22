//! Run domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// One execution of the pipeline for a project.
///
/// Structure shared between orchestrator (persists and mutates) and clients (poll).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: Uuid,
    pub project_id: Uuid,
    pub status: RunStatus,
    pub version: i32,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

/// Run execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }

    /// Only `Running -> Completed` and `Running -> Failed` are allowed.
    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        matches!(
            (self, next),
            (RunStatus::Running, RunStatus::Completed) | (RunStatus::Running, RunStatus::Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "Running",
            RunStatus::Completed => "Completed",
            RunStatus::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Running" => Ok(RunStatus::Running),
            "Completed" => Ok(RunStatus::Completed),
            "Failed" => Ok(RunStatus::Failed),
            other => Err(format!("unknown run status: {}", other)),
        }
    }
}

/// Rejected attempt to move a run out of its current status
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("run {run_id} cannot transition from {from} to {to}")]
pub struct InvalidTransition {
    pub run_id: Uuid,
    pub from: RunStatus,
    pub to: RunStatus,
}

impl Run {
    /// Creates a fresh run in the Running state
    pub fn start(project_id: Uuid, version: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            status: RunStatus::Running,
            version,
            started_at: Utc::now(),
            finished_at: None,
            error_message: None,
        }
    }

    /// Moves the run into a terminal state, stamping the finish time
    pub fn finish(
        &mut self,
        status: RunStatus,
        error_message: Option<String>,
    ) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(status) {
            return Err(InvalidTransition {
                run_id: self.id,
                from: self.status,
                to: status,
            });
        }

        self.status = status;
        self.finished_at = Some(Utc::now());
        self.error_message = error_message;
        Ok(())
    }
}
