//! Project DTOs

use serde::{Deserialize, Serialize};

use crate::domain::project::Project;
use crate::domain::run::Run;
use crate::dto::workflow::RunDetail;

pub const MAX_TITLE_CHARS: usize = 80;
pub const MAX_IDEA_CHARS: usize = 4000;

/// Request to create a new project
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProject {
    pub title: String,
    pub idea_text: String,
    #[serde(default)]
    pub domain: Option<String>,
}

impl CreateProject {
    pub fn validate(&self) -> Result<(), String> {
        let title = self.title.trim().chars().count();
        if title == 0 || title > MAX_TITLE_CHARS {
            return Err(format!(
                "title must be between 1 and {} characters",
                MAX_TITLE_CHARS
            ));
        }

        let idea = self.idea_text.trim().chars().count();
        if idea == 0 || idea > MAX_IDEA_CHARS {
            return Err(format!(
                "ideaText must be between 1 and {} characters",
                MAX_IDEA_CHARS
            ));
        }

        Ok(())
    }
}

/// Project listing entry with its most recent run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSummary {
    #[serde(flatten)]
    pub project: Project,
    pub latest_run: Option<Run>,
}

/// Project with the full detail of its most recent run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub latest_run: Option<RunDetail>,
}
