//! ID resolver module
//!
//! Lets users type a short, unambiguous prefix instead of a full UUID.
//! Prefixes are resolved against the session's projects and their latest runs.

use anyhow::{Context, Result, anyhow};
use ideaforge_client::IdeaforgeClient;
use uuid::Uuid;

/// Resolve a project ID or prefix to a full UUID
pub async fn resolve_project_id(client: &IdeaforgeClient, input: &str) -> Result<Uuid> {
    if let Ok(uuid) = Uuid::parse_str(input) {
        return Ok(uuid);
    }

    let projects = client
        .list_projects()
        .await
        .context("Failed to fetch projects for ID resolution")?;

    match_prefix("project", projects.iter().map(|p| p.project.id), input)
}

/// Resolve a run ID or prefix to a full UUID
///
/// Only the latest run of each project is listed by the API, so older runs
/// must be given in full.
pub async fn resolve_run_id(client: &IdeaforgeClient, input: &str) -> Result<Uuid> {
    if let Ok(uuid) = Uuid::parse_str(input) {
        return Ok(uuid);
    }

    let projects = client
        .list_projects()
        .await
        .context("Failed to fetch runs for ID resolution")?;

    match_prefix(
        "run",
        projects.iter().filter_map(|p| p.latest_run.as_ref().map(|r| r.id)),
        input,
    )
}

fn match_prefix(kind: &str, ids: impl Iterator<Item = Uuid>, prefix: &str) -> Result<Uuid> {
    let prefix = prefix.to_lowercase();
    let matches: Vec<Uuid> = ids
        .filter(|id| id.to_string().starts_with(&prefix))
        .collect();

    match matches.as_slice() {
        [] => Err(anyhow!(
            "No {} found with ID starting with '{}'",
            kind,
            prefix
        )),
        [id] => Ok(*id),
        _ => {
            let ids: Vec<String> = matches.iter().map(Uuid::to_string).collect();
            Err(anyhow!(
                "Ambiguous prefix '{}' matches multiple {}s: {}",
                prefix,
                kind,
                ids.join(", ")
            ))
        }
    }
}
