//! Edit command handler

use anyhow::{Context, Result, bail};
use colored::*;
use std::path::Path;
use uuid::Uuid;

use crate::config::Config;

/// Overlay the JSON in `file` on a stage output
pub async fn save_edits(config: &Config, output_id: Uuid, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let edits: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;

    if !edits.is_object() {
        bail!("Edits must be a JSON object");
    }

    config.client().save_edits(output_id, edits).await?;
    println!("{} Edits saved for output {}", "✓".green(), output_id);

    Ok(())
}
