//! Run command handlers
//!
//! Triggering the pipeline and following its progress.

use anyhow::{Result, bail};
use clap::Subcommand;
use colored::*;
use ideaforge_core::domain::run::RunStatus;
use ideaforge_core::domain::stage::Stage;
use ideaforge_core::dto::workflow::RunDetail;
use ideaforge_client::IdeaforgeClient;
use std::time::Duration;
use uuid::Uuid;

use crate::config::Config;
use crate::id_resolver::{resolve_project_id, resolve_run_id};

/// Run subcommands
#[derive(Subcommand)]
pub enum RunCommands {
    /// Start the pipeline for a project
    Start {
        /// Project ID or unambiguous prefix
        project: String,

        /// Follow the run until it finishes
        #[arg(short, long)]
        watch: bool,
    },
    /// Show a run and its stage outputs
    Status {
        /// Run ID or unambiguous prefix
        id: String,

        /// Print the stage outputs as JSON
        #[arg(long)]
        json: bool,
    },
    /// Follow a run until it finishes
    Watch {
        /// Run ID or unambiguous prefix
        id: String,

        /// Polling interval in seconds
        #[arg(short, long, default_value_t = 2)]
        interval: u64,
    },
}

/// Handle run commands
pub async fn handle_run_command(command: RunCommands, config: &Config) -> Result<()> {
    let client = config.client();

    match command {
        RunCommands::Start { project, watch } => {
            let project_id = resolve_project_id(&client, &project).await?;
            let started = client.start_run(project_id).await?;

            println!(
                "{} Run started: {}",
                "✓".green(),
                started.run_id.to_string().cyan()
            );

            if watch {
                println!();
                watch_run(&client, started.run_id, Duration::from_secs(2)).await
            } else {
                println!("  Follow it with: ideaforge run watch {}", started.run_id);
                Ok(())
            }
        }
        RunCommands::Status { id, json } => {
            let run_id = resolve_run_id(&client, &id).await?;
            let detail = client.get_run(run_id).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&outputs_json(&detail))?);
            } else {
                print_run_details(&detail);
            }
            Ok(())
        }
        RunCommands::Watch { id, interval } => {
            let run_id = resolve_run_id(&client, &id).await?;
            watch_run(&client, run_id, Duration::from_secs(interval.max(1))).await
        }
    }
}

/// Poll a run, printing each stage as it lands
async fn watch_run(client: &IdeaforgeClient, run_id: Uuid, interval: Duration) -> Result<()> {
    let mut reported = 0;

    let detail = client
        .wait_for_run(run_id, interval, |detail| {
            for output in detail.outputs.iter().skip(reported) {
                println!(
                    "  {} {} ({} citation(s))",
                    "✓".green(),
                    output.stage.label(),
                    output.citations.len()
                );
            }
            reported = detail.outputs.len();
        })
        .await?;

    println!();
    match detail.run.status {
        RunStatus::Failed => bail!(
            "Run failed: {}",
            detail.run.error_message.as_deref().unwrap_or("unknown error")
        ),
        _ => {
            println!("{} Run {} completed", "✓".green(), run_id);
            Ok(())
        }
    }
}

/// Effective output of every stage, keyed by stage tag
fn outputs_json(detail: &RunDetail) -> serde_json::Value {
    detail
        .outputs
        .iter()
        .map(|o| (o.stage.as_str().to_string(), o.effective_output().clone()))
        .collect::<serde_json::Map<_, _>>()
        .into()
}

/// Print a run with one line per pipeline stage
pub fn print_run_details(detail: &RunDetail) {
    let run = &detail.run;

    println!("{}", "Run Details:".bold());
    println!("  ID:       {}", run.id.to_string().cyan());
    println!("  Version:  {}", run.version);
    println!("  Status:   {}", colorize_status(&run.status));
    println!("  Started:  {}", run.started_at.format("%Y-%m-%d %H:%M:%S"));
    if let Some(finished) = run.finished_at {
        println!("  Finished: {}", finished.format("%Y-%m-%d %H:%M:%S"));
        let seconds = finished.signed_duration_since(run.started_at).num_seconds();
        println!("  Duration: {}s", seconds);
    }

    println!("\n{}", "Stages:".bold());
    for stage in Stage::ALL {
        let (marker, note) = stage_marker(detail, stage);
        println!("  {} {:<26} {}", marker, stage.label(), note);
    }

    if let Some(error) = &run.error_message {
        println!("\n{}", "Error:".bold());
        println!("{}", error.red());
    }
}

fn stage_marker(detail: &RunDetail, stage: Stage) -> (ColoredString, ColoredString) {
    if let Some(output) = detail.output(stage) {
        let edited = if output.user_edits.is_some() { ", edited" } else { "" };
        return (
            "✓".green(),
            format!("{}{}", output.id, edited).dimmed(),
        );
    }

    // The first missing stage of a failed run is where it stopped
    let first_missing = Stage::ALL.into_iter().find(|s| detail.output(*s).is_none());
    match detail.run.status {
        RunStatus::Failed if first_missing == Some(stage) => ("✗".red(), "failed".red()),
        RunStatus::Running if first_missing == Some(stage) => ("…".cyan(), "running".cyan()),
        _ => ("·".dimmed(), "".normal()),
    }
}

/// Colorize run status for display
pub fn colorize_status(status: &RunStatus) -> ColoredString {
    match status {
        RunStatus::Running => status.as_str().cyan(),
        RunStatus::Completed => status.as_str().green(),
        RunStatus::Failed => status.as_str().red(),
    }
}
