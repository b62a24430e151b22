//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod edit;
mod project;
mod run;
mod session;

pub use project::ProjectCommands;
pub use run::RunCommands;
pub use session::SessionCommands;

use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;
use uuid::Uuid;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Anonymous session management
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
    /// Project management
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    /// Pipeline runs
    Run {
        #[command(subcommand)]
        command: RunCommands,
    },
    /// Replace a stage output with edited JSON
    Edit {
        /// Stage output ID
        output_id: Uuid,
        /// JSON file holding the edited output
        file: PathBuf,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Session { command } => session::handle_session_command(command, config).await,
        Commands::Project { command } => project::handle_project_command(command, config).await,
        Commands::Run { command } => run::handle_run_command(command, config).await,
        Commands::Edit { output_id, file } => edit::save_edits(config, output_id, &file).await,
    }
}
