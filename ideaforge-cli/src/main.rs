//! IdeaForge CLI
//!
//! Command-line interface for the IdeaForge orchestrator.

mod commands;
mod config;
mod id_resolver;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "ideaforge")]
#[command(about = "IdeaForge product ideation CLI", long_about = None)]
struct Cli {
    /// Orchestrator URL
    #[arg(long, env = "IDEAFORGE_URL", default_value = "http://localhost:8080")]
    url: String,

    /// Session id, as printed by `ideaforge session init`
    #[arg(long, env = "IDEAFORGE_SESSION")]
    session: Option<Uuid>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        orchestrator_url: cli.url,
        session_id: cli.session,
    };

    handle_command(cli.command, &config).await
}
