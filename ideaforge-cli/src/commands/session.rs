//! Session command handlers

use anyhow::Result;
use clap::Subcommand;
use colored::*;

use crate::config::Config;

/// Session subcommands
#[derive(Subcommand)]
pub enum SessionCommands {
    /// Create a session, or confirm the configured one is still valid
    Init,
}

pub async fn handle_session_command(command: SessionCommands, config: &Config) -> Result<()> {
    match command {
        SessionCommands::Init => init_session(config).await,
    }
}

async fn init_session(config: &Config) -> Result<()> {
    let session = config.client().init_session().await?;

    if config.session_id == Some(session.session_id) {
        println!("{} Session {} is active", "✓".green(), session.session_id);
        return Ok(());
    }

    println!(
        "{} Session created: {}",
        "✓".green(),
        session.session_id.to_string().cyan()
    );
    println!();
    println!("Use it for subsequent commands:");
    println!("  export IDEAFORGE_SESSION={}", session.session_id);

    Ok(())
}
