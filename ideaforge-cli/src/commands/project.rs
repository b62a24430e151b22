//! Project command handlers
//!
//! Creating, listing and inspecting projects of the current session.

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use ideaforge_core::dto::project::{CreateProject, ProjectSummary};

use crate::commands::run::{colorize_status, print_run_details};
use crate::config::Config;
use crate::id_resolver::resolve_project_id;

/// Project subcommands
#[derive(Subcommand)]
pub enum ProjectCommands {
    /// Create a project from an idea
    Create {
        /// Short project title
        #[arg(short, long)]
        title: String,

        /// Free-form idea description
        idea: String,

        /// Optional domain, e.g. "kitchen appliances"
        #[arg(short, long)]
        domain: Option<String>,
    },
    /// List projects
    List,
    /// Show a project and its latest run
    Show {
        /// Project ID or unambiguous prefix
        id: String,
    },
}

/// Handle project commands
pub async fn handle_project_command(command: ProjectCommands, config: &Config) -> Result<()> {
    let client = config.client();

    match command {
        ProjectCommands::Create {
            title,
            idea,
            domain,
        } => {
            let req = CreateProject {
                title,
                idea_text: idea,
                domain,
            };
            req.validate().map_err(anyhow::Error::msg)?;

            let project = client.create_project(req).await?;
            println!(
                "{} Project created: {}",
                "✓".green(),
                project.id.to_string().cyan()
            );
            println!("  Title: {}", project.title);
            Ok(())
        }
        ProjectCommands::List => {
            let projects = client.list_projects().await?;

            if projects.is_empty() {
                println!("{}", "No projects found.".yellow());
            } else {
                println!("{}", format!("Found {} project(s):", projects.len()).bold());
                println!();
                for project in &projects {
                    print_project_summary(project);
                }
            }
            Ok(())
        }
        ProjectCommands::Show { id } => {
            let id = resolve_project_id(&client, &id).await?;
            let detail = client.get_project(id).await?;
            let project = &detail.project;

            println!("{}", "Project Details:".bold());
            println!("  ID:      {}", project.id.to_string().cyan());
            println!("  Title:   {}", project.title);
            if let Some(domain) = &project.domain {
                println!("  Domain:  {}", domain);
            }
            println!(
                "  Created: {}",
                project.created_at.format("%Y-%m-%d %H:%M:%S")
            );
            println!("\n{}", "Idea:".bold());
            println!("  {}", project.idea_text);

            match &detail.latest_run {
                Some(run) => {
                    println!();
                    print_run_details(run);
                }
                None => println!("\n{}", "No runs yet.".yellow()),
            }
            Ok(())
        }
    }
}

fn print_project_summary(summary: &ProjectSummary) {
    let project = &summary.project;

    println!("  {} {}", "▸".cyan(), project.title.bold());
    println!("    ID:      {}", project.id.to_string().dimmed());
    println!(
        "    Updated: {}",
        project
            .updated_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    match &summary.latest_run {
        Some(run) => println!(
            "    Latest:  v{} {}",
            run.version,
            colorize_status(&run.status)
        ),
        None => println!("    Latest:  {}", "never run".dimmed()),
    }
    println!();
}
