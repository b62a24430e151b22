//! Seeds the knowledge base with the built-in design-method documents.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ideaforge_orchestrator::config::Config;
use ideaforge_orchestrator::db;
use ideaforge_orchestrator::knowledge;
use ideaforge_orchestrator::llm::GeminiClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ideaforge_orchestrator=info,ideaforge_ingest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to read configuration")?;
    if config.google_api_key.is_none() {
        anyhow::bail!("GOOGLE_API_KEY is required to embed the knowledge base");
    }

    let pool = db::create_pool(&config.database_url)
        .await
        .context("Failed to create database pool")?;
    db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let http = reqwest::Client::builder()
        .timeout(config.llm_timeout)
        .build()
        .context("Failed to build HTTP client")?;
    let embedder = GeminiClient::new(
        http,
        config.google_api_key.clone(),
        config.gemini_model.clone(),
        config.embedding_model.clone(),
        config.temperature,
    );

    tracing::info!("Starting ingestion...");
    let report = knowledge::ingest(&pool, &embedder)
        .await
        .context("Ingestion failed")?;

    println!(
        "Ingested {} documents ({} chunks)",
        report.documents, report.chunks
    );
    Ok(())
}
