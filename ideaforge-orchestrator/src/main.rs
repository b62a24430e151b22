use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ideaforge_orchestrator::api::{self, ApiSettings, AppState};
use ideaforge_orchestrator::config::{Config, LlmProvider, RetrievalBackend};
use ideaforge_orchestrator::db;
use ideaforge_orchestrator::llm::{Embedder, GeminiClient, GroqClient, StructuredGenerator};
use ideaforge_orchestrator::pipeline::PipelineOrchestrator;
use ideaforge_orchestrator::retrieval::{MemoryRetriever, PgVectorRetriever, Retriever};
use ideaforge_orchestrator::store::PgWorkflowStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ideaforge_orchestrator=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting IdeaForge Orchestrator...");

    let config = Config::from_env().context("Failed to read configuration")?;
    config.validate().context("Invalid configuration")?;

    if config.llm_api_key().is_none() {
        tracing::warn!(
            "No API key for {:?}; workflow runs will fail at the first stage",
            config.llm_provider
        );
    }

    tracing::info!("Connecting to database...");

    // Create database connection pool
    let pool = db::create_pool(&config.database_url)
        .await
        .context("Failed to create database pool")?;

    tracing::info!("Database connection pool created");

    // Run migrations
    db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let http = reqwest::Client::builder()
        .timeout(config.llm_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let gemini = Arc::new(GeminiClient::new(
        http.clone(),
        config.google_api_key.clone(),
        config.gemini_model.clone(),
        config.embedding_model.clone(),
        config.temperature,
    ));

    let generator: Arc<dyn StructuredGenerator> = match config.llm_provider {
        LlmProvider::Groq => Arc::new(GroqClient::new(
            http,
            config.groq_api_key.clone(),
            config.groq_model.clone(),
            config.temperature,
        )),
        LlmProvider::Gemini => gemini.clone(),
    };
    let embedder: Arc<dyn Embedder> = gemini;

    let retriever = build_retriever(&config, &pool, embedder).await;

    let orchestrator = PipelineOrchestrator::new(
        Arc::new(PgWorkflowStore::new(pool.clone())),
        generator,
        retriever,
    );

    // Build router with all API endpoints
    let app = api::create_router(AppState {
        pool,
        orchestrator,
        settings: ApiSettings::from(&config),
    });

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}

async fn build_retriever(
    config: &Config,
    pool: &sqlx::PgPool,
    embedder: Arc<dyn Embedder>,
) -> Arc<dyn Retriever> {
    match config.retrieval_backend {
        RetrievalBackend::Pgvector => Arc::new(PgVectorRetriever::new(
            pool.clone(),
            embedder,
            config.retrieval_threshold,
            config.retrieval_top_k,
        )),
        RetrievalBackend::Memory => {
            match MemoryRetriever::build(
                embedder.clone(),
                config.retrieval_threshold,
                config.retrieval_top_k,
            )
            .await
            {
                Ok(retriever) => Arc::new(retriever),
                Err(e) => {
                    tracing::warn!("Could not index knowledge base, retrieval disabled: {}", e);
                    Arc::new(MemoryRetriever::empty(
                        embedder,
                        config.retrieval_threshold,
                        config.retrieval_top_k,
                    ))
                }
            }
        }
    }
}
