//! pgvector retriever

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::llm::Embedder;
use crate::repository::knowledge_repository;
use crate::retrieval::{RetrievalQuery, RetrievedChunk, Retriever};

pub struct PgVectorRetriever {
    pool: PgPool,
    embedder: Arc<dyn Embedder>,
    threshold: f64,
    default_top_k: usize,
}

impl PgVectorRetriever {
    pub fn new(
        pool: PgPool,
        embedder: Arc<dyn Embedder>,
        threshold: f64,
        default_top_k: usize,
    ) -> Self {
        Self {
            pool,
            embedder,
            threshold,
            default_top_k,
        }
    }
}

#[async_trait]
impl Retriever for PgVectorRetriever {
    async fn retrieve(&self, query: &RetrievalQuery) -> Vec<RetrievedChunk> {
        let embedding = match self.embedder.embed(&query.query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!("Retrieval skipped, embedding failed: {}", e);
                return Vec::new();
            }
        };

        let limit = query.top_k.unwrap_or(self.default_top_k) as i64;
        match knowledge_repository::search(&self.pool, &embedding, &query.tags, self.threshold, limit)
            .await
        {
            Ok(matches) => {
                debug!("Retrieved {} chunks for '{}'", matches.len(), query.query);
                matches
                    .into_iter()
                    .map(|m| RetrievedChunk {
                        id: m.id.to_string(),
                        text: m.chunk_text,
                        score: m.score,
                        document_title: Some(m.document_title),
                        metadata: m.metadata,
                    })
                    .collect()
            }
            Err(e) => {
                warn!("Semantic search failed: {}", e);
                Vec::new()
            }
        }
    }
}
