//! In-process retriever over the built-in documents
//!
//! For running without pgvector. The corpus is chunked and embedded once at
//! construction; queries are scored by cosine similarity in memory.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::knowledge::{CHUNK_OVERLAP, CHUNK_SIZE, SEED_DOCUMENTS, SeedDocument, chunk_text};
use crate::llm::{Embedder, GenerationError};
use crate::retrieval::{RetrievalQuery, RetrievedChunk, Retriever, cosine_similarity};

struct IndexedChunk {
    id: String,
    text: String,
    document_title: String,
    tags: Vec<String>,
    embedding: Vec<f32>,
}

pub struct MemoryRetriever {
    embedder: Arc<dyn Embedder>,
    chunks: Vec<IndexedChunk>,
    threshold: f64,
    default_top_k: usize,
}

impl MemoryRetriever {
    /// Embeds the built-in corpus
    pub async fn build(
        embedder: Arc<dyn Embedder>,
        threshold: f64,
        default_top_k: usize,
    ) -> Result<Self, GenerationError> {
        Self::from_documents(embedder, &SEED_DOCUMENTS, threshold, default_top_k).await
    }

    pub async fn from_documents(
        embedder: Arc<dyn Embedder>,
        documents: &[SeedDocument],
        threshold: f64,
        default_top_k: usize,
    ) -> Result<Self, GenerationError> {
        let mut chunks = Vec::new();
        for doc in documents {
            for text in chunk_text(doc.content, CHUNK_SIZE, CHUNK_OVERLAP) {
                let embedding = embedder.embed(&text).await?;
                chunks.push(IndexedChunk {
                    id: Uuid::new_v4().to_string(),
                    text,
                    document_title: doc.title.to_string(),
                    tags: doc.tags(),
                    embedding,
                });
            }
        }

        info!("Indexed {} knowledge chunks in memory", chunks.len());
        Ok(Self {
            embedder,
            chunks,
            threshold,
            default_top_k,
        })
    }

    /// A retriever with nothing indexed; every query returns no chunks
    pub fn empty(embedder: Arc<dyn Embedder>, threshold: f64, default_top_k: usize) -> Self {
        Self {
            embedder,
            chunks: Vec::new(),
            threshold,
            default_top_k,
        }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[async_trait]
impl Retriever for MemoryRetriever {
    async fn retrieve(&self, query: &RetrievalQuery) -> Vec<RetrievedChunk> {
        let embedding = match self.embedder.embed(&query.query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!("Retrieval skipped, embedding failed: {}", e);
                return Vec::new();
            }
        };

        let mut scored: Vec<(f64, &IndexedChunk)> = self
            .chunks
            .iter()
            .filter(|c| query.tags.is_empty() || c.tags.iter().any(|t| query.tags.contains(t)))
            .map(|c| (cosine_similarity(&embedding, &c.embedding), c))
            .filter(|(score, _)| *score > self.threshold)
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(query.top_k.unwrap_or(self.default_top_k));

        scored
            .into_iter()
            .map(|(score, c)| RetrievedChunk {
                id: c.id.clone(),
                text: c.text.clone(),
                score,
                document_title: Some(c.document_title.clone()),
                metadata: serde_json::json!({}),
            })
            .collect()
    }
}
