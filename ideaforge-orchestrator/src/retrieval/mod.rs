//! Knowledge retrieval
//!
//! Stages ask for chunks relevant to a query. Retrieval is best-effort: any
//! failure yields an empty result so a stage can still proceed without context.

mod memory;
mod pgvector;

pub use memory::MemoryRetriever;
pub use pgvector::PgVectorRetriever;

use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalQuery {
    pub query: String,
    /// Restrict to documents carrying any of these tags; empty means no filter
    pub tags: Vec<String>,
    pub top_k: Option<usize>,
}

impl RetrievalQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            tags: Vec::new(),
            top_k: None,
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub id: String,
    pub text: String,
    /// Cosine similarity to the query
    pub score: f64,
    pub document_title: Option<String>,
    pub metadata: serde_json::Value,
}

#[async_trait]
pub trait Retriever: Send + Sync {
    /// Chunks ordered by descending score; empty on any failure
    async fn retrieve(&self, query: &RetrievalQuery) -> Vec<RetrievedChunk>;
}

/// Joins chunk texts with blank lines, the form stages embed in prompts
pub fn context_text(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn citation_ids(chunks: &[RetrievedChunk]) -> Vec<String> {
    chunks.iter().map(|c| c.id.clone()).collect()
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chunk(id: &str, text: &str) -> RetrievedChunk {
        RetrievedChunk {
            id: id.to_string(),
            text: text.to_string(),
            score: 0.9,
            document_title: None,
            metadata: json!({}),
        }
    }

    #[test]
    fn test_context_and_citations() {
        let chunks = vec![chunk("a", "first"), chunk("b", "second")];
        assert_eq!(context_text(&chunks), "first\n\nsecond");
        assert_eq!(citation_ids(&chunks), vec!["a", "b"]);
        assert_eq!(context_text(&[]), "");
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-9);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-9);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_query_builder() {
        let q = RetrievalQuery::new("risk analysis checklist mug")
            .with_tags(&["risk_tradeoffs"])
            .with_top_k(4);
        assert_eq!(q.tags, vec!["risk_tradeoffs"]);
        assert_eq!(q.top_k, Some(4));
    }
}
