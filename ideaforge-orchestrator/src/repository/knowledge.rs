//! Knowledge Repository
//!
//! Handles database operations for the retrieval corpus: documents, their
//! chunks, and pgvector similarity search over chunk embeddings.

use sqlx::PgPool;
use uuid::Uuid;

/// Remove every document and chunk
pub async fn clear(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM knowledge_chunks").execute(pool).await?;
    sqlx::query("DELETE FROM knowledge_documents")
        .execute(pool)
        .await?;
    Ok(())
}

/// Insert a document and return its id
pub async fn insert_document(
    pool: &PgPool,
    title: &str,
    source: &str,
    tags: &[String],
    content: &str,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO knowledge_documents (id, title, source, tags, content, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(title)
    .bind(source)
    .bind(tags)
    .bind(content)
    .bind(chrono::Utc::now())
    .execute(pool)
    .await?;

    Ok(id)
}

/// Insert one embedded chunk of a document
pub async fn insert_chunk(
    pool: &PgPool,
    document_id: Uuid,
    chunk_text: &str,
    embedding: &[f32],
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO knowledge_chunks (id, document_id, chunk_text, embedding, metadata, created_at)
        VALUES ($1, $2, $3, $4::vector, '{}'::jsonb, $5)
        "#,
    )
    .bind(id)
    .bind(document_id)
    .bind(chunk_text)
    .bind(vector_literal(embedding))
    .bind(chrono::Utc::now())
    .execute(pool)
    .await?;

    Ok(id)
}

/// Chunks whose cosine similarity to `embedding` exceeds `threshold`, best first.
///
/// An empty `tags` slice disables tag filtering; otherwise the chunk's document
/// must carry at least one of the tags.
pub async fn search(
    pool: &PgPool,
    embedding: &[f32],
    tags: &[String],
    threshold: f64,
    limit: i64,
) -> Result<Vec<ChunkMatch>, sqlx::Error> {
    sqlx::query_as::<_, ChunkMatch>(
        r#"
        SELECT c.id, c.chunk_text, c.metadata, d.title AS document_title,
               1 - (c.embedding <=> $1::vector) AS score
        FROM knowledge_chunks c
        JOIN knowledge_documents d ON d.id = c.document_id
        WHERE 1 - (c.embedding <=> $1::vector) > $2
          AND (cardinality($3::text[]) = 0 OR d.tags && $3::text[])
        ORDER BY score DESC
        LIMIT $4
        "#,
    )
    .bind(vector_literal(embedding))
    .bind(threshold)
    .bind(tags)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// pgvector text representation, e.g. `[0.1,0.2,0.3]`
pub fn vector_literal(values: &[f32]) -> String {
    let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(","))
}

#[derive(Debug, sqlx::FromRow)]
pub struct ChunkMatch {
    pub id: Uuid,
    pub chunk_text: String,
    pub metadata: serde_json::Value,
    pub document_title: String,
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_literal() {
        assert_eq!(vector_literal(&[0.5, -1.0, 0.25]), "[0.5,-1,0.25]");
        assert_eq!(vector_literal(&[]), "[]");
    }
}
