//! Built-in knowledge base
//!
//! The design-method notes the stages retrieve from, and the chunk/embed/store
//! routine that loads them into Postgres.

use sqlx::PgPool;
use tracing::info;

use crate::llm::Embedder;
use crate::repository::knowledge_repository;

pub const CHUNK_SIZE: usize = 700;
pub const CHUNK_OVERLAP: usize = 120;
/// Chunks shorter than this are not worth embedding
pub const MIN_CHUNK_CHARS: usize = 50;

#[derive(Debug, Clone, Copy)]
pub struct SeedDocument {
    pub title: &'static str,
    pub source: &'static str,
    pub tags: &'static [&'static str],
    pub content: &'static str,
}

impl SeedDocument {
    pub fn tags(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.to_string()).collect()
    }

    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        tags.is_empty() || self.tags.iter().any(|t| tags.iter().any(|q| q == t))
    }
}

pub const SEED_DOCUMENTS: [SeedDocument; 4] = [
    SeedDocument {
        title: "Functional Decomposition",
        source: "Engineering Design Methods",
        tags: &["functional_decomposition", "framework"],
        content: "Functional Decomposition is a method to break down a complex system into smaller, manageable functional parts.
It focuses on \"what\" the system must do, not \"how\" it does it.

Steps:
1. Identify the overall function (the main goal).
2. Break it down into sub-functions (inputs -> processes -> outputs).
3. Verify that sub-functions are MECE (Mutually Exclusive, Collectively Exhaustive).
4. Use \"Verb + Noun\" naming convention (e.g., \"Heat Water\", \"Filter Coffee\").

Benefits:
- Simplifies complex problems.
- Identifies necessary components.
- Facilitates innovation by focusing on function first.",
    },
    SeedDocument {
        title: "Morphological Chart",
        source: "Engineering Design Methods",
        tags: &["morphological_chart", "framework"],
        content: "A Morphological Chart (or Morphological Box) is a visualization tool for exploring solution spaces.
It maps functions to means (solutions).

Structure:
- Rows: Sub-functions identified in decomposition.
- Columns: Possible solutions (means) for each function.

Process:
1. List functions on the left.
2. Brainstorm multiple solution concepts for each function (3-5 options).
3. Combine one option from each row to form a complete system concept.

Example for \"Propel Vehicle\":
- Option A: Internal Combustion Engine
- Option B: Electric Motor
- Option C: Sail/Wind
- Option D: Human Power",
    },
    SeedDocument {
        title: "Risk and Trade-off Analysis",
        source: "Product Management Best Practices",
        tags: &["risk_tradeoffs", "framework", "checklist"],
        content: "Risk Categories to Consider:
- Technical Risk: Feasibility, complexity, durability.
- Safety Risk: Harm to user, fire, electrical shock.
- Compliance Risk: Regulations (FCC, CE, FDA).
- Supply Chain Risk: Part availability, cost fluctuations.
- Market Risk: Adoption, competition.

Trade-off Analysis:
A trade-off is a decision where improving one aspect degrades another.
Common Trade-offs:
- Cost vs. Quality
- Speed vs. Accuracy
- Battery Life vs. Performance
- Portability vs. Durability
- Complexity vs. Maintainability",
    },
    SeedDocument {
        title: "Example: Smart Coffee Maker",
        source: "Case Study",
        tags: &["example", "functional_decomposition", "morphological_chart"],
        content: "Project: Smart Coffee Maker

Functional Decomposition:
- Store Water (Tank)
- Heat Water (Heater element)
- Store Grounds (Hopper)
- Grind Beans (Burr grinder)
- Infuse Water (Brew basket)
- Filter Liquid (Mesh/Paper)
- Keep Warm (Hot plate / Thermal carafe)

Morphological Chart Options:
- Heat Water: Resistive Coil, Induction, Flow-through Heater
- Filter: Paper Filter, Metal Mesh, Centrifuge
- Keep Warm: Hot Plate (energy intensive), Vacuum Flask (passive)",
    },
];

/// Splits `text` into windows of `size` chars advancing by `size - overlap`,
/// dropping windows shorter than [`MIN_CHUNK_CHARS`]
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let step = size.saturating_sub(overlap).max(1);

    (0..chars.len())
        .step_by(step)
        .map(|start| {
            let end = (start + size).min(chars.len());
            chars[start..end].iter().collect::<String>()
        })
        .filter(|chunk| chunk.chars().count() >= MIN_CHUNK_CHARS)
        .collect()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
}

/// Replaces the stored corpus with [`SEED_DOCUMENTS`]
pub async fn ingest(pool: &PgPool, embedder: &dyn Embedder) -> anyhow::Result<IngestReport> {
    knowledge_repository::clear(pool).await?;
    info!("Cleared existing knowledge");

    let mut report = IngestReport::default();

    for doc in &SEED_DOCUMENTS {
        info!("Processing: {}", doc.title);
        let document_id =
            knowledge_repository::insert_document(pool, doc.title, doc.source, &doc.tags(), doc.content)
                .await?;

        for chunk in chunk_text(doc.content, CHUNK_SIZE, CHUNK_OVERLAP) {
            let embedding = embedder.embed(&chunk).await?;
            knowledge_repository::insert_chunk(pool, document_id, &chunk, &embedding).await?;
            report.chunks += 1;
        }
        report.documents += 1;
    }

    info!(
        "Ingestion complete: {} documents, {} chunks",
        report.documents, report.chunks
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_document_is_one_chunk() {
        let text = "a".repeat(300);
        let chunks = chunk_text(&text, CHUNK_SIZE, CHUNK_OVERLAP);
        assert_eq!(chunks, vec![text]);
    }

    #[test]
    fn test_chunks_overlap() {
        let text: String = (0..1000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunks = chunk_text(&text, CHUNK_SIZE, CHUNK_OVERLAP);

        // windows start at 0 and 580; the one at 1160 is past the end
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 700);
        assert_eq!(chunks[1].len(), 420);
        assert_eq!(&chunks[0][580..], &chunks[1][..120]);
    }

    #[test]
    fn test_tiny_tail_is_dropped() {
        let text = "x".repeat(600);
        let chunks = chunk_text(&text, CHUNK_SIZE, CHUNK_OVERLAP);
        // the tail window starting at 580 has only 20 chars
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_seed_documents_are_tagged() {
        let risk = SEED_DOCUMENTS
            .iter()
            .find(|d| d.title == "Risk and Trade-off Analysis")
            .unwrap();
        assert!(risk.has_any_tag(&["risk_tradeoffs".to_string()]));
        assert!(!risk.has_any_tag(&["example".to_string()]));
        assert!(risk.has_any_tag(&[]));
    }
}
