//! Stage 1: Idea Intake
//!
//! Restates the raw submission and pulls out objectives, constraints and
//! assumptions.

use ideaforge_core::contract::IntakeOutput;
use ideaforge_core::state::{PipelineState, StageUpdate};

use crate::llm::generate_structured;
use crate::pipeline::{StageContext, StageError};
use crate::retrieval::{RetrievalQuery, citation_ids, context_text};

pub const SYSTEM_PROMPT: &str = "You are a helpful AI assistant for product innovation.";
pub const TAGS: [&str; 2] = ["framework", "best_practices"];
pub const TOP_K: usize = 4;

const NO_CONTEXT: &str = "No knowledge base context available.";

pub fn retrieval_query(state: &PipelineState) -> RetrievalQuery {
    RetrievalQuery::new(format!("product design problem definition {}", state.idea_text))
        .with_tags(&TAGS)
        .with_top_k(TOP_K)
}

pub fn build_prompt(state: &PipelineState, context: &str) -> String {
    let domain = state
        .domain
        .as_deref()
        .map(|d| format!("Domain: {}\n", d))
        .unwrap_or_default();

    format!(
        r#"You are an expert product development assistant.
The user has a product idea: "{idea}"
{domain}
Your goal is to:
1. Clean up and clearly state the idea.
2. Identify key objectives (what success looks like).
3. Identify likely constraints (technical, physical, cost).
4. List assumptions.

Use the following engineering conceptual design principles as reference if relevant:
{context}"#,
        idea = state.idea_text,
        domain = domain,
        context = context,
    )
}

pub async fn run(state: &PipelineState, ctx: &StageContext) -> Result<StageUpdate, StageError> {
    let chunks = ctx.retriever.retrieve(&retrieval_query(state)).await;
    let context = if chunks.is_empty() {
        NO_CONTEXT.to_string()
    } else {
        context_text(&chunks)
    };

    let output: IntakeOutput = generate_structured(
        ctx.generator.as_ref(),
        SYSTEM_PROMPT,
        build_prompt(state, &context),
    )
    .await?;

    Ok(StageUpdate::new(output, citation_ids(&chunks)))
}
