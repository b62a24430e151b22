//! Stage 2: Functional Decomposition

use ideaforge_core::contract::FunctionalDecomposition;
use ideaforge_core::domain::stage::Stage;
use ideaforge_core::state::{PipelineState, StageUpdate};

use super::require_intake;
use crate::llm::generate_structured;
use crate::pipeline::{StageContext, StageError};
use crate::retrieval::{RetrievalQuery, citation_ids, context_text};

pub const SYSTEM_PROMPT: &str = "You are an expert systems engineer.";
pub const TAGS: [&str; 1] = ["functional_decomposition"];
pub const TOP_K: usize = 4;

pub fn retrieval_query(state: &PipelineState) -> RetrievalQuery {
    RetrievalQuery::new(format!(
        "functional decomposition method {}",
        state.idea_summary()
    ))
    .with_tags(&TAGS)
    .with_top_k(TOP_K)
}

pub fn build_prompt(state: &PipelineState, context: &str) -> Result<String, StageError> {
    let intake = require_intake(state, Stage::Functional)?;

    Ok(format!(
        r#"Perform a Functional Decomposition for the following product:
"{idea}"

Objectives: {objectives}

Follow strictly:
- Identify the Overall Function (Main Verb + Noun).
- Break it down into 5-10 sub-functions.
- Ensure sub-functions adhere to "Verb + Noun" format.
- Ensure they are action-oriented and solution-neutral (describe WHAT, not HOW).
- Give every sub-function a unique short snake_case id.

Reference Material on Method:
{context}"#,
        idea = intake.cleaned_idea,
        objectives = intake.objectives.join(", "),
        context = context,
    ))
}

pub async fn run(state: &PipelineState, ctx: &StageContext) -> Result<StageUpdate, StageError> {
    require_intake(state, Stage::Functional)?;

    let chunks = ctx.retriever.retrieve(&retrieval_query(state)).await;
    let prompt = build_prompt(state, &context_text(&chunks))?;

    let output: FunctionalDecomposition =
        generate_structured(ctx.generator.as_ref(), SYSTEM_PROMPT, prompt).await?;

    Ok(StageUpdate::new(output, citation_ids(&chunks)))
}
