//! Stage 4: Risks & Trade-offs

use ideaforge_core::contract::{MorphologicalChart, RisksTradeoffs};
use ideaforge_core::domain::stage::Stage;
use ideaforge_core::state::{PipelineState, StageUpdate};

use super::{bullet_list, require_intake};
use crate::llm::generate_structured;
use crate::pipeline::{StageContext, StageError};
use crate::retrieval::{RetrievalQuery, citation_ids, context_text};

pub const SYSTEM_PROMPT: &str = "You are a product risk manager.";
pub const TAGS: [&str; 1] = ["risk_tradeoffs"];
pub const TOP_K: usize = 4;

pub fn retrieval_query(state: &PipelineState) -> RetrievalQuery {
    RetrievalQuery::new(format!("risk analysis checklist {}", state.idea_text))
        .with_tags(&TAGS)
        .with_top_k(TOP_K)
}

fn chart_summary(chart: &MorphologicalChart) -> String {
    let rows: Vec<String> = chart
        .function_alternatives
        .iter()
        .map(|row| {
            let options: Vec<&str> = row.alternatives.iter().map(|a| a.option.as_str()).collect();
            format!("{}: {}", row.function, options.join(", "))
        })
        .collect();
    bullet_list(rows.iter().map(String::as_str))
}

pub fn build_prompt(state: &PipelineState, context: &str) -> Result<String, StageError> {
    let intake = require_intake(state, Stage::Risks)?;
    let alternatives = state
        .morphological
        .as_ref()
        .map(chart_summary)
        .unwrap_or_default();

    Ok(format!(
        r#"Analyze the risks and key trade-offs for the conceptual design of: "{idea}"

Consider the alternatives proposed in the morphological chart:
{alternatives}

1. Identify at least 5 key risks across Technical, Safety, Market, and Compliance categories. Provide mitigations.
2. Identify 3 critical design trade-offs (e.g. Cost vs Quality).

Reference Material:
{context}"#,
        idea = intake.cleaned_idea,
        alternatives = alternatives,
        context = context,
    ))
}

pub async fn run(state: &PipelineState, ctx: &StageContext) -> Result<StageUpdate, StageError> {
    require_intake(state, Stage::Risks)?;

    let chunks = ctx.retriever.retrieve(&retrieval_query(state)).await;
    let prompt = build_prompt(state, &context_text(&chunks))?;

    let output: RisksTradeoffs =
        generate_structured(ctx.generator.as_ref(), SYSTEM_PROMPT, prompt).await?;

    Ok(StageUpdate::new(output, citation_ids(&chunks)))
}
