//! Stage 5: Final Report

use ideaforge_core::contract::FinalReport;
use ideaforge_core::domain::stage::Stage;
use ideaforge_core::state::{PipelineState, StageUpdate};

use super::{bullet_list, require_intake};
use crate::llm::generate_structured;
use crate::pipeline::{StageContext, StageError};
use crate::retrieval::{RetrievalQuery, citation_ids, context_text};

pub const SYSTEM_PROMPT: &str = "You are a senior product strategy consultant.";
pub const TAGS: [&str; 1] = ["example"];
pub const TOP_K: usize = 2;

pub fn retrieval_query(state: &PipelineState) -> RetrievalQuery {
    RetrievalQuery::new(format!(
        "product development next steps prototyping {}",
        state.idea_text
    ))
    .with_tags(&TAGS)
    .with_top_k(TOP_K)
}

fn findings(state: &PipelineState) -> String {
    let mut sections = Vec::new();

    if let Some(functional) = &state.functional {
        sections.push(format!(
            "Overall function: {}\nSub-functions:\n{}",
            functional.overall_function,
            bullet_list(functional.sub_functions.iter().map(|sf| sf.function.as_str()))
        ));
    }

    if let Some(risks) = &state.risks {
        let lines: Vec<String> = risks
            .risks
            .iter()
            .map(|r| format!("[{}] {} (mitigation: {})", r.category, r.risk, r.mitigation))
            .collect();
        sections.push(format!(
            "Key risks:\n{}",
            bullet_list(lines.iter().map(String::as_str))
        ));
    }

    sections.join("\n\n")
}

pub fn build_prompt(state: &PipelineState, context: &str) -> Result<String, StageError> {
    let intake = require_intake(state, Stage::Final)?;

    Ok(format!(
        r#"Generate a final executive summary and recommended next steps for the project: "{idea}"

Summarize the key findings from Functional Decomposition and Risk Analysis.
{findings}

Provide 5 clear, actionable next steps for the innovator (e.g. "Build a rough cardboard prototype", "Survey 10 potential users").

Reference Context:
{context}"#,
        idea = intake.cleaned_idea,
        findings = findings(state),
        context = context,
    ))
}

pub async fn run(state: &PipelineState, ctx: &StageContext) -> Result<StageUpdate, StageError> {
    require_intake(state, Stage::Final)?;

    let chunks = ctx.retriever.retrieve(&retrieval_query(state)).await;
    let prompt = build_prompt(state, &context_text(&chunks))?;

    let output: FinalReport =
        generate_structured(ctx.generator.as_ref(), SYSTEM_PROMPT, prompt).await?;

    Ok(StageUpdate::new(output, citation_ids(&chunks)))
}
