//! Stage 3: Morphological Chart
//!
//! Expands every sub-function of the decomposition into solution
//! alternatives. Refuses to run on an empty decomposition.

use ideaforge_core::contract::{FunctionalDecomposition, MorphologicalChart, SubFunction};
use ideaforge_core::state::{PipelineState, StageUpdate};
use tracing::warn;

use crate::llm::generate_structured;
use crate::pipeline::{StageContext, StageError};
use crate::retrieval::{RetrievalQuery, citation_ids, context_text};

pub const SYSTEM_PROMPT: &str = "You are an innovative design engineer.";
pub const TAGS: [&str; 1] = ["morphological_chart"];
pub const TOP_K: usize = 3;

pub const NO_SUB_FUNCTIONS: &str = "No sub-functions available for morphological analysis.";

pub fn retrieval_query(state: &PipelineState) -> RetrievalQuery {
    RetrievalQuery::new(format!("morphological chart examples {}", state.idea_text))
        .with_tags(&TAGS)
        .with_top_k(TOP_K)
}

fn sub_functions(state: &PipelineState) -> Result<&[SubFunction], StageError> {
    match state.functional.as_ref() {
        Some(FunctionalDecomposition { sub_functions, .. }) if !sub_functions.is_empty() => {
            Ok(sub_functions.as_slice())
        }
        _ => Err(StageError::Precondition(NO_SUB_FUNCTIONS.to_string())),
    }
}

pub fn build_prompt(state: &PipelineState, context: &str) -> Result<String, StageError> {
    let functions = sub_functions(state)?
        .iter()
        .map(|sf| {
            format!(
                "- ID: {}, Function: {} ({})",
                sf.id, sf.function, sf.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    Ok(format!(
        r#"Create a Morphological Chart for the product.

Sub-functions identified:
{functions}

For EACH sub-function, generate 3-5 distinct solution alternatives (means).
Include pros/cons for each alternative.
Use the sub-function ID as the functionId of its row.

Reference Material:
{context}"#,
        functions = functions,
        context = context,
    ))
}

pub async fn run(state: &PipelineState, ctx: &StageContext) -> Result<StageUpdate, StageError> {
    let expected = sub_functions(state)?;

    let chunks = ctx.retriever.retrieve(&retrieval_query(state)).await;
    let prompt = build_prompt(state, &context_text(&chunks))?;

    let output: MorphologicalChart =
        generate_structured(ctx.generator.as_ref(), SYSTEM_PROMPT, prompt).await?;

    for row in &output.function_alternatives {
        if !expected.iter().any(|sf| sf.id == row.function_id) {
            warn!(
                "Morphological row '{}' does not match any sub-function",
                row.function_id
            );
        }
    }

    Ok(StageUpdate::new(output, citation_ids(&chunks)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn state_with(sub_functions: Vec<SubFunction>) -> PipelineState {
        PipelineState::new(Uuid::new_v4(), "mug", None).apply(StageUpdate::new(
            FunctionalDecomposition {
                overall_function: "Stir Drink".to_string(),
                sub_functions,
            },
            vec![],
        ))
    }

    #[test]
    fn test_prompt_lists_sub_functions() {
        let state = state_with(vec![SubFunction {
            id: "agitate_liquid".to_string(),
            function: "Agitate Liquid".to_string(),
            description: "Move the drink".to_string(),
        }]);

        let prompt = build_prompt(&state, "").unwrap();
        assert!(prompt.contains("- ID: agitate_liquid, Function: Agitate Liquid (Move the drink)"));
    }

    #[test]
    fn test_empty_decomposition_is_rejected() {
        let err = build_prompt(&state_with(vec![]), "").unwrap_err();
        assert_eq!(err.to_string(), NO_SUB_FUNCTIONS);
    }

    #[test]
    fn test_missing_decomposition_is_rejected() {
        let state = PipelineState::new(Uuid::new_v4(), "mug", None);
        assert!(matches!(
            build_prompt(&state, ""),
            Err(StageError::Precondition(_))
        ));
    }
}
