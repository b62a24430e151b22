//! Stage functions
//!
//! Each stage reads the pipeline state, retrieves supporting context,
//! asks the model for its contract and returns a [`StageUpdate`]. None of
//! them write to the store; persistence belongs to the orchestrator.

pub mod final_report;
pub mod functional;
pub mod intake;
pub mod morphological;
pub mod risks;

use ideaforge_core::contract::IntakeOutput;
use ideaforge_core::domain::stage::Stage;
use ideaforge_core::state::{PipelineState, StageUpdate};

use crate::pipeline::{StageContext, StageError};

/// Runs the stage function registered for `stage`
pub async fn run_stage(
    stage: Stage,
    state: &PipelineState,
    ctx: &StageContext,
) -> Result<StageUpdate, StageError> {
    match stage {
        Stage::Intake => intake::run(state, ctx).await,
        Stage::Functional => functional::run(state, ctx).await,
        Stage::Morphological => morphological::run(state, ctx).await,
        Stage::Risks => risks::run(state, ctx).await,
        Stage::Final => final_report::run(state, ctx).await,
    }
}

fn require_intake(state: &PipelineState, stage: Stage) -> Result<&IntakeOutput, StageError> {
    state.intake.as_ref().ok_or_else(|| {
        StageError::Precondition(format!(
            "{} stage requires the intake output",
            stage.label()
        ))
    })
}

fn bullet_list<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    items
        .into_iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}
