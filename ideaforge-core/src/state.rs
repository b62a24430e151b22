//! Pipeline state
//!
//! The value threaded through the stages of a single run. Stage functions
//! never mutate it: they return a [`StageUpdate`] and the orchestrator folds it
//! in with [`PipelineState::apply`] before the next stage runs.

use std::collections::BTreeMap;
use uuid::Uuid;

use crate::contract::{
    ContractError, FinalReport, FunctionalDecomposition, IntakeOutput, MorphologicalChart,
    RisksTradeoffs,
};
use crate::domain::output::StageOutput;
use crate::domain::stage::Stage;
use crate::payload::StagePayload;

pub const PROMPT_VERSION: &str = "1.0";

/// Output of one stage function: its payload plus the chunk ids it cited
#[derive(Debug, Clone, PartialEq)]
pub struct StageUpdate {
    pub payload: StagePayload,
    pub citations: Vec<String>,
}

impl StageUpdate {
    pub fn new(payload: impl Into<StagePayload>, citations: Vec<String>) -> Self {
        Self {
            payload: payload.into(),
            citations,
        }
    }

    pub fn stage(&self) -> Stage {
        self.payload.stage()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineState {
    pub project_id: Uuid,
    pub idea_text: String,
    pub domain: Option<String>,
    pub intake: Option<IntakeOutput>,
    pub functional: Option<FunctionalDecomposition>,
    pub morphological: Option<MorphologicalChart>,
    pub risks: Option<RisksTradeoffs>,
    pub final_report: Option<FinalReport>,
    pub citations: BTreeMap<Stage, Vec<String>>,
    pub prompt_version: String,
}

impl PipelineState {
    pub fn new(project_id: Uuid, idea_text: impl Into<String>, domain: Option<String>) -> Self {
        Self {
            project_id,
            idea_text: idea_text.into(),
            domain: domain.filter(|d| !d.trim().is_empty()),
            intake: None,
            functional: None,
            morphological: None,
            risks: None,
            final_report: None,
            citations: BTreeMap::new(),
            prompt_version: PROMPT_VERSION.to_string(),
        }
    }

    /// Returns a new state with `update` merged in
    pub fn apply(mut self, update: StageUpdate) -> Self {
        self.citations.insert(update.stage(), update.citations);
        match update.payload {
            StagePayload::Intake(v) => self.intake = Some(v),
            StagePayload::Functional(v) => self.functional = Some(v),
            StagePayload::Morphological(v) => self.morphological = Some(v),
            StagePayload::Risks(v) => self.risks = Some(v),
            StagePayload::Final(v) => self.final_report = Some(v),
        }
        self
    }

    /// Rebuilds the state of a run from its persisted outputs.
    ///
    /// Generated payloads are used, not user edits, so the result matches what
    /// the stages actually saw.
    pub fn from_outputs(
        project_id: Uuid,
        idea_text: impl Into<String>,
        domain: Option<String>,
        outputs: &[StageOutput],
    ) -> Result<Self, ContractError> {
        let mut sorted: Vec<&StageOutput> = outputs.iter().collect();
        sorted.sort_by_key(|o| o.stage);

        sorted
            .into_iter()
            .try_fold(Self::new(project_id, idea_text, domain), |state, output| {
                let payload = StagePayload::from_json(output.stage, output.json_output.clone())?;
                Ok(state.apply(StageUpdate::new(payload, output.citations.clone())))
            })
    }

    pub fn has_output(&self, stage: Stage) -> bool {
        match stage {
            Stage::Intake => self.intake.is_some(),
            Stage::Functional => self.functional.is_some(),
            Stage::Morphological => self.morphological.is_some(),
            Stage::Risks => self.risks.is_some(),
            Stage::Final => self.final_report.is_some(),
        }
    }

    pub fn completed_stages(&self) -> Vec<Stage> {
        Stage::ALL
            .into_iter()
            .filter(|s| self.has_output(*s))
            .collect()
    }

    /// The cleaned idea when intake has run, the raw submission otherwise
    pub fn idea_summary(&self) -> &str {
        self.intake
            .as_ref()
            .map(|i| i.cleaned_idea.as_str())
            .unwrap_or(&self.idea_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn intake() -> IntakeOutput {
        IntakeOutput {
            cleaned_idea: "Self-stirring temperature mug".to_string(),
            objectives: vec!["Keep coffee at a set temperature".to_string()],
            constraints: vec![],
            assumptions: vec![],
        }
    }

    #[test]
    fn test_apply_returns_merged_state() {
        let initial = PipelineState::new(Uuid::new_v4(), "a mug", None);
        let next = initial
            .clone()
            .apply(StageUpdate::new(intake(), vec!["c1".to_string()]));

        assert!(initial.intake.is_none());
        assert_eq!(next.idea_summary(), "Self-stirring temperature mug");
        assert_eq!(next.citations.get(&Stage::Intake), Some(&vec!["c1".to_string()]));
        assert_eq!(next.completed_stages(), vec![Stage::Intake]);
        assert!(!next.citations.contains_key(&Stage::Functional));
    }

    #[test]
    fn test_blank_domain_is_dropped() {
        let state = PipelineState::new(Uuid::new_v4(), "idea", Some("  ".to_string()));
        assert_eq!(state.domain, None);
        assert_eq!(state.prompt_version, PROMPT_VERSION);
    }

    #[test]
    fn test_from_outputs_rebuilds_in_stage_order() {
        let run_id = Uuid::new_v4();
        let now = Utc::now();
        let output = |stage: Stage, json_output: serde_json::Value| StageOutput {
            id: Uuid::new_v4(),
            run_id,
            stage,
            json_output,
            citations: vec![format!("{}-chunk", stage)],
            user_edits: Some(json!({ "ignored": true })),
            created_at: now,
            updated_at: now,
        };

        let outputs = vec![
            output(
                Stage::Functional,
                json!({
                    "overallFunction": "Maintain drink temperature",
                    "subFunctions": [
                        { "id": "heat", "function": "Heat Liquid", "description": "" }
                    ]
                }),
            ),
            output(Stage::Intake, serde_json::to_value(intake()).unwrap()),
        ];

        let state = PipelineState::from_outputs(Uuid::new_v4(), "a mug", None, &outputs).unwrap();

        assert_eq!(state.completed_stages(), vec![Stage::Intake, Stage::Functional]);
        assert_eq!(state.functional.unwrap().sub_functions[0].id, "heat");
        assert_eq!(
            state.citations.get(&Stage::Intake),
            Some(&vec!["INTAKE-chunk".to_string()])
        );
    }
}
