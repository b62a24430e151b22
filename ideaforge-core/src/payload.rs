//! Typed stage payloads
//!
//! The closed set of values a stage can produce. The variant is chosen by the
//! stage's identity, never by inspecting the JSON.

use serde::Serialize;

use crate::contract::{
    ContractError, FinalReport, FunctionalDecomposition, IntakeOutput, MorphologicalChart,
    RisksTradeoffs, StageContract,
};
use crate::domain::stage::Stage;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StagePayload {
    Intake(IntakeOutput),
    Functional(FunctionalDecomposition),
    Morphological(MorphologicalChart),
    Risks(RisksTradeoffs),
    Final(FinalReport),
}

impl StagePayload {
    pub fn stage(&self) -> Stage {
        match self {
            StagePayload::Intake(_) => Stage::Intake,
            StagePayload::Functional(_) => Stage::Functional,
            StagePayload::Morphological(_) => Stage::Morphological,
            StagePayload::Risks(_) => Stage::Risks,
            StagePayload::Final(_) => Stage::Final,
        }
    }

    /// Parses a stored or user-supplied value as the contract of `stage`
    pub fn from_json(stage: Stage, value: serde_json::Value) -> Result<Self, ContractError> {
        Ok(match stage {
            Stage::Intake => StagePayload::Intake(IntakeOutput::from_value(value)?),
            Stage::Functional => {
                StagePayload::Functional(FunctionalDecomposition::from_value(value)?)
            }
            Stage::Morphological => {
                StagePayload::Morphological(MorphologicalChart::from_value(value)?)
            }
            Stage::Risks => StagePayload::Risks(RisksTradeoffs::from_value(value)?),
            Stage::Final => StagePayload::Final(FinalReport::from_value(value)?),
        })
    }

    pub fn to_json(&self) -> Result<serde_json::Value, ContractError> {
        serde_json::to_value(self).map_err(|source| ContractError::Malformed {
            stage: self.stage(),
            source,
        })
    }

    /// JSON schema of the contract belonging to `stage`
    pub fn schema_for(stage: Stage) -> serde_json::Value {
        match stage {
            Stage::Intake => IntakeOutput::contract_schema(),
            Stage::Functional => FunctionalDecomposition::contract_schema(),
            Stage::Morphological => MorphologicalChart::contract_schema(),
            Stage::Risks => RisksTradeoffs::contract_schema(),
            Stage::Final => FinalReport::contract_schema(),
        }
    }
}

impl From<IntakeOutput> for StagePayload {
    fn from(value: IntakeOutput) -> Self {
        StagePayload::Intake(value)
    }
}

impl From<FunctionalDecomposition> for StagePayload {
    fn from(value: FunctionalDecomposition) -> Self {
        StagePayload::Functional(value)
    }
}

impl From<MorphologicalChart> for StagePayload {
    fn from(value: MorphologicalChart) -> Self {
        StagePayload::Morphological(value)
    }
}

impl From<RisksTradeoffs> for StagePayload {
    fn from(value: RisksTradeoffs) -> Self {
        StagePayload::Risks(value)
    }
}

impl From<FinalReport> for StagePayload {
    fn from(value: FinalReport) -> Self {
        StagePayload::Final(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_variant_selected_by_stage() {
        let value = json!({
            "summary": "Build it",
            "recommendedNextSteps": ["Prototype"]
        });

        let payload = StagePayload::from_json(Stage::Final, value.clone()).unwrap();
        assert_eq!(payload.stage(), Stage::Final);
        assert_eq!(payload.to_json().unwrap(), value);

        // Same JSON under the wrong stage does not coerce
        assert!(StagePayload::from_json(Stage::Intake, value).is_err());
    }

    #[test]
    fn test_schema_for_each_stage() {
        for stage in Stage::ALL {
            let schema = StagePayload::schema_for(stage);
            assert_eq!(schema["type"], "object");
        }
    }
}
