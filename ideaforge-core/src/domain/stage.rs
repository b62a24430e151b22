//! Stage domain types

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One of the five fixed pipeline stages.
///
/// Declaration order is execution order, so `Ord` sorts stages the way the
/// pipeline runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Intake,
    Functional,
    Morphological,
    Risks,
    Final,
}

impl Stage {
    /// All stages in execution order
    pub const ALL: [Stage; 5] = [
        Stage::Intake,
        Stage::Functional,
        Stage::Morphological,
        Stage::Risks,
        Stage::Final,
    ];

    /// Stable tag used for persistence and on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Intake => "INTAKE",
            Stage::Functional => "FUNCTIONAL",
            Stage::Morphological => "MORPHOLOGICAL",
            Stage::Risks => "RISKS",
            Stage::Final => "FINAL",
        }
    }

    /// Human readable stage name
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Intake => "Idea Intake",
            Stage::Functional => "Functional Decomposition",
            Stage::Morphological => "Morphological Chart",
            Stage::Risks => "Risks & Trade-offs",
            Stage::Final => "Final Report",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown stage tag
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown stage: {0}")]
pub struct UnknownStage(pub String);

impl FromStr for Stage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INTAKE" => Ok(Stage::Intake),
            "FUNCTIONAL" => Ok(Stage::Functional),
            "MORPHOLOGICAL" => Ok(Stage::Morphological),
            "RISKS" => Ok(Stage::Risks),
            "FINAL" => Ok(Stage::Final),
            _ => Err(UnknownStage(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        assert!(Stage::Intake < Stage::Morphological);
        assert!(Stage::Risks < Stage::Final);
        assert_eq!(Stage::ALL.iter().max(), Some(&Stage::Final));
    }

    #[test]
    fn test_stage_round_trips_through_tag() {
        for stage in Stage::ALL {
            assert_eq!(stage.as_str().parse::<Stage>(), Ok(stage));
        }
        assert_eq!("risks".parse::<Stage>(), Ok(Stage::Risks));
        assert!("SUMMARY".parse::<Stage>().is_err());
    }

    #[test]
    fn test_stage_serializes_as_tag() {
        let json = serde_json::to_string(&Stage::Morphological).unwrap();
        assert_eq!(json, "\"MORPHOLOGICAL\"");
    }
}
