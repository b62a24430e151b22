//! Stage output contracts
//!
//! Each stage asks the model for a value of one of these shapes. The field
//! docs double as the descriptions in the JSON schema handed to the model, so
//! they are written for the model as much as for the reader.

use schemars::JsonSchema;
use schemars::r#gen::SchemaSettings;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::stage::Stage;

/// A contract value failed to parse or failed validation
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("{stage} output is malformed: {source}")]
    Malformed {
        stage: Stage,
        #[source]
        source: serde_json::Error,
    },

    #[error("{stage} output is invalid: {reason}")]
    Invalid { stage: Stage, reason: String },
}

impl ContractError {
    pub fn invalid(stage: Stage, reason: impl Into<String>) -> Self {
        ContractError::Invalid {
            stage,
            reason: reason.into(),
        }
    }
}

/// A structured output shape bound to exactly one stage
pub trait StageContract:
    Serialize + DeserializeOwned + JsonSchema + Clone + Send + Sync + 'static
{
    const STAGE: Stage;

    /// Semantic checks the type system cannot express
    fn validate(&self) -> Result<(), ContractError>;

    /// JSON schema with every subschema inlined (no `$ref`/`definitions`)
    fn contract_schema() -> serde_json::Value {
        let settings = SchemaSettings::draft07().with(|s| {
            s.inline_subschemas = true;
        });
        let schema = settings.into_generator().into_root_schema_for::<Self>();
        serde_json::to_value(schema).unwrap_or_default()
    }

    /// Parses and validates a raw JSON value
    fn from_value(value: serde_json::Value) -> Result<Self, ContractError> {
        let parsed: Self = serde_json::from_value(value).map_err(|source| {
            ContractError::Malformed {
                stage: Self::STAGE,
                source,
            }
        })?;
        parsed.validate()?;
        Ok(parsed)
    }
}

fn require_text(stage: Stage, field: &str, value: &str) -> Result<(), ContractError> {
    if value.trim().is_empty() {
        return Err(ContractError::invalid(stage, format!("{} is empty", field)));
    }
    Ok(())
}

// =============================================================================
// Stage 1: Idea Intake
// =============================================================================

/// Structured restatement of the submitted idea.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntakeOutput {
    /// A clear, concise, and professional restatement of the user's idea.
    pub cleaned_idea: String,
    /// List of key objectives or goals for the product.
    pub objectives: Vec<String>,
    /// List of technical or market constraints.
    pub constraints: Vec<String>,
    /// List of assumptions made about the user or context.
    pub assumptions: Vec<String>,
}

impl StageContract for IntakeOutput {
    const STAGE: Stage = Stage::Intake;

    fn validate(&self) -> Result<(), ContractError> {
        require_text(Self::STAGE, "cleanedIdea", &self.cleaned_idea)
    }
}

// =============================================================================
// Stage 2: Functional Decomposition
// =============================================================================

/// One solution-neutral sub-function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SubFunction {
    /// Unique short ID for the sub-function (e.g., 'heat_water').
    pub id: String,
    /// Name of the function (Verb + Noun).
    pub function: String,
    /// Brief description of what this function achieves.
    pub description: String,
}

/// Breakdown of the product's overall function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FunctionalDecomposition {
    /// The main top-level function of the product.
    pub overall_function: String,
    /// List of sub-functions that make up the system.
    pub sub_functions: Vec<SubFunction>,
}

impl FunctionalDecomposition {
    pub fn sub_function_ids(&self) -> impl Iterator<Item = &str> {
        self.sub_functions.iter().map(|sf| sf.id.as_str())
    }
}

impl StageContract for FunctionalDecomposition {
    const STAGE: Stage = Stage::Functional;

    // An empty sub-function list is a valid decomposition; the morphological
    // stage is the one that refuses to run on it.
    fn validate(&self) -> Result<(), ContractError> {
        require_text(Self::STAGE, "overallFunction", &self.overall_function)?;

        let mut seen = std::collections::HashSet::new();
        for sf in &self.sub_functions {
            require_text(Self::STAGE, "subFunctions[].id", &sf.id)?;
            if !seen.insert(sf.id.as_str()) {
                return Err(ContractError::invalid(
                    Self::STAGE,
                    format!("duplicate sub-function id '{}'", sf.id),
                ));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Stage 3: Morphological Chart
// =============================================================================

/// One way of achieving a sub-function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MorphologicalOption {
    /// A specific solution or means to achieve the function.
    pub option: String,
    /// Advantages of this option.
    pub pros: Vec<String>,
    /// Disadvantages or limitations.
    pub cons: Vec<String>,
}

/// A chart row: the alternatives for a single sub-function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FunctionAlternatives {
    /// The ID of the sub-function this row corresponds to.
    pub function_id: String,
    /// The name of the sub-function.
    pub function: String,
    /// 3-5 different ways to implement this function.
    pub alternatives: Vec<MorphologicalOption>,
}

/// Morphological chart mapping sub-functions to solution alternatives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MorphologicalChart {
    /// The morphological chart rows.
    pub function_alternatives: Vec<FunctionAlternatives>,
}

impl MorphologicalChart {
    pub fn row(&self, function_id: &str) -> Option<&FunctionAlternatives> {
        self.function_alternatives
            .iter()
            .find(|row| row.function_id == function_id)
    }
}

impl StageContract for MorphologicalChart {
    const STAGE: Stage = Stage::Morphological;

    fn validate(&self) -> Result<(), ContractError> {
        if self.function_alternatives.is_empty() {
            return Err(ContractError::invalid(Self::STAGE, "chart has no rows"));
        }
        for row in &self.function_alternatives {
            require_text(Self::STAGE, "functionAlternatives[].functionId", &row.function_id)?;
            if row.alternatives.is_empty() {
                return Err(ContractError::invalid(
                    Self::STAGE,
                    format!("row '{}' has no alternatives", row.function_id),
                ));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Stage 4: Risks & Trade-offs
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Risk {
    /// Category of risk (e.g., Technical, Market, Safety).
    pub category: String,
    /// Description of the risk.
    pub risk: String,
    /// Proposed strategy to mitigate the risk.
    pub mitigation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tradeoff {
    /// The decision being weighed.
    pub decision: String,
    /// First option.
    pub option_a: String,
    /// Alternative option.
    pub option_b: String,
    /// Analysis of the trade-off.
    pub notes: String,
}

/// Risks and key design trade-offs of the concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RisksTradeoffs {
    /// List of identified risks.
    pub risks: Vec<Risk>,
    /// List of key design trade-offs.
    pub tradeoffs: Vec<Tradeoff>,
}

impl StageContract for RisksTradeoffs {
    const STAGE: Stage = Stage::Risks;

    fn validate(&self) -> Result<(), ContractError> {
        for risk in &self.risks {
            require_text(Self::STAGE, "risks[].risk", &risk.risk)?;
        }
        Ok(())
    }
}

// =============================================================================
// Stage 5: Final Report
// =============================================================================

/// Executive summary and next steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinalReport {
    /// Executive summary of the product concept.
    pub summary: String,
    /// Actionable next steps for the innovator.
    pub recommended_next_steps: Vec<String>,
}

impl StageContract for FinalReport {
    const STAGE: Stage = Stage::Final;

    fn validate(&self) -> Result<(), ContractError> {
        require_text(Self::STAGE, "summary", &self.summary)
    }
}
