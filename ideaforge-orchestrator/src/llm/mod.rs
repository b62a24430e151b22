//! Structured generation and embeddings
//!
//! Stage functions talk to the model through two capability traits:
//! [`StructuredGenerator`] turns a prompt (optionally constrained by a JSON
//! schema) into raw text, and [`Embedder`] turns text into a vector.
//! [`generate_structured`] layers contract parsing on top so stages only ever
//! see validated values.

mod gemini;
mod groq;

pub use gemini::GeminiClient;
pub use groq::GroqClient;

use async_trait::async_trait;
use ideaforge_core::contract::StageContract;
use tracing::debug;

/// A transport or provider failure while talking to the model
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provider returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("{provider} is not configured: set {variable}")]
    MissingCredentials {
        provider: &'static str,
        variable: &'static str,
    },

    #[error("provider returned no content")]
    EmptyResponse,
}

impl GenerationError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}

/// Failure of [`generate_structured`]
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// The model answered, but not with a value of the requested contract
    #[error("could not parse model output: {0}")]
    Parse(String),
}

/// One generation call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationRequest {
    pub system: Option<String>,
    pub user: String,
    /// JSON schema the answer must follow; `None` asks for free text
    pub schema: Option<serde_json::Value>,
}

#[async_trait]
pub trait StructuredGenerator: Send + Sync {
    /// Returns the raw model text for `request`
    async fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, GenerationError>;
}

/// Asks the model for a value of contract `T` and validates the answer
pub async fn generate_structured<T: StageContract>(
    generator: &dyn StructuredGenerator,
    system: &str,
    user: String,
) -> Result<T, GenerateError> {
    let request = GenerationRequest {
        system: Some(system.to_string()),
        user,
        schema: Some(T::contract_schema()),
    };

    let raw = generator.complete(&request).await?;
    debug!("{} stage: model returned {} bytes", T::STAGE, raw.len());

    parse_contract(&raw)
}

/// Parses raw model text as contract `T`, tolerating a surrounding code fence
pub fn parse_contract<T: StageContract>(raw: &str) -> Result<T, GenerateError> {
    let cleaned = strip_code_fences(raw);
    let value: serde_json::Value = serde_json::from_str(&cleaned)
        .map_err(|e| GenerateError::Parse(format!("{} output is not JSON: {}", T::STAGE, e)))?;

    T::from_value(value).map_err(|e| GenerateError::Parse(e.to_string()))
}

/// Removes a surrounding code fence, including a language tag such as `json`
///
/// The tag may sit on its own line or run straight into the body.
pub fn strip_code_fences(raw: &str) -> String {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        let body_start = rest
            .find(|c: char| c == '\n' || c == '{' || c == '[')
            .unwrap_or(rest.len());
        text = &rest[body_start..];
    }

    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }

    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ideaforge_core::contract::{FinalReport, IntakeOutput};
    use std::sync::Mutex;

    struct Canned {
        reply: String,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    impl Canned {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl StructuredGenerator for Canned {
        async fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(self.reply.clone())
        }
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{}\n```\n"), "{}");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json\n{}"), "{}");
        assert_eq!(strip_code_fences("{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn test_strip_single_line_fence() {
        assert_eq!(strip_code_fences("```json{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json [1, 2] ```"), "[1, 2]");
    }

    #[test]
    fn test_parse_contract_single_line_fence() {
        let report: FinalReport = parse_contract(
            r#"```json{"summary": "Ship it", "recommendedNextSteps": ["a"]}```"#,
        )
        .unwrap();
        assert_eq!(report.summary, "Ship it");
        assert_eq!(report.recommended_next_steps, vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn test_generate_structured_sends_schema() {
        let generator = Canned::new(
            r#"```json
{"summary": "Ship it", "recommendedNextSteps": ["Build a prototype"]}
```"#,
        );

        let report: FinalReport =
            generate_structured(&generator, "You are a consultant.", "Summarize".to_string())
                .await
                .unwrap();

        assert_eq!(report.summary, "Ship it");
        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen[0].system.as_deref(), Some("You are a consultant."));
        let schema = seen[0].schema.as_ref().unwrap();
        assert!(schema["properties"]["recommendedNextSteps"].is_object());
    }

    #[tokio::test]
    async fn test_generate_structured_rejects_wrong_shape() {
        let generator = Canned::new(r#"{"idea": "missing fields"}"#);
        let err = generate_structured::<IntakeOutput>(&generator, "sys", "user".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::Parse(_)));
    }

    #[tokio::test]
    async fn test_generate_structured_rejects_non_json() {
        let generator = Canned::new("Sure! Here is your report.");
        let err = generate_structured::<FinalReport>(&generator, "sys", "user".to_string())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not JSON"));
    }
}
