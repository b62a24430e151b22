//! Google Gemini client
//!
//! Used for structured generation (native `responseSchema`) and for the
//! embeddings behind retrieval, whichever provider generates text.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::llm::{Embedder, GenerationError, GenerationRequest, StructuredGenerator};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Schema keywords the Gemini API refuses
const UNSUPPORTED_SCHEMA_KEYS: [&str; 2] = ["$schema", "additionalProperties"];

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    embedding_model: String,
    temperature: f32,
    base_url: String,
}

impl GeminiClient {
    pub fn new(
        client: Client,
        api_key: Option<String>,
        model: String,
        embedding_model: String,
        temperature: f32,
    ) -> Self {
        Self {
            client,
            api_key,
            model,
            embedding_model,
            temperature,
            base_url: API_BASE.to_string(),
        }
    }

    fn api_key(&self) -> Result<&str, GenerationError> {
        self.api_key
            .as_deref()
            .ok_or(GenerationError::MissingCredentials {
                provider: "gemini",
                variable: "GOOGLE_API_KEY",
            })
    }

    fn build_body(&self, request: &GenerationRequest) -> GenerateContentRequest {
        let mut generation_config = GenerationConfig {
            temperature: self.temperature,
            response_mime_type: None,
            response_schema: None,
        };

        if let Some(schema) = &request.schema {
            generation_config.response_mime_type = Some("application/json".to_string());
            generation_config.response_schema = Some(clean_schema(schema));
        }

        GenerateContentRequest {
            system_instruction: request.system.as_ref().map(|text| Content::text(None, text)),
            contents: vec![Content::text(Some("user"), &request.user)],
            generation_config,
        }
    }

    async fn post<B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<reqwest::Response, GenerationError> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", self.api_key()?)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Gemini request error ({}): {}", status, message);
            return Err(GenerationError::api(status.as_u16(), message));
        }

        Ok(response)
    }
}

#[async_trait]
impl StructuredGenerator for GeminiClient {
    async fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        debug!("Calling Gemini model {}", self.model);

        let response: GenerateContentResponse =
            self.post(&url, &self.build_body(request)).await?.json().await?;

        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl Embedder for GeminiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, GenerationError> {
        let url = format!(
            "{}/models/{}:embedContent",
            self.base_url, self.embedding_model
        );
        let body = EmbedContentRequest {
            content: Content::text(None, text),
        };

        let response: EmbedContentResponse = self.post(&url, &body).await?.json().await?;
        if response.embedding.values.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(response.embedding.values)
    }
}

/// Recursively drops the schema keywords Gemini rejects
pub fn clean_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, value)| {
                    // a string `title` is an annotation, an object one is a property
                    !UNSUPPORTED_SCHEMA_KEYS.contains(&key.as_str())
                        && !(key.as_str() == "title" && value.is_string())
                })
                .map(|(key, value)| (key.clone(), clean_schema(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(clean_schema).collect()),
        other => other.clone(),
    }
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    #[serde(default)]
    values: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> GeminiClient {
        GeminiClient::new(
            Client::new(),
            None,
            "gemini-1.5-flash".to_string(),
            "text-embedding-004".to_string(),
            0.3,
        )
    }

    #[test]
    fn test_clean_schema_strips_nested_keys() {
        let schema = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "title": "FinalReport",
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "steps": {
                    "type": "array",
                    "items": {"type": "object", "additionalProperties": false}
                }
            }
        });

        let cleaned = clean_schema(&schema);
        assert_eq!(
            cleaned,
            json!({
                "type": "object",
                "properties": {
                    "steps": {"type": "array", "items": {"type": "object"}}
                }
            })
        );
    }

    #[test]
    fn test_body_requests_json() {
        let request = GenerationRequest {
            system: Some("You are a product risk manager.".to_string()),
            user: "Analyze".to_string(),
            schema: Some(json!({"$schema": "x", "type": "object"})),
        };

        let body = serde_json::to_value(client().build_body(&request)).unwrap();
        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "You are a product risk manager."
        );
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(
            body["generationConfig"]["responseSchema"],
            json!({"type": "object"})
        );
    }

    #[tokio::test]
    async fn test_embed_requires_key() {
        let err = client().embed("text").await.unwrap_err();
        assert!(matches!(
            err,
            GenerationError::MissingCredentials { provider: "gemini", .. }
        ));
    }
}
