//! Groq chat completions client
//!
//! Groq speaks the OpenAI chat-completions protocol. Its JSON mode does not
//! take a schema, so the schema is spelled out in the system prompt instead.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::llm::{GenerationError, GenerationRequest, StructuredGenerator};

const API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

#[derive(Debug, Clone)]
pub struct GroqClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    temperature: f32,
}

impl GroqClient {
    pub fn new(client: Client, api_key: Option<String>, model: String, temperature: f32) -> Self {
        Self {
            client,
            api_key,
            model,
            temperature,
        }
    }

    fn build_body(&self, request: &GenerationRequest) -> ChatRequest {
        let mut system = request
            .system
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

        if let Some(schema) = &request.schema {
            let pretty = serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string());
            system.push_str(
                "\n\nIMPORTANT: You must respond specifically with a valid JSON object strictly matching this schema:\n",
            );
            system.push_str(&pretty);
            system.push_str(
                "\n\nDo not include any markdown formatting (like ```json) in your response, just the raw JSON string.",
            );
        }

        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system,
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.user.clone(),
                },
            ],
            temperature: self.temperature,
            response_format: request.schema.as_ref().map(|_| ResponseFormat {
                kind: "json_object".to_string(),
            }),
        }
    }
}

#[async_trait]
impl StructuredGenerator for GroqClient {
    async fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GenerationError::MissingCredentials {
                provider: "groq",
                variable: "GROQ_API_KEY",
            })?;

        let body = self.build_body(request);
        debug!("Calling Groq model {}", self.model);

        let response = self
            .client
            .post(API_URL)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Groq generation error ({}): {}", status, message);
            return Err(GenerationError::api(status.as_u16(), message));
        }

        let completion: ChatResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty());

        // JSON mode with no content is treated as an empty object
        Ok(match content {
            Some(text) => text,
            None if request.schema.is_some() => "{}".to_string(),
            None => return Err(GenerationError::EmptyResponse),
        })
    }
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}
