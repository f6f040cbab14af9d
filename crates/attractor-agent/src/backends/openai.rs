//! OpenAI chat-completions wire format.

use super::LlmBackend;
use crate::config::{LlmProvider, ModelConfig};
use attractor_core::{AttractorError, AttractorResult, Message};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// OpenAI-compatible chat completions backend.
///
/// Works with xAI, OpenAI, OpenRouter, Groq, and any other provider
/// that implements the OpenAI chat completions API.
pub struct OpenAiBackend {
    config: ModelConfig,
    http: reqwest::Client,
}

impl OpenAiBackend {
    /// Builds the backend with a client bounded by `request_timeout_secs`.
    pub fn new(config: ModelConfig) -> AttractorResult<Self> {
        if config.model_id.trim().is_empty() {
            return Err(AttractorError::Config("model_id must not be empty".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AttractorError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    fn build_messages(&self, history: &[Message]) -> Vec<serde_json::Value> {
        history
            .iter()
            .map(|m| {
                serde_json::json!({
                    "role": m.role().as_str(),
                    "content": m.content(),
                })
            })
            .collect()
    }

    fn add_provider_headers(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json");

        // OpenRouter requires extra headers
        if matches!(self.config.provider, LlmProvider::OpenRouter) {
            request
                .header("HTTP-Referer", "https://github.com/fboiero/Attractor")
                .header("X-Title", "Attractor")
        } else {
            request
        }
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn complete(&self, history: &[Message]) -> AttractorResult<String> {
        let url = format!("{}/v1/chat/completions", self.config.base_url());

        let mut body = serde_json::json!({
            "model": self.config.model_id,
            "messages": self.build_messages(history),
            "temperature": self.config.temperature,
        });
        if let Some(max_tokens) = self.config.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        debug!(url = %url, messages = history.len(), "Sending chat completion request");

        let request = self.add_provider_headers(self.http.post(&url));

        let resp = request.json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                AttractorError::Transport(format!(
                    "request timed out after {}s",
                    self.config.request_timeout_secs
                ))
            } else {
                AttractorError::Transport(e.to_string())
            }
        })?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| AttractorError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(AttractorError::Transport(format!("API error {status}: {text}")));
        }

        let resp_body: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| AttractorError::Transport(format!("invalid response body: {e}")))?;

        parse_openai_response(&resp_body)
    }

    fn model_id(&self) -> &str {
        &self.config.model_id
    }

    fn temperature(&self) -> Option<f32> {
        Some(self.config.temperature)
    }
}

/// Extracts the reply text of the first choice.
///
/// A response without any choice is malformed; a choice without content
/// yields an empty string, which the driver rejects as an empty reply.
pub fn parse_openai_response(body: &serde_json::Value) -> AttractorResult<String> {
    let message = &body["choices"][0]["message"];
    if message.is_null() {
        return Err(AttractorError::Transport(format!(
            "response has no choices: {body}"
        )));
    }
    Ok(message["content"].as_str().unwrap_or_default().to_string())
}
