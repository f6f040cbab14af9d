//! Endpoint and conversation settings, loaded from the `[model]` and
//! `[conversation]` tables of the run configuration.

use attractor_core::{AttractorError, AttractorResult};
use serde::{Deserialize, Serialize};

/// Chat-completion provider. All of them speak the OpenAI wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// xAI (Grok models).
    #[default]
    XAi,
    /// OpenAI.
    OpenAi,
    /// OpenRouter; sends its attribution headers.
    OpenRouter,
    /// Groq cloud inference.
    Groq,
}

/// Model endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Endpoint preset.
    #[serde(default)]
    pub provider: LlmProvider,
    /// Model name sent with every request, e.g. `grok-3`.
    pub model_id: String,
    /// Usually filled in from the environment rather than the config file.
    #[serde(default, skip_serializing)]
    pub api_key: String,
    /// Overrides the preset's base URL.
    pub api_base_url: Option<String>,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Reply length cap; the provider default when unset.
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Upper bound on a single request/response exchange.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_temperature() -> f32 {
    1.0
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl ModelConfig {
    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        if let Some(url) = &self.api_base_url {
            url.trim_end_matches('/')
        } else {
            match self.provider {
                LlmProvider::XAi => "https://api.x.ai",
                LlmProvider::OpenAi => "https://api.openai.com",
                LlmProvider::OpenRouter => "https://openrouter.ai/api",
                LlmProvider::Groq => "https://api.groq.com/openai",
            }
        }
    }
}

/// Inputs of a single conversation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Experiment name echoed into the transcript.
    #[serde(default = "default_experiment")]
    pub experiment: String,
    /// Shared system prompt of both participants.
    pub system_prompt: String,
    /// Participant A's scripted first line.
    pub opening_message: String,
    /// Turn budget. The scripted opener counts as the first turn.
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
    /// Case-insensitive phrases that end the conversation.
    #[serde(default)]
    pub stop_phrases: Vec<String>,
    /// Pause between requests, to stay under provider rate limits.
    #[serde(default)]
    pub turn_delay_ms: u64,
}

fn default_experiment() -> String {
    "Attractor State".to_string()
}

fn default_max_turns() -> u32 {
    50
}

impl ConversationConfig {
    /// Rejects inputs that cannot produce a meaningful run.
    pub fn validate(&self) -> AttractorResult<()> {
        if self.system_prompt.trim().is_empty() {
            return Err(AttractorError::Config(
                "system_prompt must not be empty".to_string(),
            ));
        }
        if self.opening_message.trim().is_empty() {
            return Err(AttractorError::Config(
                "opening_message must not be empty".to_string(),
            ));
        }
        if self.max_turns == 0 {
            return Err(AttractorError::Config(
                "max_turns must be greater than zero".to_string(),
            ));
        }
        if self.stop_phrases.iter().any(|p| p.trim().is_empty()) {
            return Err(AttractorError::Config(
                "stop_phrases must not contain empty phrases".to_string(),
            ));
        }
        Ok(())
    }
}
