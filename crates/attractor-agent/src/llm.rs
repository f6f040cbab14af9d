//! The model client injected into the driver.

use crate::backends::openai::OpenAiBackend;
use crate::backends::LlmBackend;
use crate::config::ModelConfig;
use attractor_core::{AttractorResult, Message};

/// Model client handed to the conversation driver.
///
/// Constructed once per run and injected; there is no process-wide client.
pub struct LlmClient {
    backend: Box<dyn LlmBackend>,
}

impl LlmClient {
    /// OpenAI-compatible client for `config`.
    pub fn new(config: ModelConfig) -> AttractorResult<Self> {
        Ok(Self {
            backend: Box::new(OpenAiBackend::new(config)?),
        })
    }

    /// Create from a pre-built backend (for custom providers and tests).
    pub fn from_backend(backend: Box<dyn LlmBackend>) -> Self {
        Self { backend }
    }

    /// One reply for `history`.
    pub async fn complete(&self, history: &[Message]) -> AttractorResult<String> {
        self.backend.complete(history).await
    }

    /// Model identifier of the backend.
    pub fn model_id(&self) -> &str {
        self.backend.model_id()
    }

    /// Sampling temperature of the backend, if it sends one.
    pub fn temperature(&self) -> Option<f32> {
        self.backend.temperature()
    }
}
