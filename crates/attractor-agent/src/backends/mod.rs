//! Model endpoint backends.

pub mod openai;

use attractor_core::{AttractorResult, Message};
use async_trait::async_trait;

/// Trait for model endpoint backends.
///
/// The driver treats the endpoint as an opaque call: the full ordered history
/// goes in, one reply text comes out. Any failure, including a timeout, is an
/// [`AttractorError::Transport`](attractor_core::AttractorError::Transport).
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Requests one reply for `history`.
    async fn complete(&self, history: &[Message]) -> AttractorResult<String>;

    /// Model identifier, echoed into the transcript metadata.
    fn model_id(&self) -> &str;

    /// Sampling temperature sent with each request, if any.
    fn temperature(&self) -> Option<f32> {
        None
    }
}
