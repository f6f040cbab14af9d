//! Model backends and the conversation driver for Attractor.
//!
//! The [`ConversationDriver`] alternates two [`Participant`]s against a single
//! injected [`LlmClient`], recording every completed turn in a
//! [`Transcript`](attractor_session::Transcript).

pub mod backends;
pub mod config;
pub mod driver;
pub mod llm;
pub mod participant;
pub mod stop;

pub use backends::LlmBackend;
pub use config::{ConversationConfig, LlmProvider, ModelConfig};
pub use driver::{ConversationDriver, DriverState, TurnHook};
pub use llm::LlmClient;
pub use participant::Participant;
pub use stop::StopPhrases;
