#![allow(dead_code)]

use attractor_agent::{ConversationConfig, LlmBackend, LlmClient};
use attractor_core::{AttractorResult, Message};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Backend double that replays scripted replies and remembers every history
/// it was sent. Once the script runs out it answers with a numbered filler.
pub struct ScriptedBackend {
    script: Mutex<VecDeque<AttractorResult<String>>>,
    requests: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl ScriptedBackend {
    pub fn new(script: Vec<AttractorResult<String>>) -> (Self, Arc<Mutex<Vec<Vec<Message>>>>) {
        let requests = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                script: Mutex::new(script.into()),
                requests: requests.clone(),
            },
            requests,
        )
    }

    pub fn client(script: Vec<AttractorResult<String>>) -> (LlmClient, Arc<Mutex<Vec<Vec<Message>>>>) {
        let (backend, requests) = Self::new(script);
        (LlmClient::from_backend(Box::new(backend)), requests)
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn complete(&self, history: &[Message]) -> AttractorResult<String> {
        let n = {
            let mut requests = self.requests.lock();
            requests.push(history.to_vec());
            requests.len()
        };
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("Filler reply {n}.")))
    }

    fn model_id(&self) -> &str {
        "scripted"
    }
}

pub fn conversation(max_turns: u32, stop_phrases: &[&str]) -> ConversationConfig {
    ConversationConfig {
        experiment: "test".to_string(),
        system_prompt: "Discuss philosophy.".to_string(),
        opening_message: "Hello, what is consciousness?".to_string(),
        max_turns,
        stop_phrases: stop_phrases.iter().map(|s| s.to_string()).collect(),
        turn_delay_ms: 0,
    }
}
