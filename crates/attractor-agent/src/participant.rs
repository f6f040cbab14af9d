//! Per-participant chat histories.

use attractor_core::{Message, Speaker};

/// One side of the conversation and its first-person view of the dialogue.
///
/// The history starts with the shared system prompt; the participant's own
/// turns are `assistant` messages and the other side's turns are `user`
/// messages.
#[derive(Debug, Clone)]
pub struct Participant {
    speaker: Speaker,
    history: Vec<Message>,
}

impl Participant {
    pub(crate) fn new(speaker: Speaker, system_prompt: &str) -> Self {
        Self {
            speaker,
            history: vec![Message::system(system_prompt)],
        }
    }

    /// Both participants seeded with the same system prompt.
    pub(crate) fn pair(system_prompt: &str) -> (Self, Self) {
        (
            Self::new(Speaker::A, system_prompt),
            Self::new(Speaker::B, system_prompt),
        )
    }

    /// Which side of the conversation this is.
    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    /// The full history as this participant's model sees it.
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.history.push(message);
    }

    /// `true` when `other`'s history equals this one with user and assistant
    /// swapped.
    pub fn mirrors(&self, other: &Participant) -> bool {
        self.history.len() == other.history.len()
            && self
                .history
                .iter()
                .zip(&other.history)
                .all(|(mine, theirs)| mine.role_swapped() == *theirs)
    }
}
