//! Chat messages and participant identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The role of the author of a [`Message`], as seen by the participant
/// that owns the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A system-level instruction or prompt.
    System,
    /// Input from the other side of the conversation.
    User,
    /// Output previously produced by the history's owner.
    Assistant,
}

impl Role {
    /// Wire name used by chat-completion APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// User and assistant exchanged; system is unchanged.
    pub fn swapped(self) -> Self {
        match self {
            Role::System => Role::System,
            Role::User => Role::Assistant,
            Role::Assistant => Role::User,
        }
    }
}

/// A single entry in a participant's chat history. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    /// Creates a new message with the given role and content.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a new message with [`Role::System`].
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Creates a new message with [`Role::User`].
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates a new message with [`Role::Assistant`].
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// The role of the message author.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The textual content of the message.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// The same message as the other participant sees it.
    pub fn role_swapped(&self) -> Self {
        Self::new(self.role.swapped(), self.content.clone())
    }
}

/// Identity of one of the two conversing participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Speaker {
    /// The participant that delivers the scripted opener.
    A,
    /// The participant that answers the opener.
    B,
}

impl Speaker {
    /// Both participants, in speaking order.
    pub const BOTH: [Speaker; 2] = [Speaker::A, Speaker::B];

    /// The opposite participant.
    pub fn other(self) -> Self {
        match self {
            Speaker::A => Speaker::B,
            Speaker::B => Speaker::A,
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::A => f.write_str("A"),
            Speaker::B => f.write_str("B"),
        }
    }
}
