//! The error type shared by every Attractor crate.

use crate::message::Speaker;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A convenience `Result` alias using [`AttractorError`].
pub type AttractorResult<T> = Result<T, AttractorError>;

/// Top-level error type for Attractor.
///
/// Each variant belongs to one [`Phase`] of a run so the operator can tell
/// whether setup, the model endpoint, or the final write went wrong.
#[derive(Error, Debug)]
pub enum AttractorError {
    /// Invalid or missing run inputs. Raised before any request is sent.
    #[error("Config error: {0}")]
    Config(String),

    /// The model endpoint call failed, returned a non-success status, or timed out.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The model endpoint answered without usable text.
    #[error("Empty reply from participant {speaker}")]
    EmptyReply {
        /// Participant whose turn produced the empty reply.
        speaker: Speaker,
    },

    /// Writing or reading a persisted transcript failed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The phase of a run an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Configuration and participant setup.
    Setup,
    /// Request/response exchange with the model endpoint.
    Transport,
    /// Transcript serialization and storage.
    Persistence,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Setup => "setup",
            Phase::Transport => "transport",
            Phase::Persistence => "persistence",
        };
        f.write_str(name)
    }
}

impl AttractorError {
    /// Returns the phase this error belongs to.
    pub fn phase(&self) -> Phase {
        match self {
            AttractorError::Config(_) => Phase::Setup,
            AttractorError::Transport(_) | AttractorError::EmptyReply { .. } => Phase::Transport,
            AttractorError::Persistence(_) | AttractorError::Json(_) | AttractorError::Io(_) => {
                Phase::Persistence
            }
        }
    }
}
