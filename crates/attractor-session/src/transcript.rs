//! The in-memory record of a run: metadata, turns and outcome.

use attractor_core::{AttractorError, AttractorResult, Phase, Speaker};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Run metadata
// ---------------------------------------------------------------------------

/// The run configuration as it was when the conversation started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEcho {
    /// Model identifier sent to the endpoint.
    pub model: String,
    /// Turn budget, opener included.
    pub max_turns: u32,
    /// System prompt shared by both participants.
    pub system_prompt: String,
    /// Scripted first utterance of participant A.
    pub opening_message: String,
    /// Phrases that end the run early.
    pub stop_phrases: Vec<String>,
    /// Sampling temperature, when the backend sets one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Metadata written at the head of every persisted transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Unique identifier of the run.
    pub run_id: Uuid,
    /// Free-form experiment label.
    pub experiment: String,
    /// Wall-clock instant the run started. Also names the transcript file.
    pub started_at: DateTime<Utc>,
    /// Participant identities, in speaking order.
    pub participants: Vec<Speaker>,
    /// Configuration echo.
    pub config: ConfigEcho,
}

// ---------------------------------------------------------------------------
// Turns and outcome
// ---------------------------------------------------------------------------

/// One completed exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// Position in the transcript, contiguous from 0.
    pub turn_index: u32,
    /// Participant that produced the text.
    pub speaker: Speaker,
    /// The utterance.
    pub text: String,
    /// When the turn completed.
    pub timestamp: DateTime<Utc>,
}

/// Why a run stopped without error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StopReason {
    /// A reply contained a configured stop phrase.
    StopPhrase {
        /// The phrase that matched.
        phrase: String,
    },
    /// The turn budget was exhausted.
    MaxTurns,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The conversation reached a stop condition.
    Stopped {
        /// Which stop condition fired.
        reason: StopReason,
        /// When the run stopped.
        finished_at: DateTime<Utc>,
    },
    /// The conversation was aborted by an error.
    Failed {
        /// Index the failing turn would have had.
        turn_index: u32,
        /// Phase the error belongs to.
        phase: Phase,
        /// Rendered error message.
        error: String,
        /// When the failure was recorded.
        finished_at: DateTime<Utc>,
    },
}

// ---------------------------------------------------------------------------
// Transcript
// ---------------------------------------------------------------------------

/// Ordered, append-only record of a run.
///
/// Turn indices are assigned here, never by callers, so the sequence is
/// always `0..len`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Run metadata.
    pub metadata: RunMetadata,
    turns: Vec<TurnRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    outcome: Option<RunOutcome>,
}

impl Transcript {
    /// Creates an empty transcript stamped with the current time.
    pub fn new(experiment: impl Into<String>, config: ConfigEcho) -> Self {
        Self {
            metadata: RunMetadata {
                run_id: Uuid::new_v4(),
                experiment: experiment.into(),
                started_at: Utc::now(),
                participants: Speaker::BOTH.to_vec(),
                config,
            },
            turns: Vec::new(),
            outcome: None,
        }
    }

    /// Appends a completed turn and returns it.
    pub fn record(&mut self, speaker: Speaker, text: impl Into<String>) -> &TurnRecord {
        let turn_index = self.next_index();
        self.turns.push(TurnRecord {
            turn_index,
            speaker,
            text: text.into(),
            timestamp: Utc::now(),
        });
        &self.turns[self.turns.len() - 1]
    }

    /// Index the next recorded turn will get.
    pub fn next_index(&self) -> u32 {
        self.turns.len() as u32
    }

    /// All recorded turns, in order.
    pub fn turns(&self) -> &[TurnRecord] {
        &self.turns
    }

    /// The most recent turn.
    pub fn last(&self) -> Option<&TurnRecord> {
        self.turns.last()
    }

    /// Number of recorded turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// `true` when no turn has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// How the run ended, once known.
    pub fn outcome(&self) -> Option<&RunOutcome> {
        self.outcome.as_ref()
    }

    /// Marks the run as stopped by `reason`.
    pub fn mark_stopped(&mut self, reason: StopReason) {
        self.outcome = Some(RunOutcome::Stopped {
            reason,
            finished_at: Utc::now(),
        });
    }

    /// Records the error that aborted the run at the next turn index.
    pub fn mark_failed(&mut self, error: &AttractorError) {
        self.outcome = Some(RunOutcome::Failed {
            turn_index: self.next_index(),
            phase: error.phase(),
            error: error.to_string(),
            finished_at: Utc::now(),
        });
    }

    /// Checks that turn indices form the contiguous sequence `0..len`.
    ///
    /// Freshly built transcripts always pass; this guards documents read back
    /// from disk.
    pub fn validate(&self) -> AttractorResult<()> {
        for (expected, turn) in self.turns.iter().enumerate() {
            if turn.turn_index as usize != expected {
                return Err(AttractorError::Persistence(format!(
                    "transcript turn {expected} has index {}",
                    turn.turn_index
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
