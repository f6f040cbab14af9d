//! Transcript model and storage for Attractor runs.
//!
//! A [`Transcript`] is the append-only record of every completed turn plus the
//! run metadata; a [`TranscriptStore`] materializes it exactly once at the end
//! of a run.

pub mod store;
pub mod transcript;

pub use store::{read_transcript, transcript_file_name, FileTranscriptStore, TranscriptStore};
pub use transcript::{ConfigEcho, RunMetadata, RunOutcome, StopReason, Transcript, TurnRecord};
