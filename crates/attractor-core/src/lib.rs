//! Core types and error definitions for Attractor.
//!
//! This crate provides the foundational types shared across all Attractor crates,
//! including error handling, chat message representations, and participant identity.
//!
//! # Main types
//!
//! - [`AttractorError`]: Unified error enum for every phase of a run.
//! - [`AttractorResult`]: Convenience alias for `Result<T, AttractorError>`.
//! - [`Role`]: Message role (system, user, assistant).
//! - [`Message`]: A single immutable entry in a participant's history.
//! - [`Speaker`]: Identity of one of the two conversing participants.

pub mod error;
pub mod message;

pub use error::{AttractorError, AttractorResult, Phase};
pub use message::{Message, Role, Speaker};
