//! Durable storage for finished transcripts.

use crate::transcript::Transcript;
use attractor_core::{AttractorError, AttractorResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{error, info};

/// Writes a finished [`Transcript`] to durable storage and reads it back.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Persists the transcript once and returns where it was written.
    async fn finalize(&self, transcript: &Transcript) -> AttractorResult<PathBuf>;

    /// Reads a previously finalized transcript.
    async fn load(&self, path: &Path) -> AttractorResult<Transcript>;
}

/// File name for a run started at `started_at`. Names sort in start order.
pub fn transcript_file_name(started_at: DateTime<Utc>) -> String {
    format!("conversation_{}.json", started_at.format("%Y%m%d_%H%M%S"))
}

fn persistence(path: &Path, action: &str, e: impl std::fmt::Display) -> AttractorError {
    AttractorError::Persistence(format!("Failed to {action} '{}': {e}", path.display()))
}

/// JSON-file transcript store.
///
/// Each transcript goes to its own pretty-printed JSON document. Files are
/// opened with create-new semantics: an existing transcript is never
/// overwritten, and a partially written file is left for the operator.
pub struct FileTranscriptStore {
    dir: PathBuf,
    output_path: Option<PathBuf>,
}

impl FileTranscriptStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    pub async fn new(dir: PathBuf) -> AttractorResult<Self> {
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| persistence(&dir, "create transcript directory", e))?;
        Ok(Self {
            dir,
            output_path: None,
        })
    }

    /// Writes to `path` instead of a timestamped file under the store directory.
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Where `transcript` will be written.
    pub fn transcript_path(&self, transcript: &Transcript) -> PathBuf {
        match &self.output_path {
            Some(path) => path.clone(),
            None => self
                .dir
                .join(transcript_file_name(transcript.metadata.started_at)),
        }
    }
}

#[async_trait]
impl TranscriptStore for FileTranscriptStore {
    async fn finalize(&self, transcript: &Transcript) -> AttractorResult<PathBuf> {
        let path = self.transcript_path(transcript);
        let mut json = serde_json::to_string_pretty(transcript)?;
        json.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| persistence(&path, "create transcript", e))?;

        let written: std::io::Result<()> = async {
            file.write_all(json.as_bytes()).await?;
            file.flush().await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            error!(path = %path.display(), error = %e, "Transcript write incomplete, file left in place");
            return Err(persistence(&path, "write transcript", e));
        }

        info!(
            path = %path.display(),
            run_id = %transcript.metadata.run_id,
            turns = transcript.len(),
            "Transcript finalized"
        );
        Ok(path)
    }

    async fn load(&self, path: &Path) -> AttractorResult<Transcript> {
        read_transcript(path).await
    }
}

/// Reads and validates a finalized transcript without touching any directory.
pub async fn read_transcript(path: &Path) -> AttractorResult<Transcript> {
    let data = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| persistence(path, "read transcript", e))?;
    let transcript: Transcript =
        serde_json::from_str(&data).map_err(|e| persistence(path, "parse transcript", e))?;
    transcript.validate()?;
    Ok(transcript)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
