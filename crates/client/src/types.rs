//! Client configuration, progress events and results.

use chunkup_protocol::FileIdentity;
use chunkup_protocol::constants::DEFAULT_CONCURRENCY;
use chunkup_transfer::{SplitConfig, TransferError};

/// Upload settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    pub split: SplitConfig,
    /// Chunks uploaded simultaneously per batch.
    pub concurrency: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            split: SplitConfig::default(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), TransferError> {
        self.split.validate()?;
        if self.concurrency == 0 {
            return Err(TransferError::InvalidConfig(
                "concurrency must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Progress notifications emitted during an upload.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    /// The file identity is known.
    Fingerprinted { identity: FileIdentity, bytes: u64 },
    /// The server's resume state was applied to the chunk plan.
    Resumed { total: usize, already_stored: usize },
    /// One chunk was acknowledged by the server.
    ChunkSent {
        sequence: u32,
        bytes: u64,
        sent: usize,
        remaining: usize,
    },
    /// The artifact exists on the server.
    Merged { artifact_path: String },
    /// The upload failed.
    Failed { error: String },
}

/// Result of a completed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub identity: FileIdentity,
    /// Location reported by the server.
    pub artifact_path: String,
    pub file_name: String,
    /// Chunks in the full plan (0 when the server already had the file).
    pub chunks_total: usize,
    /// Chunks transferred by this run.
    pub chunks_sent: usize,
    /// `true` when the artifact came from an earlier or concurrent upload
    /// rather than this run's merge.
    pub already_merged: bool,
}
