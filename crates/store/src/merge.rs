use std::path::PathBuf;

use chunkup_protocol::types::validate_hash;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::store::is_dir;
use crate::{ChunkStore, StoreError};

/// Result of a successful merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedArtifact {
    /// `<hash>[.<suffix>]`.
    pub file_name: String,
    /// Filesystem location of the artifact.
    pub path: PathBuf,
    /// Address reported to clients.
    pub public_path: String,
    /// Total artifact size in bytes.
    pub bytes: u64,
    /// Number of chunks concatenated.
    pub chunks: usize,
}

impl ChunkStore {
    /// Concatenates the chunks of `hash` in sequence order into the artifact
    /// and removes the chunk directory.
    ///
    /// Each chunk is deleted right after it has been appended. The artifact
    /// is assembled in the staging area and renamed into place once synced,
    /// so its presence always means a complete merge. Fails with
    /// [`StoreError::NotFound`] when no chunk directory exists.
    pub async fn merge(&self, hash: &str) -> Result<MergedArtifact, StoreError> {
        validate_hash(hash)?;
        let _guard = self.locks.lock(hash).await;

        let dir = self.chunk_dir(hash);
        if !is_dir(&dir).await? {
            return Err(StoreError::NotFound(format!("no chunks for {hash}")));
        }

        let chunks = self.list_chunks(&dir, hash).await?;
        let Some(first) = chunks.first() else {
            return Err(StoreError::NotFound(format!(
                "chunk directory for {hash} is empty"
            )));
        };
        if chunks.windows(2).any(|w| w[0].sequence == w[1].sequence) {
            return Err(StoreError::Malformed(format!(
                "duplicate sequence numbers for {hash}"
            )));
        }
        let gap_free = chunks
            .iter()
            .enumerate()
            .all(|(i, c)| c.sequence as usize == i + 1);
        if !gap_free {
            warn!(hash, chunks = chunks.len(), "merging a chunk set with gaps");
        }

        let file_name = first.artifact_name();
        let staging = self.staging_path(&format!("{file_name}.merge"));
        let mut artifact = tokio::fs::File::create(&staging).await?;
        let mut bytes = 0u64;

        for name in &chunks {
            let path = dir.join(name.to_string());
            let mut chunk = tokio::fs::File::open(&path).await?;
            bytes += tokio::io::copy(&mut chunk, &mut artifact).await?;
            drop(chunk);
            tokio::fs::remove_file(&path).await?;
        }

        artifact.flush().await?;
        artifact.sync_all().await?;
        drop(artifact);

        // The directory goes first: a suffixless artifact takes its path.
        tokio::fs::remove_dir_all(&dir).await?;
        let path = self.config.upload_root.join(&file_name);
        tokio::fs::rename(&staging, &path).await?;

        info!(hash, chunks = chunks.len(), bytes, artifact = %file_name, "chunks merged");

        Ok(MergedArtifact {
            public_path: self.public_path(&file_name),
            file_name,
            path,
            bytes,
            chunks: chunks.len(),
        })
    }
}
