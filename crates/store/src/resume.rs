use chunkup_protocol::types::{validate_hash, validate_suffix};
use chunkup_protocol::{ChunkName, FileIdentity};
use tracing::debug;

use crate::store::{is_dir, is_file};
use crate::{ChunkStore, StoreError};

/// Server-side view of an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeState {
    /// The merged artifact exists.
    AlreadyMerged { public_path: String },
    /// A chunk directory exists; received chunks ascending by sequence.
    Partial(Vec<ChunkName>),
    /// Nothing stored for this identity.
    Fresh,
}

impl ChunkStore {
    /// Reports what is already stored for `identity`.
    ///
    /// Checks, in order: merged artifact, chunk directory, nothing.
    pub async fn query(&self, identity: &FileIdentity) -> Result<ResumeState, StoreError> {
        validate_hash(&identity.hash)?;
        validate_suffix(&identity.suffix)?;

        let _guard = self.locks.lock(&identity.hash).await;

        if is_file(&self.artifact_path(identity)).await? {
            let public_path = self.public_path(&identity.artifact_name());
            debug!(hash = %identity.hash, "resume query: already merged");
            return Ok(ResumeState::AlreadyMerged { public_path });
        }

        let dir = self.chunk_dir(&identity.hash);
        if is_dir(&dir).await? {
            let chunks = self.list_chunks(&dir, &identity.hash).await?;
            debug!(hash = %identity.hash, chunks = chunks.len(), "resume query: partial");
            return Ok(ResumeState::Partial(chunks));
        }

        debug!(hash = %identity.hash, "resume query: fresh");
        Ok(ResumeState::Fresh)
    }
}
