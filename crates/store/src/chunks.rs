use chunkup_protocol::ChunkName;
use chunkup_transfer::checksum_bytes;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::store::is_file;
use crate::{ChunkStore, StoreError};

/// What a chunk write did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkWrite {
    /// Bytes were persisted under the chunk name.
    Stored,
    /// A chunk with this name was already present.
    Duplicate,
    /// The upload is already merged; nothing was written.
    AlreadyMerged,
}

impl ChunkStore {
    /// Persists one chunk.
    ///
    /// A non-empty `checksum` must equal the SHA-256 hex of `data`. Bytes go
    /// to a staging file, are synced, then renamed into the hash directory,
    /// so a chunk name never refers to a partial file. Writing a name that
    /// already exists is a successful no-op.
    pub async fn write_chunk(
        &self,
        name: &ChunkName,
        data: &[u8],
        checksum: &str,
    ) -> Result<ChunkWrite, StoreError> {
        if !checksum.is_empty() && !checksum.eq_ignore_ascii_case(&checksum_bytes(data)) {
            warn!(hash = %name.hash, sequence = name.sequence, "chunk checksum mismatch");
            return Err(StoreError::ChecksumMismatch);
        }

        let _guard = self.locks.lock(&name.hash).await;

        if is_file(&self.artifact_path(&name.identity())).await? {
            debug!(
                hash = %name.hash,
                sequence = name.sequence,
                "chunk for merged upload ignored"
            );
            return Ok(ChunkWrite::AlreadyMerged);
        }

        let dir = self.chunk_dir(&name.hash);
        tokio::fs::create_dir_all(&dir).await?;

        let target = dir.join(name.to_string());
        if is_file(&target).await? {
            debug!(hash = %name.hash, sequence = name.sequence, "duplicate chunk");
            return Ok(ChunkWrite::Duplicate);
        }

        let staging = self.staging_path(&name.to_string());
        let mut file = tokio::fs::File::create(&staging).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&staging, &target).await?;

        debug!(
            hash = %name.hash,
            sequence = name.sequence,
            bytes = data.len(),
            "chunk stored"
        );
        Ok(ChunkWrite::Stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreConfig;
    use tempfile::TempDir;

    async fn store_in(dir: &TempDir) -> ChunkStore {
        ChunkStore::open(StoreConfig::new(dir.path())).await.unwrap()
    }

    fn name(s: &str) -> ChunkName {
        ChunkName::parse(s).unwrap()
    }

    #[tokio::test]
    async fn stores_bytes_verbatim() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;

        let result = store
            .write_chunk(&name("abc_1.bin"), b"hello", "")
            .await
            .unwrap();
        assert_eq!(result, ChunkWrite::Stored);
        assert_eq!(
            std::fs::read(dir.path().join("abc/abc_1.bin")).unwrap(),
            b"hello"
        );
        // Staging is left empty.
        let staged = std::fs::read_dir(dir.path().join(".staging")).unwrap();
        assert_eq!(staged.count(), 0);
    }

    #[tokio::test]
    async fn second_write_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        let n = name("abc_1.bin");

        store.write_chunk(&n, b"first", "").await.unwrap();
        let again = store.write_chunk(&n, b"first", "").await.unwrap();
        assert_eq!(again, ChunkWrite::Duplicate);

        let entries: Vec<_> = std::fs::read_dir(dir.path().join("abc")).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(std::fs::read(dir.path().join("abc/abc_1.bin")).unwrap(), b"first");
    }

    #[tokio::test]
    async fn concurrent_duplicates_store_once() {
        let dir = TempDir::new().unwrap();
        let store = std::sync::Arc::new(store_in(&dir).await);

        let mut handles = Vec::new();
        for _ in 0..6 {
            let store = std::sync::Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.write_chunk(&name("abc_2"), b"dup", "").await.unwrap()
            }));
        }
        let mut stored = 0;
        for h in handles {
            if h.await.unwrap() == ChunkWrite::Stored {
                stored += 1;
            }
        }
        assert_eq!(stored, 1);
        assert_eq!(std::fs::read(dir.path().join("abc/abc_2")).unwrap(), b"dup");
    }

    #[tokio::test]
    async fn checksum_verified() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;

        let good = checksum_bytes(b"payload");
        store.write_chunk(&name("abc_1.bin"), b"payload", &good).await.unwrap();

        let bad = "0".repeat(64);
        let result = store.write_chunk(&name("abc_2.bin"), b"payload", &bad).await;
        assert!(matches!(result, Err(StoreError::ChecksumMismatch)));
        assert!(!dir.path().join("abc/abc_2.bin").exists());
    }

    #[tokio::test]
    async fn chunk_after_merge_is_ignored() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        std::fs::write(dir.path().join("abc.bin"), b"merged").unwrap();

        let result = store.write_chunk(&name("abc_1.bin"), b"late", "").await.unwrap();
        assert_eq!(result, ChunkWrite::AlreadyMerged);
        assert!(!dir.path().join("abc").exists());
    }

    #[tokio::test]
    async fn suffixless_chunks_accumulate() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        for seq in 1..=3 {
            let n = ChunkName::parse(&format!("abc_{seq}")).unwrap();
            let result = store.write_chunk(&n, b"x", "").await.unwrap();
            assert_eq!(result, ChunkWrite::Stored);
        }
        assert_eq!(std::fs::read_dir(dir.path().join("abc")).unwrap().count(), 3);
    }

    #[tokio::test]
    async fn empty_chunk_is_stored() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        store.write_chunk(&name("abc_1"), b"", "").await.unwrap();
        assert_eq!(std::fs::read(dir.path().join("abc/abc_1")).unwrap(), b"");
    }
}
