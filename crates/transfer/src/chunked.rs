use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use chunkup_protocol::FileIdentity;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::TransferError;
use crate::fingerprint::{fingerprint_reader, path_suffix};
use crate::types::{ChunkDescriptor, ChunkPayload};

/// Computes SHA-256 of `data` and returns the hex-encoded digest.
pub fn checksum_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Reads planned chunk ranges from a source file on demand.
///
/// Only the requested range is loaded, so callers control how many chunks
/// are resident at once.
pub struct ChunkReader {
    file: tokio::fs::File,
    path: PathBuf,
    file_size: u64,
}

impl ChunkReader {
    /// Opens `path` for chunk reads.
    pub async fn open(path: &Path) -> Result<Self, TransferError> {
        let file = tokio::fs::File::open(path).await?;
        let file_size = file.metadata().await?.len();
        Ok(Self {
            file,
            path: path.to_path_buf(),
            file_size,
        })
    }

    /// Fingerprints the file through this reader's handle.
    ///
    /// Only the [`file_size`](Self::file_size) bytes observed at open are
    /// hashed, so the identity and the planned chunks cover the same range.
    pub async fn fingerprint(&mut self) -> Result<FileIdentity, TransferError> {
        self.file.seek(SeekFrom::Start(0)).await?;
        let hash = fingerprint_reader((&mut self.file).take(self.file_size)).await?;
        let suffix = path_suffix(&self.path);

        tracing::debug!(path = %self.path.display(), %hash, %suffix, "fingerprinted file");
        Ok(FileIdentity { hash, suffix })
    }

    /// Reads the bytes of `descriptor` and checksums them.
    ///
    /// Fails with `UnexpectedEof` if the file shrank below the planned range.
    pub async fn read(
        &mut self,
        descriptor: &ChunkDescriptor,
    ) -> Result<ChunkPayload, TransferError> {
        self.file.seek(SeekFrom::Start(descriptor.offset)).await?;
        let mut data = vec![0u8; descriptor.len as usize];
        self.file.read_exact(&mut data).await?;

        let checksum = checksum_bytes(&data);
        Ok(ChunkPayload {
            descriptor: descriptor.clone(),
            data,
            checksum,
        })
    }

    /// Total file size in bytes, as observed at open.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SplitConfig, fingerprint_bytes};
    use std::io::Write;
    use tempfile::TempDir;

    fn identity() -> FileIdentity {
        FileIdentity {
            hash: "feed".into(),
            suffix: "txt".into(),
        }
    }

    #[test]
    fn checksum_bytes_deterministic() {
        let c1 = checksum_bytes(b"hello world");
        let c2 = checksum_bytes(b"hello world");
        assert_eq!(c1, c2);
        assert_eq!(c1.len(), 64); // SHA-256 = 64 hex chars.
        assert_ne!(checksum_bytes(b"hello"), checksum_bytes(b"world"));
    }

    #[tokio::test]
    async fn reads_planned_ranges() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.txt");
        std::fs::write(&path, b"AABBCCDDEE").unwrap();

        let config = SplitConfig {
            chunk_size: 4,
            max_chunk_count: 10,
        };
        let mut reader = ChunkReader::open(&path).await.unwrap();
        assert_eq!(reader.file_size(), 10);
        let plan = config.plan(&identity(), reader.file_size()).unwrap();

        let mut parts = Vec::new();
        for d in &plan {
            let payload = reader.read(d).await.unwrap();
            assert_eq!(payload.checksum, checksum_bytes(&payload.data));
            parts.push(payload.data);
        }
        assert_eq!(parts, vec![b"AABB".to_vec(), b"CCDD".to_vec(), b"EE".to_vec()]);
    }

    #[tokio::test]
    async fn fingerprint_covers_size_seen_at_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("growing.log");
        std::fs::write(&path, b"first line\n").unwrap();

        let mut reader = ChunkReader::open(&path).await.unwrap();
        std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap()
            .write_all(b"appended later\n")
            .unwrap();

        let id = reader.fingerprint().await.unwrap();
        assert_eq!(id.hash, fingerprint_bytes(b"first line\n"));
        assert_eq!(id.suffix, "log");

        // Chunk reads still work after hashing moved the cursor.
        let plan = SplitConfig {
            chunk_size: 4,
            max_chunk_count: 10,
        }
        .plan(&id, reader.file_size())
        .unwrap();
        assert_eq!(reader.read(&plan[0]).await.unwrap().data, b"firs");
    }

    #[tokio::test]
    async fn reads_out_of_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.txt");
        std::fs::write(&path, b"0123456789").unwrap();

        let plan = SplitConfig {
            chunk_size: 3,
            max_chunk_count: 10,
        }
        .plan(&identity(), 10)
        .unwrap();
        let mut reader = ChunkReader::open(&path).await.unwrap();

        assert_eq!(reader.read(&plan[3]).await.unwrap().data, b"9");
        assert_eq!(reader.read(&plan[1]).await.unwrap().data, b"345");
    }

    #[tokio::test]
    async fn truncated_source_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.txt");
        std::fs::write(&path, b"0123").unwrap();

        let descriptor = ChunkDescriptor {
            identity: identity(),
            sequence: 1,
            offset: 0,
            len: 10,
        };
        let mut reader = ChunkReader::open(&path).await.unwrap();
        assert!(matches!(
            reader.read(&descriptor).await,
            Err(TransferError::Io(_))
        ));
    }
}
