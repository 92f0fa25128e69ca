use std::path::{Path, PathBuf};

use chunkup_protocol::{ChunkName, FileIdentity};
use tracing::info;

use crate::{HashLocks, StoreConfig, StoreError};

const STAGING_DIR: &str = ".staging";

/// Server-side owner of all chunk and artifact storage.
pub struct ChunkStore {
    pub(crate) config: StoreConfig,
    pub(crate) locks: HashLocks,
}

impl ChunkStore {
    /// Opens the store, creating the upload root and staging area if absent.
    pub async fn open(config: StoreConfig) -> Result<Self, StoreError> {
        tokio::fs::create_dir_all(config.upload_root.join(STAGING_DIR)).await?;
        info!(
            root = %config.upload_root.display(),
            max_chunks = config.max_chunk_count,
            "chunk store opened"
        );
        Ok(Self {
            config,
            locks: HashLocks::new(),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn locks(&self) -> &HashLocks {
        &self.locks
    }

    /// Decodes a received chunk file name and checks it against the
    /// configured sequence limit.
    pub fn parse_chunk_name(&self, file_name: &str) -> Result<ChunkName, StoreError> {
        let name = ChunkName::parse(file_name)?;
        if name.sequence > self.config.max_chunk_count {
            return Err(StoreError::Malformed(format!(
                "sequence {} exceeds limit {}",
                name.sequence, self.config.max_chunk_count
            )));
        }
        Ok(name)
    }

    /// Directory holding the chunks of an in-progress upload.
    pub fn chunk_dir(&self, hash: &str) -> PathBuf {
        self.config.upload_root.join(hash)
    }

    /// Location of a chunk file.
    pub fn chunk_path(&self, name: &ChunkName) -> PathBuf {
        self.chunk_dir(&name.hash).join(name.to_string())
    }

    /// Location of a merged artifact.
    pub fn artifact_path(&self, identity: &FileIdentity) -> PathBuf {
        self.config.upload_root.join(identity.artifact_name())
    }

    /// Address reported to clients for an artifact.
    pub fn public_path(&self, file_name: &str) -> String {
        let base = self.config.public_base.trim_end_matches('/');
        if base.is_empty() {
            self.config
                .upload_root
                .join(file_name)
                .to_string_lossy()
                .into_owned()
        } else {
            format!("{base}/{file_name}")
        }
    }

    pub(crate) fn staging_path(&self, file_name: &str) -> PathBuf {
        self.config.upload_root.join(STAGING_DIR).join(file_name)
    }

    /// Decoded chunk names in `dir` that belong to `hash`, ascending by
    /// sequence. Entries that do not parse are skipped.
    pub(crate) async fn list_chunks(
        &self,
        dir: &Path,
        hash: &str,
    ) -> Result<Vec<ChunkName>, StoreError> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            match ChunkName::parse(&file_name) {
                Ok(name) if name.hash == hash => names.push(name),
                _ => tracing::warn!(hash, entry = %file_name, "ignoring unexpected entry"),
            }
        }
        names.sort_by_key(|n| n.sequence);
        Ok(names)
    }
}

/// A suffixless artifact and its chunk directory share a path, so callers
/// check the entry type rather than mere existence.
pub(crate) async fn is_file(path: &Path) -> Result<bool, StoreError> {
    Ok(metadata(path).await?.is_some_and(|m| m.is_file()))
}

pub(crate) async fn is_dir(path: &Path) -> Result<bool, StoreError> {
    Ok(metadata(path).await?.is_some_and(|m| m.is_dir()))
}

async fn metadata(path: &Path) -> std::io::Result<Option<std::fs::Metadata>> {
    match tokio::fs::metadata(path).await {
        Ok(m) => Ok(Some(m)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn store_in(dir: &TempDir) -> ChunkStore {
        ChunkStore::open(StoreConfig::new(dir.path().join("upload")))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn open_creates_root_and_staging() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        assert!(store.config().upload_root.is_dir());
        assert!(dir.path().join("upload/.staging").is_dir());
    }

    #[tokio::test]
    async fn parse_respects_sequence_limit() {
        let dir = TempDir::new().unwrap();
        let mut config = StoreConfig::new(dir.path());
        config.max_chunk_count = 5;
        let store = ChunkStore::open(config).await.unwrap();

        assert!(store.parse_chunk_name("abc_5.bin").is_ok());
        assert!(matches!(
            store.parse_chunk_name("abc_6.bin"),
            Err(StoreError::Malformed(_))
        ));
        assert!(matches!(
            store.parse_chunk_name("../x_1.bin"),
            Err(StoreError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn public_path_with_and_without_base() {
        let dir = TempDir::new().unwrap();
        let mut config = StoreConfig::new(dir.path());
        config.public_base = "http://files.local:5000/".into();
        let store = ChunkStore::open(config).await.unwrap();
        assert_eq!(
            store.public_path("abc.bin"),
            "http://files.local:5000/abc.bin"
        );

        let plain = ChunkStore::open(StoreConfig::new(dir.path())).await.unwrap();
        assert_eq!(
            plain.public_path("abc.bin"),
            dir.path().join("abc.bin").to_string_lossy()
        );
    }

    #[tokio::test]
    async fn listing_sorts_numerically_and_skips_junk() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        let chunk_dir = store.chunk_dir("abc");
        std::fs::create_dir_all(&chunk_dir).unwrap();
        for name in ["abc_10.bin", "abc_2.bin", "abc_1.bin", "notes.txt", "zzz_3.bin"] {
            std::fs::write(chunk_dir.join(name), b"x").unwrap();
        }

        let names = store.list_chunks(&chunk_dir, "abc").await.unwrap();
        let seqs: Vec<u32> = names.iter().map(|n| n.sequence).collect();
        assert_eq!(seqs, vec![1, 2, 10]);
    }
}
