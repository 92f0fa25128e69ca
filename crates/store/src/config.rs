use std::path::PathBuf;

use chunkup_protocol::constants::DEFAULT_MAX_CHUNK_COUNT;

/// Store settings, fixed for the lifetime of a [`ChunkStore`](crate::ChunkStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding chunk directories and merged artifacts.
    pub upload_root: PathBuf,
    /// Base URL prefixed to artifact names in replies. Empty means the
    /// artifact's filesystem path is reported instead.
    pub public_base: String,
    /// Highest accepted chunk sequence number.
    pub max_chunk_count: u32,
}

impl StoreConfig {
    pub fn new(upload_root: impl Into<PathBuf>) -> Self {
        Self {
            upload_root: upload_root.into(),
            ..Self::default()
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            upload_root: PathBuf::from("./upload"),
            public_base: String::new(),
            max_chunk_count: DEFAULT_MAX_CHUNK_COUNT,
        }
    }
}
