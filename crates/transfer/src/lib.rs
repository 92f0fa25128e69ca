//! Client-side file handling for chunked uploads: content fingerprinting,
//! partitioning into bounded chunk sets and lazy chunk reads.

mod chunked;
mod fingerprint;
mod split;
mod types;

pub use chunked::{ChunkReader, checksum_bytes};
pub use fingerprint::{fingerprint_bytes, fingerprint_file, fingerprint_reader};
pub use split::SplitConfig;
pub use types::{ChunkDescriptor, ChunkPayload};

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
