use chunkup_protocol::FileIdentity;
use chunkup_protocol::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CHUNK_COUNT};

use crate::TransferError;
use crate::types::ChunkDescriptor;

/// Partitioning parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitConfig {
    /// Target chunk size in bytes.
    pub chunk_size: u64,
    /// Upper bound on the number of chunks per file.
    pub max_chunk_count: u32,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_chunk_count: DEFAULT_MAX_CHUNK_COUNT,
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<(), TransferError> {
        if self.chunk_size == 0 {
            return Err(TransferError::InvalidConfig(
                "chunk_size must be greater than zero".into(),
            ));
        }
        if self.max_chunk_count == 0 {
            return Err(TransferError::InvalidConfig(
                "max_chunk_count must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Number of chunks a file of `size` bytes splits into.
    pub fn chunk_count(&self, size: u64) -> Result<u32, TransferError> {
        self.validate()?;
        if size == 0 {
            return Ok(1);
        }
        let natural = size.div_ceil(self.chunk_size);
        Ok(natural.min(u64::from(self.max_chunk_count)) as u32)
    }

    /// Partitions `[0, size)` into ordered, contiguous chunk descriptors.
    ///
    /// When the natural count `ceil(size / chunk_size)` exceeds
    /// `max_chunk_count`, the chunk size is recomputed as `size / max` and
    /// boundaries fall at `floor(i * size / max)`. The result depends only
    /// on `(size, chunk_size, max_chunk_count)`.
    pub fn plan(
        &self,
        identity: &FileIdentity,
        size: u64,
    ) -> Result<Vec<ChunkDescriptor>, TransferError> {
        let count = self.chunk_count(size)?;
        let capped = size.div_ceil(self.chunk_size) > u64::from(self.max_chunk_count);

        let boundary = |i: u32| -> u64 {
            if capped {
                (u128::from(i) * u128::from(size) / u128::from(count)) as u64
            } else {
                (u64::from(i) * self.chunk_size).min(size)
            }
        };

        let chunks: Vec<ChunkDescriptor> = (0..count)
            .map(|i| {
                let start = boundary(i);
                let end = boundary(i + 1);
                ChunkDescriptor {
                    identity: identity.clone(),
                    sequence: i + 1,
                    offset: start,
                    len: end - start,
                }
            })
            .collect();

        tracing::debug!(
            hash = %identity.hash,
            bytes = size,
            chunks = chunks.len(),
            capped,
            "planned chunks"
        );
        Ok(chunks)
    }
}
