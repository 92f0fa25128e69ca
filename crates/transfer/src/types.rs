use chunkup_protocol::{ChunkName, FileIdentity};

/// One planned chunk: a contiguous byte range of the source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkDescriptor {
    pub identity: FileIdentity,
    /// 1-based position within the upload.
    pub sequence: u32,
    /// Byte offset of the first byte.
    pub offset: u64,
    /// Number of bytes in the range.
    pub len: u64,
}

impl ChunkDescriptor {
    /// Structured chunk name.
    pub fn name(&self) -> ChunkName {
        self.identity.chunk_name(self.sequence)
    }

    /// Wire file name, `<hash>_<sequence>[.<suffix>]`.
    pub fn file_name(&self) -> String {
        self.name().to_string()
    }

    /// Exclusive end offset.
    pub fn end(&self) -> u64 {
        self.offset + self.len
    }
}

/// Chunk bytes read from disk, ready to send.
#[derive(Debug, Clone)]
pub struct ChunkPayload {
    pub descriptor: ChunkDescriptor,
    pub data: Vec<u8>,
    /// SHA-256 hex checksum of `data`.
    pub checksum: String,
}
