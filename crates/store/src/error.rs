use chunkup_protocol::NameError;
use chunkup_protocol::constants::{CODE_MALFORMED, CODE_NOT_FOUND, CODE_STORAGE};

/// Errors produced by the chunk store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("malformed: {0}")]
    Malformed(String),

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl StoreError {
    /// Error code sent to the client.
    pub fn code(&self) -> i32 {
        match self {
            Self::NotFound(_) => CODE_NOT_FOUND,
            Self::Malformed(_) | Self::ChecksumMismatch => CODE_MALFORMED,
            Self::Storage(_) => CODE_STORAGE,
        }
    }
}

impl From<NameError> for StoreError {
    fn from(e: NameError) -> Self {
        Self::Malformed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes() {
        assert_eq!(StoreError::NotFound("x".into()).code(), 404);
        assert_eq!(StoreError::Malformed("x".into()).code(), 400);
        assert_eq!(StoreError::ChecksumMismatch.code(), 400);
        assert_eq!(
            StoreError::Storage(std::io::Error::other("disk")).code(),
            500
        );
    }

    #[test]
    fn name_error_is_malformed() {
        let err: StoreError = NameError::InvalidHash("..".into()).into();
        assert!(matches!(err, StoreError::Malformed(_)));
    }
}
