//! Upload identity and the chunk/artifact filename grammar.
//!
//! ```text
//! chunk     = hash "_" sequence [ "." suffix ]
//! artifact  = hash [ "." suffix ]
//! hash      = 1*ALNUM
//! sequence  = 1*DIGIT        ; >= 1
//! suffix    = 1*ALNUM
//! ```
//!
//! Names are decoded once on receipt into [`ChunkName`]; nothing downstream
//! re-parses strings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Errors from decoding or validating names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("invalid hash: {0:?}")]
    InvalidHash(String),

    #[error("invalid suffix: {0:?}")]
    InvalidSuffix(String),

    #[error("missing sequence number in {0:?}")]
    MissingSequence(String),

    #[error("invalid sequence number in {0:?}")]
    InvalidSequence(String),
}

/// Content-derived identity of a whole upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileIdentity {
    /// Hex digest of the full file content.
    pub hash: String,
    /// File extension without the dot (may be empty).
    pub suffix: String,
}

impl FileIdentity {
    /// Creates an identity after validating both parts.
    pub fn new(hash: impl Into<String>, suffix: impl Into<String>) -> Result<Self, NameError> {
        let identity = Self {
            hash: hash.into(),
            suffix: suffix.into(),
        };
        validate_hash(&identity.hash)?;
        validate_suffix(&identity.suffix)?;
        Ok(identity)
    }

    /// Name of the chunk with the given 1-based sequence number.
    pub fn chunk_name(&self, sequence: u32) -> ChunkName {
        ChunkName {
            hash: self.hash.clone(),
            sequence,
            suffix: self.suffix.clone(),
        }
    }

    /// File name of the merged artifact.
    pub fn artifact_name(&self) -> String {
        join_suffix(&self.hash, &self.suffix)
    }
}

/// A decoded chunk file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChunkName {
    pub hash: String,
    pub sequence: u32,
    pub suffix: String,
}

impl ChunkName {
    /// Decodes `"<hash>_<sequence>[.<suffix>]"`.
    pub fn parse(name: &str) -> Result<Self, NameError> {
        let (hash, rest) = name
            .split_once('_')
            .ok_or_else(|| NameError::MissingSequence(name.to_string()))?;
        validate_hash(hash)?;

        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits_end == 0 {
            return Err(NameError::MissingSequence(name.to_string()));
        }
        let sequence: u32 = rest[..digits_end]
            .parse()
            .map_err(|_| NameError::InvalidSequence(name.to_string()))?;
        if sequence == 0 {
            return Err(NameError::InvalidSequence(name.to_string()));
        }

        let suffix = match &rest[digits_end..] {
            "" => "",
            tail => tail
                .strip_prefix('.')
                .filter(|s| !s.is_empty())
                .ok_or_else(|| NameError::InvalidSuffix(tail.to_string()))?,
        };
        validate_suffix(suffix)?;

        Ok(Self {
            hash: hash.to_string(),
            sequence,
            suffix: suffix.to_string(),
        })
    }

    /// The upload this chunk belongs to.
    pub fn identity(&self) -> FileIdentity {
        FileIdentity {
            hash: self.hash.clone(),
            suffix: self.suffix.clone(),
        }
    }

    /// File name of the artifact this chunk merges into.
    pub fn artifact_name(&self) -> String {
        join_suffix(&self.hash, &self.suffix)
    }
}

impl fmt::Display for ChunkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.suffix.is_empty() {
            write!(f, "{}_{}", self.hash, self.sequence)
        } else {
            write!(f, "{}_{}.{}", self.hash, self.sequence, self.suffix)
        }
    }
}

/// Validates a content hash token.
pub fn validate_hash(hash: &str) -> Result<(), NameError> {
    if hash.is_empty() || !hash.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(NameError::InvalidHash(hash.to_string()));
    }
    Ok(())
}

/// Validates a suffix token. Empty is allowed.
pub fn validate_suffix(suffix: &str) -> Result<(), NameError> {
    if !suffix.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(NameError::InvalidSuffix(suffix.to_string()));
    }
    Ok(())
}

/// Extracts the extension of a file name: the final `.`-delimited token if it
/// is alphanumeric, otherwise the empty string.
pub fn suffix_of(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.bytes().all(|b| b.is_ascii_alphanumeric()) => ext,
        _ => "",
    }
}

fn join_suffix(hash: &str, suffix: &str) -> String {
    if suffix.is_empty() {
        hash.to_string()
    } else {
        format!("{hash}.{suffix}")
    }
}
