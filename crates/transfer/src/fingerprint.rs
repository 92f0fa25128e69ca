use std::path::Path;

use chunkup_protocol::{FileIdentity, suffix_of};
use md5::{Digest, Md5};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::TransferError;

const READ_BUF_SIZE: usize = 64 * 1024;

/// Computes the upload identity of a file.
///
/// The hash is the lowercase hex MD5 of the full content, streamed through a
/// fixed buffer. The suffix comes from the file name's final extension.
pub async fn fingerprint_file(path: &Path) -> Result<FileIdentity, TransferError> {
    let file = tokio::fs::File::open(path).await?;
    let hash = fingerprint_reader(file).await?;
    let suffix = path_suffix(path);

    tracing::debug!(path = %path.display(), %hash, %suffix, "fingerprinted file");
    Ok(FileIdentity { hash, suffix })
}

pub(crate) fn path_suffix(path: &Path) -> String {
    path.file_name()
        .map(|n| suffix_of(&n.to_string_lossy()).to_string())
        .unwrap_or_default()
}

/// Streams `reader` to completion and returns the hex MD5 digest.
pub async fn fingerprint_reader<R>(mut reader: R) -> Result<String, TransferError>
where
    R: AsyncRead + Unpin,
{
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; READ_BUF_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Hex MD5 digest of an in-memory buffer.
pub fn fingerprint_bytes(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}
