//! Upload error types.

use chunkup_transfer::TransferError;
use tokio_tungstenite::tungstenite;

/// Errors from the upload client.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("server error {code}: {message}")]
    Server { code: i32, message: String },

    #[error("request timed out")]
    Timeout,

    #[error("connection closed")]
    Closed,

    #[error("upload aborted: {failed} chunk(s) failed in batch {batch}")]
    Aborted {
        failed: usize,
        batch: usize,
        source: Box<UploadError>,
    },

    #[error("cancelled")]
    Cancelled,

    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),
}
