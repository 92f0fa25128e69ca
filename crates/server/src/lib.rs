//! WebSocket server for chunked uploads.
//!
//! Accepts any number of client connections, dispatches JSON and binary
//! frames to a [`Handler`], and manages the connection lifecycle (ping/pong,
//! graceful shutdown). [`StoreHandler`] binds the upload operations to a
//! [`chunkup_store::ChunkStore`].

mod connection;
mod handler;
mod server;
mod store_handler;

pub use connection::{PeerConnection, SendError, Sender};
pub use handler::{Handler, HandlerFuture};
pub use server::{ServerConfig, UploadServer};
pub use store_handler::StoreHandler;

/// Send buffer capacity per connection.
///
/// Replies are small; the buffer only needs to absorb bursts while a window
/// of chunk acknowledgements and pongs is queued.
pub const SEND_BUFFER_SIZE: usize = 256;

/// Errors produced by the upload server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
