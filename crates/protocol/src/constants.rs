use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default size of a single chunk (1 MiB).
pub const DEFAULT_CHUNK_SIZE: u64 = 1024 * 1024;

/// Default ceiling on the number of chunks a single file is split into.
pub const DEFAULT_MAX_CHUNK_COUNT: u32 = 100;

/// Default number of chunk uploads in flight per file.
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Time to wait for any incoming frame before a peer is considered dead.
pub const WS_PONG_WAIT: Duration = Duration::from_secs(60);

/// How often to send keepalive pings.
pub const WS_PING_PERIOD: Duration = Duration::from_secs(5);

/// Maximum message size in bytes (256 MiB).
///
/// With the fan-out cap a chunk grows with the file, so this bounds the
/// largest file that can be uploaded at default settings to roughly 25 GiB.
pub const WS_MAX_MESSAGE_SIZE: usize = 256 * 1024 * 1024;

/// Timeout for JSON request/response operations.
pub const WS_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for binary chunk uploads.
pub const WS_BINARY_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Error code for malformed input.
pub const CODE_MALFORMED: i32 = 400;

/// Error code for a missing chunk directory or artifact.
pub const CODE_NOT_FOUND: i32 = 404;

/// Error code for storage faults.
pub const CODE_STORAGE: i32 = 500;

/// Error code for message types the peer does not handle.
pub const CODE_NOT_IMPLEMENTED: i32 = 501;

/// WebSocket message type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    // Requests from client to server
    Ping,
    QueryChunks,
    MergeChunks,

    // Responses from server to client
    Pong,
    ChunksStatus,
    ChunkStored,
    MergeResult,

    Error,
}
