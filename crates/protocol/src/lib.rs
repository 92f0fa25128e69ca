//! Wire protocol shared by the chunk upload client and server.
//!
//! Everything that crosses the connection lives here: the JSON envelope,
//! message types, request/response payloads, the binary chunk frame and the
//! chunk/artifact filename grammar.

pub mod binary;
pub mod constants;
pub mod envelope;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use binary::{ChunkFrameHeader, FrameError, encode_chunk_frame, parse_chunk_frame};
pub use constants::MessageType;
pub use envelope::{Message, WsError};
pub use types::{ChunkName, FileIdentity, NameError, suffix_of};
