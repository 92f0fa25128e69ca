//! Upload client: drives the fingerprint → resume query → windowed chunk
//! upload → merge flow against an upload server.

pub mod connection;
pub mod coordinator;
mod error;
mod pumps;
pub mod types;
pub mod ws_client;

pub use connection::{ChunkConnection, ConnFuture};
pub use coordinator::UploadCoordinator;
pub use error::UploadError;
pub use types::{ClientConfig, UploadEvent, UploadOutcome};
pub use ws_client::WsClient;
