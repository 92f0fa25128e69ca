//! Durable chunk storage for resumable uploads.
//!
//! Layout under the upload root:
//!
//! ```text
//! <root>/<hash>/<hash>_<n>[.<suffix>]   chunks of an in-progress upload
//! <root>/<hash>[.<suffix>]              merged artifact
//! <root>/.staging/                      in-flight writes, renamed into place
//! ```
//!
//! Every operation on a hash runs under that hash's lock from [`HashLocks`].

mod chunks;
mod config;
mod error;
mod locks;
mod merge;
mod resume;
mod store;

pub use chunks::ChunkWrite;
pub use config::StoreConfig;
pub use error::StoreError;
pub use locks::{HashGuard, HashLocks};
pub use merge::MergedArtifact;
pub use resume::ResumeState;
pub use store::ChunkStore;
