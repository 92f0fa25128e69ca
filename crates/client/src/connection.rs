//! Transport abstraction used by the upload coordinator.
//!
//! [`WsClient`] implements it for real connections; tests implement it
//! in memory.

use std::future::Future;
use std::pin::Pin;

use chunkup_protocol::messages::{
    ChunksStatusResponse, MergeChunksRequest, MergeResultResponse, QueryChunksRequest,
};
use chunkup_protocol::{FileIdentity, Message, MessageType};
use chunkup_transfer::ChunkPayload;

use crate::{UploadError, WsClient};

/// A boxed future returned by connection methods.
pub type ConnFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, UploadError>> + Send + 'a>>;

/// The three upload operations offered by a server.
pub trait ChunkConnection: Send + Sync {
    /// Asks which chunks of `identity` the server already holds.
    fn query_chunks<'a>(
        &'a self,
        identity: &'a FileIdentity,
    ) -> ConnFuture<'a, ChunksStatusResponse>;

    /// Uploads one chunk and waits for the acknowledgement.
    fn upload_chunk<'a>(&'a self, chunk: &'a ChunkPayload) -> ConnFuture<'a, ()>;

    /// Requests reassembly of all stored chunks of `hash`.
    fn merge_chunks<'a>(&'a self, hash: &'a str) -> ConnFuture<'a, MergeResultResponse>;
}

impl ChunkConnection for WsClient {
    fn query_chunks<'a>(
        &'a self,
        identity: &'a FileIdentity,
    ) -> ConnFuture<'a, ChunksStatusResponse> {
        Box::pin(async move {
            let req = QueryChunksRequest {
                hash: identity.hash.clone(),
                suffix: identity.suffix.clone(),
            };
            let resp = self.send_request(MessageType::QueryChunks, Some(&req)).await?;
            expect_payload(resp, MessageType::ChunksStatus)
        })
    }

    fn upload_chunk<'a>(&'a self, chunk: &'a ChunkPayload) -> ConnFuture<'a, ()> {
        Box::pin(async move {
            let resp = self
                .send_chunk(&chunk.descriptor.file_name(), &chunk.checksum, &chunk.data)
                .await?;
            match resp.msg_type {
                MessageType::ChunkStored => Ok(()),
                other => Err(UploadError::UnexpectedReply(format!(
                    "{other:?} to chunk upload"
                ))),
            }
        })
    }

    fn merge_chunks<'a>(&'a self, hash: &'a str) -> ConnFuture<'a, MergeResultResponse> {
        Box::pin(async move {
            let req = MergeChunksRequest {
                hash: hash.to_string(),
            };
            let resp = self.send_request(MessageType::MergeChunks, Some(&req)).await?;
            expect_payload(resp, MessageType::MergeResult)
        })
    }
}

fn expect_payload<T: for<'de> serde::Deserialize<'de>>(
    resp: Message,
    expected: MessageType,
) -> Result<T, UploadError> {
    if resp.msg_type != expected {
        return Err(UploadError::UnexpectedReply(format!(
            "expected {expected:?}, got {:?}",
            resp.msg_type
        )));
    }
    resp.parse_payload()?
        .ok_or_else(|| UploadError::UnexpectedReply(format!("empty {expected:?} payload")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkup_protocol::messages::Status;

    #[test]
    fn expect_payload_checks_type() {
        let resp = Message::new(
            "1",
            MessageType::ChunksStatus,
            Some(&ChunksStatusResponse::fresh()),
        )
        .unwrap();
        let status: ChunksStatusResponse =
            expect_payload(resp, MessageType::ChunksStatus).unwrap();
        assert_eq!(status.status, Status::Fresh);

        let wrong = Message::new::<()>("2", MessageType::Pong, None).unwrap();
        assert!(matches!(
            expect_payload::<ChunksStatusResponse>(wrong, MessageType::ChunksStatus),
            Err(UploadError::UnexpectedReply(_))
        ));
    }

    #[test]
    fn expect_payload_requires_body() {
        let empty = Message::new::<()>("3", MessageType::MergeResult, None).unwrap();
        assert!(matches!(
            expect_payload::<MergeResultResponse>(empty, MessageType::MergeResult),
            Err(UploadError::UnexpectedReply(_))
        ));
    }
}
