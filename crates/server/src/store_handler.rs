//! [`Handler`] implementation backed by a [`ChunkStore`].

use std::sync::Arc;

use chunkup_protocol::constants::CODE_MALFORMED;
use chunkup_protocol::messages::{
    ChunksStatusResponse, MergeChunksRequest, MergeResultResponse, QueryChunksRequest, Status,
    StatusReply,
};
use chunkup_protocol::{ChunkFrameHeader, FileIdentity, Message, MessageType};
use chunkup_store::{ChunkStore, ResumeState, StoreError};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::connection::Sender;
use crate::handler::{Handler, HandlerFuture};

/// Serves the query, chunk and merge operations from a [`ChunkStore`].
pub struct StoreHandler {
    store: Arc<ChunkStore>,
}

impl StoreHandler {
    pub fn new(store: Arc<ChunkStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<ChunkStore> {
        &self.store
    }
}

impl Handler for StoreHandler {
    fn on_query_chunks(&self, sender: Sender, msg: Message) -> HandlerFuture<'_> {
        Box::pin(async move {
            let req: QueryChunksRequest = match msg.parse_payload() {
                Ok(Some(r)) => r,
                _ => {
                    let _ =
                        sender.send_error(&msg, CODE_MALFORMED, "invalid query_chunks payload");
                    return;
                }
            };
            let identity = FileIdentity {
                hash: req.hash,
                suffix: req.suffix,
            };

            let response = match self.store.query(&identity).await {
                Ok(ResumeState::AlreadyMerged { public_path }) => {
                    ChunksStatusResponse::already_merged(public_path)
                }
                Ok(ResumeState::Partial(chunks)) => ChunksStatusResponse::partial(
                    chunks.iter().map(ToString::to_string).collect(),
                ),
                Ok(ResumeState::Fresh) => ChunksStatusResponse::fresh(),
                Err(e) => {
                    reply_store_error(&sender, &msg.id, &identity.hash, &e);
                    return;
                }
            };
            reply(&sender, &msg, MessageType::ChunksStatus, &response);
        })
    }

    fn on_binary_chunk(
        &self,
        sender: Sender,
        header: ChunkFrameHeader,
        data: Vec<u8>,
    ) -> HandlerFuture<'_> {
        Box::pin(async move {
            let result = match self.store.parse_chunk_name(&header.file_name) {
                Ok(name) => self.store.write_chunk(&name, &data, &header.checksum).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(outcome) => {
                    debug!(
                        file = %header.file_name,
                        bytes = data.len(),
                        ?outcome,
                        "chunk handled"
                    );
                    let stored = StatusReply::ok();
                    match Message::new(&header.id, MessageType::ChunkStored, Some(&stored)) {
                        Ok(reply) => {
                            let _ = sender.send_msg(reply);
                        }
                        Err(e) => error!("failed to encode chunk_stored: {e}"),
                    }
                }
                Err(e) => reply_store_error(&sender, &header.id, &header.file_name, &e),
            }
        })
    }

    fn on_merge_chunks(&self, sender: Sender, msg: Message) -> HandlerFuture<'_> {
        Box::pin(async move {
            let req: MergeChunksRequest = match msg.parse_payload() {
                Ok(Some(r)) => r,
                _ => {
                    let _ =
                        sender.send_error(&msg, CODE_MALFORMED, "invalid merge_chunks payload");
                    return;
                }
            };

            match self.store.merge(&req.hash).await {
                Ok(artifact) => {
                    info!(hash = %req.hash, artifact = %artifact.public_path, "merge complete");
                    let response = MergeResultResponse {
                        status: Status::Ok,
                        artifact_path: artifact.public_path,
                        file_name: artifact.file_name,
                    };
                    reply(&sender, &msg, MessageType::MergeResult, &response);
                }
                Err(e) => reply_store_error(&sender, &msg.id, &req.hash, &e),
            }
        })
    }
}

fn reply<T: Serialize>(sender: &Sender, req: &Message, msg_type: MessageType, payload: &T) {
    match req.reply(msg_type, Some(payload)) {
        Ok(reply) => {
            let _ = sender.send_msg(reply);
        }
        Err(e) => error!(msg_type = ?msg_type, "failed to encode reply: {e}"),
    }
}

fn reply_store_error(sender: &Sender, id: &str, subject: &str, e: &StoreError) {
    match e {
        StoreError::Storage(_) => error!(subject, "storage fault: {e}"),
        _ => warn!(subject, "request rejected: {e}"),
    }
    let _ = sender.send_msg(Message::error(id, e.code(), e.to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkup_protocol::constants::CODE_NOT_FOUND;
    use chunkup_store::StoreConfig;
    use chunkup_transfer::checksum_bytes;
    use tempfile::TempDir;
    use tokio::sync::mpsc;
    use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;

    async fn handler_in(dir: &TempDir) -> StoreHandler {
        let store = ChunkStore::open(StoreConfig::new(dir.path())).await.unwrap();
        StoreHandler::new(Arc::new(store))
    }

    async fn next_reply(rx: &mut mpsc::Receiver<WsMessage>) -> Message {
        match rx.recv().await {
            Some(WsMessage::Text(text)) => serde_json::from_str(&text).unwrap(),
            other => panic!("expected text reply, got {other:?}"),
        }
    }

    fn query(hash: &str, suffix: &str) -> Message {
        let req = QueryChunksRequest {
            hash: hash.into(),
            suffix: suffix.into(),
        };
        Message::new("q", MessageType::QueryChunks, Some(&req)).unwrap()
    }

    fn merge(hash: &str) -> Message {
        let req = MergeChunksRequest { hash: hash.into() };
        Message::new("m", MessageType::MergeChunks, Some(&req)).unwrap()
    }

    fn chunk(id: &str, file_name: &str, checksum: String) -> ChunkFrameHeader {
        ChunkFrameHeader {
            id: id.into(),
            file_name: file_name.into(),
            checksum,
        }
    }

    #[tokio::test]
    async fn query_chunk_merge_flow() {
        let dir = TempDir::new().unwrap();
        let handler = handler_in(&dir).await;
        let (sender, mut rx) = Sender::for_test();

        handler.on_query_chunks(sender.clone(), query("abc", "bin")).await;
        let reply = next_reply(&mut rx).await;
        let status: ChunksStatusResponse = reply.parse_payload().unwrap().unwrap();
        assert_eq!(status.status, Status::Fresh);

        let header = chunk("c2", "abc_2.bin", checksum_bytes(b"world"));
        handler
            .on_binary_chunk(sender.clone(), header, b"world".to_vec())
            .await;
        let reply = next_reply(&mut rx).await;
        assert_eq!(reply.id, "c2");
        assert_eq!(reply.msg_type, MessageType::ChunkStored);

        let header = chunk("c1", "abc_1.bin", String::new());
        handler
            .on_binary_chunk(sender.clone(), header, b"hello ".to_vec())
            .await;
        next_reply(&mut rx).await;

        handler.on_query_chunks(sender.clone(), query("abc", "bin")).await;
        let status: ChunksStatusResponse =
            next_reply(&mut rx).await.parse_payload().unwrap().unwrap();
        assert_eq!(status.status, Status::Partial);
        assert_eq!(status.chunks, vec!["abc_1.bin", "abc_2.bin"]);

        handler.on_merge_chunks(sender.clone(), merge("abc")).await;
        let reply = next_reply(&mut rx).await;
        assert_eq!(reply.msg_type, MessageType::MergeResult);
        let result: MergeResultResponse = reply.parse_payload().unwrap().unwrap();
        assert_eq!(result.file_name, "abc.bin");
        assert_eq!(std::fs::read(dir.path().join("abc.bin")).unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn malformed_chunk_name_rejected() {
        let dir = TempDir::new().unwrap();
        let handler = handler_in(&dir).await;
        let (sender, mut rx) = Sender::for_test();

        let header = chunk("bad", "../../etc_1.bin", String::new());
        handler.on_binary_chunk(sender, header, b"x".to_vec()).await;
        let reply = next_reply(&mut rx).await;
        assert_eq!(reply.id, "bad");
        assert_eq!(reply.msg_type, MessageType::Error);
        assert_eq!(reply.error.as_ref().unwrap().code, CODE_MALFORMED);
        let status: StatusReply = reply.parse_payload().unwrap().unwrap();
        assert_eq!(status.status, Status::Error);
    }

    #[tokio::test]
    async fn merge_unknown_hash_is_not_found() {
        let dir = TempDir::new().unwrap();
        let handler = handler_in(&dir).await;
        let (sender, mut rx) = Sender::for_test();

        handler.on_merge_chunks(sender, merge("nope")).await;
        let reply = next_reply(&mut rx).await;
        assert_eq!(reply.error.unwrap().code, CODE_NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_payload_is_malformed() {
        let dir = TempDir::new().unwrap();
        let handler = handler_in(&dir).await;
        let (sender, mut rx) = Sender::for_test();

        let msg = Message::new::<()>("q", MessageType::QueryChunks, None).unwrap();
        handler.on_query_chunks(sender, msg).await;
        assert_eq!(next_reply(&mut rx).await.error.unwrap().code, CODE_MALFORMED);
    }
}
