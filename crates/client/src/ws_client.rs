//! WebSocket client for the upload server.
//!
//! Implements request-response with UUID correlation and ping/pong
//! keepalive. Chunk uploads travel as binary frames whose header carries
//! the request id.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;

use chunkup_protocol::constants::{
    WS_BINARY_REQUEST_TIMEOUT, WS_MAX_MESSAGE_SIZE, WS_REQUEST_TIMEOUT,
};
use chunkup_protocol::{ChunkFrameHeader, Message, MessageType, encode_chunk_frame};

use crate::UploadError;

/// Requests awaiting a reply, keyed by message id.
pub(crate) type PendingMap = Arc<Mutex<HashMap<String, oneshot::Sender<Message>>>>;

/// WebSocket client connected to one upload server.
pub struct WsClient {
    write_tx: mpsc::Sender<tungstenite::Message>,
    pending: PendingMap,
    _read_handle: tokio::task::JoinHandle<()>,
    _write_handle: tokio::task::JoinHandle<()>,
    cancel: CancellationToken,
}

impl WsClient {
    /// Connects to the server at `url` (e.g. `ws://127.0.0.1:5000`).
    pub async fn connect(url: &str) -> Result<Self, UploadError> {
        let mut ws_config = tungstenite::protocol::WebSocketConfig::default();
        ws_config.max_message_size = Some(WS_MAX_MESSAGE_SIZE);
        ws_config.max_frame_size = Some(WS_MAX_MESSAGE_SIZE);
        let (ws_stream, _) =
            tokio_tungstenite::connect_async_with_config(url, Some(ws_config), false).await?;
        let (write, read) = ws_stream.split();

        let (write_tx, write_rx) = mpsc::channel::<tungstenite::Message>(256);
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let cancel = CancellationToken::new();

        let write_handle = tokio::spawn(crate::pumps::write::write_pump(
            write,
            write_rx,
            cancel.clone(),
        ));
        let read_handle = tokio::spawn(crate::pumps::read::read_pump(
            read,
            Arc::clone(&pending),
            write_tx.clone(),
            cancel.clone(),
        ));

        tracing::debug!(%url, "connected to upload server");

        Ok(Self {
            write_tx,
            pending,
            _read_handle: read_handle,
            _write_handle: write_handle,
            cancel,
        })
    }

    /// Sends a JSON request and waits for the response.
    pub async fn send_request<T: serde::Serialize>(
        &self,
        msg_type: MessageType,
        payload: Option<&T>,
    ) -> Result<Message, UploadError> {
        let id = uuid::Uuid::new_v4().to_string();
        let msg = Message::new(&id, msg_type, payload)?;
        let json = serde_json::to_string(&msg)?;

        self.round_trip(id, tungstenite::Message::Text(json.into()), WS_REQUEST_TIMEOUT)
            .await
    }

    /// Sends one chunk as a binary frame and waits for the acknowledgement.
    ///
    /// A non-empty `checksum` is forwarded for server-side verification.
    pub async fn send_chunk(
        &self,
        file_name: &str,
        checksum: &str,
        data: &[u8],
    ) -> Result<Message, UploadError> {
        let id = uuid::Uuid::new_v4().to_string();
        let header = ChunkFrameHeader {
            id: id.clone(),
            file_name: file_name.to_string(),
            checksum: checksum.to_string(),
        };
        let frame = encode_chunk_frame(&header, data)?;

        // Chunk transfers use a longer timeout to absorb slow disks and links.
        self.round_trip(
            id,
            tungstenite::Message::Binary(frame.into()),
            WS_BINARY_REQUEST_TIMEOUT,
        )
        .await
    }

    /// Application-level liveness check.
    pub async fn ping(&self) -> Result<(), UploadError> {
        let reply = self
            .send_request::<()>(MessageType::Ping, None)
            .await?;
        match reply.msg_type {
            MessageType::Pong => Ok(()),
            other => Err(UploadError::UnexpectedReply(format!("{other:?} to ping"))),
        }
    }

    /// Returns `false` once the connection has dropped or been closed.
    pub fn is_connected(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Gracefully closes the connection.
    pub async fn close(&self) {
        let _ = self.write_tx.send(tungstenite::Message::Close(None)).await;
        self.cancel.cancel();
    }

    async fn round_trip(
        &self,
        id: String,
        frame: tungstenite::Message,
        timeout: Duration,
    ) -> Result<Message, UploadError> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id.clone(), tx);

        if self.write_tx.send(frame).await.is_err() {
            self.pending.lock().await.remove(&id);
            return Err(UploadError::Closed);
        }

        let result = tokio::time::timeout(timeout, rx).await;

        // Clean up pending entry on any exit path.
        self.pending.lock().await.remove(&id);

        match result {
            Ok(Ok(resp)) => {
                if let Some(err) = &resp.error {
                    return Err(UploadError::Server {
                        code: err.code,
                        message: err.message.clone(),
                    });
                }
                Ok(resp)
            }
            Ok(Err(_)) => Err(UploadError::Closed),
            Err(_) => Err(UploadError::Timeout),
        }
    }
}

impl Drop for WsClient {
    fn drop(&mut self) {
        self.cancel.cancel();
        self._read_handle.abort();
        self._write_handle.abort();
    }
}
