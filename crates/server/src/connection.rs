//! Client connection management: read/write pumps, ping/pong, send buffering.

use std::sync::Arc;

use chunkup_protocol::constants::{
    CODE_MALFORMED, CODE_NOT_IMPLEMENTED, WS_MAX_MESSAGE_SIZE, WS_PING_PERIOD, WS_PONG_WAIT,
};
use chunkup_protocol::{Message, MessageType, parse_chunk_frame};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;
use tokio_util::sync::CancellationToken;

use crate::SEND_BUFFER_SIZE;
use crate::handler::Handler;

/// Handle for sending messages to a connected client.
///
/// Cloneable and cheap; wraps an `mpsc::Sender`.
#[derive(Clone)]
pub struct Sender {
    tx: mpsc::Sender<WsMessage>,
}

impl Sender {
    /// Sends a protocol [`Message`] as JSON text.
    ///
    /// Returns `Err` only if the channel is full or closed.
    pub fn send_msg(&self, msg: Message) -> Result<(), SendError> {
        let json = serde_json::to_string(&msg).map_err(|_| SendError)?;
        self.tx.try_send(WsMessage::Text(json.into())).map_err(|_| {
            tracing::warn!("send buffer full or closed, dropping message");
            SendError
        })
    }

    /// Sends an error response for the given request message.
    pub fn send_error(&self, req: &Message, code: i32, message: &str) -> Result<(), SendError> {
        self.send_msg(req.reply_error(code, message))
    }

    /// Returns `true` if the send channel is still open.
    pub fn is_connected(&self) -> bool {
        !self.tx.is_closed()
    }

    #[cfg(test)]
    pub(crate) fn for_test() -> (Self, mpsc::Receiver<WsMessage>) {
        let (tx, rx) = mpsc::channel(8);
        (Self { tx }, rx)
    }
}

/// Error returned when the send channel is full or closed.
#[derive(Debug, thiserror::Error)]
#[error("send failed: buffer full or connection closed")]
pub struct SendError;

/// Active connection to an upload client.
///
/// Owns the read/write pump tasks and provides a [`Sender`] for replies.
pub struct PeerConnection {
    pub remote_addr: String,
    sender: Sender,
    cancel: CancellationToken,
}

impl PeerConnection {
    /// Returns a cloneable [`Sender`] for this connection.
    pub fn sender(&self) -> Sender {
        self.sender.clone()
    }

    /// Signals the pumps to stop.
    pub fn close(&self) {
        self.cancel.cancel();
    }
}

/// Runs the read and write pumps for a WebSocket connection.
///
/// The pumps run as background tasks and stop when the connection closes or
/// the server token is cancelled.
pub fn spawn_connection<S, H>(
    ws_stream: S,
    remote_addr: String,
    handler: Arc<H>,
    server_cancel: CancellationToken,
) -> PeerConnection
where
    S: futures_util::Stream<Item = Result<WsMessage, tokio_tungstenite::tungstenite::Error>>
        + futures_util::Sink<WsMessage, Error = tokio_tungstenite::tungstenite::Error>
        + Send
        + 'static,
    H: Handler,
{
    let (tx, rx) = mpsc::channel::<WsMessage>(SEND_BUFFER_SIZE);
    let cancel = server_cancel.child_token();
    let sender = Sender { tx };

    let conn = PeerConnection {
        remote_addr: remote_addr.clone(),
        sender: sender.clone(),
        cancel: cancel.clone(),
    };

    let (ws_sink, ws_stream) = ws_stream.split();

    tokio::spawn(write_pump(ws_sink, rx, cancel.clone()));

    let read_cancel = cancel;
    tokio::spawn(async move {
        read_pump(ws_stream, sender, Arc::clone(&handler), read_cancel.clone()).await;
        // When the read pump exits, stop the write pump too.
        read_cancel.cancel();
        handler.on_disconnected(&remote_addr).await;
        tracing::info!(peer = %remote_addr, "client disconnected");
    });

    conn
}

/// Write pump: drains the send channel and sends WS pings.
async fn write_pump<S>(mut sink: S, mut rx: mpsc::Receiver<WsMessage>, cancel: CancellationToken)
where
    S: futures_util::Sink<WsMessage, Error = tokio_tungstenite::tungstenite::Error> + Send + Unpin,
{
    let mut ping_interval = tokio::time::interval(WS_PING_PERIOD);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            msg = rx.recv() => {
                match msg {
                    Some(ws_msg) => {
                        if let Err(e) = sink.send(ws_msg).await {
                            tracing::error!("write pump send error: {e}");
                            break;
                        }
                    }
                    None => break, // Channel closed.
                }
            }

            _ = ping_interval.tick() => {
                if let Err(e) = sink.send(WsMessage::Ping(Vec::new().into())).await {
                    tracing::error!("write pump ping error: {e}");
                    break;
                }
            }
        }
    }

    // Best-effort close frame.
    let _ = sink.close().await;
}

/// Read pump: reads WS frames and dispatches each one on its own task so a
/// window of concurrent chunk uploads is processed concurrently.
async fn read_pump<S, H>(mut stream: S, sender: Sender, handler: Arc<H>, cancel: CancellationToken)
where
    S: futures_util::Stream<Item = Result<WsMessage, tokio_tungstenite::tungstenite::Error>>
        + Send
        + Unpin,
    H: Handler,
{
    let mut pong_deadline = tokio::time::interval(WS_PONG_WAIT);
    pong_deadline.reset();
    let mut got_pong = true;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            _ = pong_deadline.tick() => {
                if !got_pong {
                    tracing::warn!("pong timeout, closing connection");
                    break;
                }
                got_pong = false;
            }

            frame = stream.next() => {
                match frame {
                    Some(Ok(ws_msg)) => {
                        match ws_msg {
                            WsMessage::Text(text) => {
                                if text.len() > WS_MAX_MESSAGE_SIZE {
                                    tracing::error!(
                                        "message exceeds max size ({} > {WS_MAX_MESSAGE_SIZE})",
                                        text.len()
                                    );
                                    continue;
                                }
                                let handler = Arc::clone(&handler);
                                let sender = sender.clone();
                                tokio::spawn(async move {
                                    dispatch_text(&handler, &sender, &text).await;
                                });
                            }
                            WsMessage::Binary(data) => {
                                if data.len() > WS_MAX_MESSAGE_SIZE {
                                    tracing::error!(
                                        "binary frame too large ({} > {WS_MAX_MESSAGE_SIZE})",
                                        data.len()
                                    );
                                    continue;
                                }
                                let handler = Arc::clone(&handler);
                                let sender = sender.clone();
                                tokio::spawn(async move {
                                    dispatch_binary(&handler, &sender, &data).await;
                                });
                            }
                            WsMessage::Pong(_) => {
                                got_pong = true;
                                pong_deadline.reset();
                            }
                            WsMessage::Ping(data) => {
                                let _ = sender.tx.try_send(WsMessage::Pong(data));
                            }
                            WsMessage::Close(_) => {
                                tracing::info!("received close frame");
                                break;
                            }
                            WsMessage::Frame(_) => {} // Raw frames ignored.
                        }
                    }
                    Some(Err(e)) => {
                        tracing::error!("read pump error: {e}");
                        break;
                    }
                    None => break, // Stream ended.
                }
            }
        }
    }
}

/// Dispatches a text (JSON) message to the appropriate handler method.
async fn dispatch_text<H: Handler>(handler: &Arc<H>, sender: &Sender, text: &str) {
    let msg: Message = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!("invalid message JSON: {e}");
            return;
        }
    };

    let s = sender.clone();
    match msg.msg_type {
        MessageType::Ping => handler.on_ping(s, msg).await,
        MessageType::QueryChunks => handler.on_query_chunks(s, msg).await,
        MessageType::MergeChunks => handler.on_merge_chunks(s, msg).await,
        _ => {
            tracing::warn!(msg_type = ?msg.msg_type, "unhandled message type");
            let _ = sender.send_error(&msg, CODE_NOT_IMPLEMENTED, "unknown message type");
        }
    }
}

/// Dispatches a binary chunk frame to the handler.
async fn dispatch_binary<H: Handler>(handler: &Arc<H>, sender: &Sender, data: &[u8]) {
    match parse_chunk_frame(data) {
        Ok((header, payload)) => {
            handler.on_binary_chunk(sender.clone(), header, payload).await;
        }
        Err(e) => {
            // Without a header there is no request id to answer.
            tracing::warn!(code = CODE_MALFORMED, "failed to parse chunk frame: {e}");
        }
    }
}
