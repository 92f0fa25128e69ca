//! WebSocket read pump: routes replies to waiting requests.

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use chunkup_protocol::Message;
use chunkup_protocol::constants::{WS_MAX_MESSAGE_SIZE, WS_PONG_WAIT};

use crate::ws_client::PendingMap;

/// Reads messages from the WebSocket and resolves pending requests.
///
/// Any incoming frame resets the liveness deadline. If nothing arrives
/// within [`WS_PONG_WAIT`] the connection is considered dead. On exit all
/// pending requests are dropped so their callers observe a closed
/// connection instead of waiting for the timeout.
pub(crate) async fn read_pump<S>(
    mut read: S,
    pending: PendingMap,
    write_tx: mpsc::Sender<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: StreamExt<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    let pong_deadline = tokio::time::sleep(WS_PONG_WAIT);
    tokio::pin!(pong_deadline);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            () = &mut pong_deadline => {
                warn!("pong timeout, connection dead");
                break;
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(msg)) => {
                        pong_deadline.as_mut().reset(tokio::time::Instant::now() + WS_PONG_WAIT);

                        match msg {
                            tungstenite::Message::Text(text) => {
                                handle_text_message(&text, &pending).await;
                            }
                            tungstenite::Message::Ping(data) => {
                                trace!("received ping, sending pong");
                                let _ = write_tx.send(tungstenite::Message::Pong(data)).await;
                            }
                            tungstenite::Message::Pong(_) => {
                                trace!("received pong");
                            }
                            tungstenite::Message::Close(_) => {
                                debug!("received close frame");
                                break;
                            }
                            _ => {} // Binary: the server never sends any.
                        }
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket read error: {e}");
                        break;
                    }
                    None => {
                        debug!("WebSocket stream ended");
                        break;
                    }
                }
            }
        }
    }

    cancel.cancel();
    pending.lock().await.clear();
}

/// Handles a text message from the WebSocket.
async fn handle_text_message(text: &str, pending: &PendingMap) {
    if text.len() > WS_MAX_MESSAGE_SIZE {
        warn!("message too large ({} bytes), dropping", text.len());
        return;
    }

    let msg: Message = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            warn!("failed to parse message: {e}");
            return;
        }
    };

    trace!(msg_type = ?msg.msg_type, id = %msg.id, "received message");

    let tx = pending.lock().await.remove(&msg.id);
    match tx {
        Some(tx) => {
            let _ = tx.send(msg);
        }
        None => {
            warn!(msg_type = ?msg.msg_type, id = %msg.id, "reply for unknown request, dropping");
        }
    }
}
