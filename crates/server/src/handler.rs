//! Handler trait for processing WebSocket messages.
//!
//! Implementors provide the upload operations while the server framework
//! handles connection management, routing and the binary frame format.

use std::future::Future;
use std::pin::Pin;

use chunkup_protocol::constants::CODE_NOT_IMPLEMENTED;
use chunkup_protocol::{ChunkFrameHeader, Message, MessageType};

use crate::connection::Sender;

/// A boxed future returned by handler methods.
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Trait for handling messages from an upload client.
///
/// Each method receives a `sender` for replies and the decoded request.
/// Default implementations reply with "not implemented" so handlers only
/// override what they support.
pub trait Handler: Send + Sync + 'static {
    /// Called for `ping` messages.
    fn on_ping(&self, sender: Sender, msg: Message) -> HandlerFuture<'_> {
        Box::pin(async move {
            if let Ok(reply) = msg.reply(MessageType::Pong, Option::<&()>::None) {
                let _ = sender.send_msg(reply);
            }
        })
    }

    /// Called for `query_chunks`.
    fn on_query_chunks(&self, sender: Sender, msg: Message) -> HandlerFuture<'_> {
        Box::pin(async move {
            let _ = sender.send_error(&msg, CODE_NOT_IMPLEMENTED, "not implemented");
        })
    }

    /// Called for `merge_chunks`.
    fn on_merge_chunks(&self, sender: Sender, msg: Message) -> HandlerFuture<'_> {
        Box::pin(async move {
            let _ = sender.send_error(&msg, CODE_NOT_IMPLEMENTED, "not implemented");
        })
    }

    /// Called for a binary chunk frame.
    fn on_binary_chunk(
        &self,
        sender: Sender,
        header: ChunkFrameHeader,
        _data: Vec<u8>,
    ) -> HandlerFuture<'_> {
        Box::pin(async move {
            tracing::warn!(
                file = %header.file_name,
                "binary chunk received but handler not implemented"
            );
            let _ = sender.send_msg(Message::error(
                header.id,
                CODE_NOT_IMPLEMENTED,
                "not implemented",
            ));
        })
    }

    /// Called when a client disconnects (cleanup hook).
    fn on_disconnected(&self, _peer: &str) -> HandlerFuture<'_> {
        Box::pin(async {})
    }
}
