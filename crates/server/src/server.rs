//! Upload WebSocket server.
//!
//! Listens on a TCP port and upgrades every accepted connection to
//! WebSocket. Connections are independent; per-hash ordering is enforced
//! by the store, not here.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_tungstenite::accept_async_with_config;
use tokio_util::sync::CancellationToken;

use chunkup_protocol::constants::WS_MAX_MESSAGE_SIZE;

use crate::ServerError;
use crate::connection::{self, PeerConnection};
use crate::handler::Handler;

/// Server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// TCP port to listen on (0 = OS-assigned).
    pub port: u16,
}

/// The upload WebSocket server.
pub struct UploadServer<H: Handler> {
    port: u16,
    handler: Arc<H>,
    peers: Mutex<Vec<PeerConnection>>,
    cancel: CancellationToken,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl<H: Handler> UploadServer<H> {
    /// Creates a new server with the given handler.
    pub fn new(config: ServerConfig, handler: H) -> Arc<Self> {
        Arc::new(Self {
            port: config.port,
            handler: Arc::new(handler),
            peers: Mutex::new(Vec::new()),
            cancel: CancellationToken::new(),
            local_addr: Mutex::new(None),
        })
    }

    /// Returns the local address the server is listening on.
    ///
    /// Only available after [`run`](Self::run) binds the socket.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().await
    }

    /// Returns the listening port (0 if not yet bound).
    pub async fn port(&self) -> u16 {
        self.local_addr.lock().await.map(|a| a.port()).unwrap_or(0)
    }

    /// Number of clients currently connected.
    pub async fn connection_count(&self) -> usize {
        let mut peers = self.peers.lock().await;
        peers.retain(|p| p.sender().is_connected());
        peers.len()
    }

    /// Gracefully shuts down the server and all connections.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Runs the server until cancellation.
    pub async fn run(self: &Arc<Self>) -> Result<(), ServerError> {
        let addr: SocketAddr = ([0, 0, 0, 0], self.port).into();
        let listener = TcpListener::bind(addr).await?;

        let local_addr = listener.local_addr()?;
        *self.local_addr.lock().await = Some(local_addr);
        tracing::info!("upload server listening on {local_addr}");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("server shutting down");
                    for peer in self.peers.lock().await.drain(..) {
                        peer.close();
                    }
                    break Ok(());
                }

                result = listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            let server = Arc::clone(self);
                            tokio::spawn(async move {
                                if let Err(e) = server.handle_connection(stream, peer_addr).await {
                                    tracing::error!(%peer_addr, "connection error: {e}");
                                }
                            });
                        }
                        Err(e) => {
                            tracing::error!("accept error: {e}");
                        }
                    }
                }
            }
        }
    }

    /// Upgrades a TCP connection to WS and starts its pumps.
    async fn handle_connection(
        self: &Arc<Self>,
        stream: tokio::net::TcpStream,
        peer_addr: SocketAddr,
    ) -> Result<(), ServerError> {
        let mut ws_config = tokio_tungstenite::tungstenite::protocol::WebSocketConfig::default();
        ws_config.max_message_size = Some(WS_MAX_MESSAGE_SIZE);
        ws_config.max_frame_size = Some(WS_MAX_MESSAGE_SIZE);
        let ws_stream = accept_async_with_config(stream, Some(ws_config)).await?;
        tracing::info!(peer = %peer_addr, "WebSocket connection established");

        let conn = connection::spawn_connection(
            ws_stream,
            peer_addr.to_string(),
            Arc::clone(&self.handler),
            self.cancel.clone(),
        );

        let mut peers = self.peers.lock().await;
        peers.retain(|p| p.sender().is_connected());
        peers.push(conn);

        Ok(())
    }
}
