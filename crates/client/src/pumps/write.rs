//! WebSocket write pump: sends queued frames and keepalive pings.

use futures_util::SinkExt;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{error, trace};

use chunkup_protocol::constants::WS_PING_PERIOD;

/// Owns the sink half of the socket.
///
/// Requests, chunk frames and pongs arrive on `write_rx`. A ping goes out
/// every [`WS_PING_PERIOD`] so the server's liveness deadline holds while
/// a window of large chunks is still being written.
pub(crate) async fn write_pump<S>(
    mut write: S,
    mut write_rx: mpsc::Receiver<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: SinkExt<tungstenite::Message, Error = tungstenite::Error> + Unpin,
{
    let mut keepalive = tokio::time::interval_at(Instant::now() + WS_PING_PERIOD, WS_PING_PERIOD);
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            msg = write_rx.recv() => {
                let Some(msg) = msg else { break };
                if let Err(e) = write.send(msg).await {
                    error!("WebSocket write error: {e}");
                    break;
                }
            }

            _ = keepalive.tick() => {
                trace!("sending keepalive ping");
                if let Err(e) = write.send(tungstenite::Message::Ping(Vec::new().into())).await {
                    error!("WebSocket ping error: {e}");
                    break;
                }
            }
        }
    }

    let _ = write.send(tungstenite::Message::Close(None)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::sink;

    fn channel_sink(
        tx: mpsc::Sender<tungstenite::Message>,
    ) -> impl futures_util::Sink<tungstenite::Message, Error = tungstenite::Error> {
        sink::unfold(tx, |tx, msg: tungstenite::Message| async move {
            let _ = tx.send(msg).await;
            Ok::<_, tungstenite::Error>(tx)
        })
    }

    #[tokio::test]
    async fn forwards_frames_then_closes() {
        let (sink_tx, mut sink_rx) = mpsc::channel(16);
        let (write_tx, write_rx) = mpsc::channel(16);
        let handle = tokio::spawn(write_pump(
            Box::pin(channel_sink(sink_tx)),
            write_rx,
            CancellationToken::new(),
        ));

        write_tx
            .send(tungstenite::Message::Text("query".to_string().into()))
            .await
            .unwrap();
        write_tx
            .send(tungstenite::Message::Binary(vec![0, 0, 0, 2].into()))
            .await
            .unwrap();
        drop(write_tx);
        handle.await.unwrap();

        assert!(matches!(
            sink_rx.recv().await,
            Some(tungstenite::Message::Text(t)) if t.as_str() == "query"
        ));
        assert!(matches!(
            sink_rx.recv().await,
            Some(tungstenite::Message::Binary(_))
        ));
        assert!(matches!(
            sink_rx.recv().await,
            Some(tungstenite::Message::Close(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn pings_once_per_period() {
        let (sink_tx, mut sink_rx) = mpsc::channel(16);
        let (_write_tx, write_rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(write_pump(
            Box::pin(channel_sink(sink_tx)),
            write_rx,
            cancel.clone(),
        ));

        tokio::time::advance(WS_PING_PERIOD / 2).await;
        assert!(sink_rx.try_recv().is_err(), "no ping before the first period");

        tokio::time::advance(WS_PING_PERIOD).await;
        assert!(matches!(
            sink_rx.recv().await,
            Some(tungstenite::Message::Ping(_))
        ));

        cancel.cancel();
        handle.await.unwrap();
        assert!(matches!(
            sink_rx.recv().await,
            Some(tungstenite::Message::Close(_))
        ));
    }

    #[tokio::test]
    async fn stops_on_cancel() {
        let (sink_tx, mut sink_rx) = mpsc::channel(16);
        let (_write_tx, write_rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(write_pump(
            Box::pin(channel_sink(sink_tx)),
            write_rx,
            cancel.clone(),
        ));

        cancel.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(2), handle)
            .await
            .expect("pump should stop")
            .expect("no panic");

        assert!(matches!(
            sink_rx.recv().await,
            Some(tungstenite::Message::Close(_))
        ));
    }
}
