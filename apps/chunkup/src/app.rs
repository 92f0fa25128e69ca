//! Subcommand runners.

use std::path::Path;
use std::sync::Arc;

use chunkup_client::{UploadCoordinator, UploadEvent, WsClient};
use chunkup_server::{ServerConfig, StoreHandler, UploadServer};
use chunkup_store::ChunkStore;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::Config;

/// Serves uploads until Ctrl-C.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let store = ChunkStore::open(config.store_config()).await?;
    tracing::info!(
        root = %config.upload_root.display(),
        max_chunks = config.max_chunk_count,
        "chunk store ready"
    );

    let server = UploadServer::new(
        ServerConfig { port: config.port },
        StoreHandler::new(Arc::new(store)),
    );
    let server_run = Arc::clone(&server);
    let mut task = tokio::spawn(async move { server_run.run().await });

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("shutdown requested");
            server.shutdown();
            task.await??;
        }
        // The server only returns on its own when binding fails.
        result = &mut task => {
            result??;
        }
    }

    Ok(())
}

/// Uploads `file` to the server at `url`, printing progress.
pub async fn upload(config: Config, url: &str, file: &Path) -> anyhow::Result<()> {
    let client = WsClient::connect(url).await?;
    tracing::info!(url, "connected");

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping after current batch");
            on_interrupt.cancel();
        }
    });

    let (tx, mut rx) = mpsc::channel(64);
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            print_event(&event);
        }
    });

    let result = UploadCoordinator::new(&client, config.client_config())
        .with_cancel(cancel)
        .with_events(tx)
        .upload(file)
        .await;

    client.close().await;
    let _ = printer.await;

    let outcome = result?;
    if outcome.already_merged {
        println!("already on server: {}", outcome.artifact_path);
    } else {
        println!(
            "uploaded {} ({} of {} chunks sent): {}",
            outcome.file_name, outcome.chunks_sent, outcome.chunks_total, outcome.artifact_path
        );
    }
    Ok(())
}

fn print_event(event: &UploadEvent) {
    match event {
        UploadEvent::Fingerprinted { identity, bytes } => {
            println!("fingerprint {} ({bytes} bytes)", identity.hash);
        }
        UploadEvent::Resumed {
            total,
            already_stored,
        } => {
            println!("{already_stored} of {total} chunks already on server");
        }
        UploadEvent::ChunkSent {
            sequence,
            sent,
            remaining,
            ..
        } => {
            println!("chunk {sequence} sent ({sent} done, {remaining} left)");
        }
        UploadEvent::Merged { artifact_path } => {
            println!("merged: {artifact_path}");
        }
        UploadEvent::Failed { error } => {
            eprintln!("failed: {error}");
        }
    }
}
