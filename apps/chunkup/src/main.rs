//! `chunkup`: resumable chunked uploads over WebSocket.
//!
//! ```text
//! chunkup serve                          # listen on the configured port
//! chunkup serve -p 6000 -u /srv/uploads  # override port and upload root
//! chunkup upload ws://host:5000 big.iso  # upload (or resume) a file
//! ```

mod app;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chunkup", version, about = "Resumable chunked file uploads")]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Accept uploads and store them under the upload root.
    Serve {
        /// Override the listening port.
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the upload root directory.
        #[arg(short, long)]
        upload_root: Option<PathBuf>,
    },

    /// Upload a file, sending only the chunks the server is missing.
    Upload {
        /// Server address, e.g. `ws://127.0.0.1:5000`.
        url: String,

        /// File to upload.
        file: PathBuf,

        /// Override the number of chunks sent in parallel.
        #[arg(short = 'j', long)]
        concurrency: Option<usize>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = config::Config::load(cli.config.as_deref())?;

    let rt = tokio::runtime::Runtime::new()?;
    match cli.command {
        Commands::Serve { port, upload_root } => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(root) = upload_root {
                config.upload_root = root;
            }
            tracing::info!(
                version = env!("CARGO_PKG_VERSION"),
                port = config.port,
                "starting chunkup server"
            );
            rt.block_on(app::serve(config))?;
            tracing::info!("server shut down cleanly");
        }
        Commands::Upload {
            url,
            file,
            concurrency,
        } => {
            if let Some(concurrency) = concurrency {
                config.concurrency = concurrency;
            }
            rt.block_on(app::upload(config, &url, &file))?;
        }
    }

    Ok(())
}
