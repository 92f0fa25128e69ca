//! Configuration for both subcommands.
//!
//! Stored as TOML, by default at `~/.config/chunkup/chunkup.toml`. Every
//! field has a default, so a partial or missing file is fine.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chunkup_client::ClientConfig;
use chunkup_protocol::constants::{
    DEFAULT_CHUNK_SIZE, DEFAULT_CONCURRENCY, DEFAULT_MAX_CHUNK_COUNT,
};
use chunkup_store::StoreConfig;
use chunkup_transfer::SplitConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// WebSocket server port (0 = auto-assign).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding chunk directories and merged artifacts.
    #[serde(default = "default_upload_root")]
    pub upload_root: PathBuf,

    /// Base URL prefixed to artifact names in replies. Empty reports the
    /// filesystem path instead.
    #[serde(default)]
    pub public_base: String,

    #[serde(default = "default_max_chunk_count")]
    pub max_chunk_count: u32,

    /// Target chunk size in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,

    /// Chunks uploaded in parallel per batch.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_port() -> u16 {
    5000
}

fn default_upload_root() -> PathBuf {
    PathBuf::from("./upload")
}

fn default_max_chunk_count() -> u32 {
    DEFAULT_MAX_CHUNK_COUNT
}

fn default_chunk_size() -> u64 {
    DEFAULT_CHUNK_SIZE
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            upload_root: default_upload_root(),
            public_base: String::new(),
            max_chunk_count: default_max_chunk_count(),
            chunk_size: default_chunk_size(),
            concurrency: default_concurrency(),
        }
    }
}

impl Config {
    /// Loads `path`, or the default location when `None`.
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_path(),
        };

        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            upload_root: self.upload_root.clone(),
            public_base: self.public_base.clone(),
            max_chunk_count: self.max_chunk_count,
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            split: SplitConfig {
                chunk_size: self.chunk_size,
                max_chunk_count: self.max_chunk_count,
            },
            concurrency: self.concurrency,
        }
    }
}

/// Returns the platform-specific configuration file path.
pub fn default_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("chunkup").join("chunkup.toml")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("chunkup")
            .join("chunkup.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.upload_root, PathBuf::from("./upload"));
        assert_eq!(config.public_base, "");
        assert_eq!(config.max_chunk_count, 100);
        assert_eq!(config.chunk_size, 1_048_576);
        assert_eq!(config.concurrency, 3);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            port = 8080
            public_base = "http://files.local"
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.public_base, "http://files.local");
        assert_eq!(config.chunk_size, 1_048_576);
        assert_eq!(config.concurrency, 3);
    }

    #[test]
    fn missing_file_means_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&tmp.path().join("absent.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("chunkup.toml");
        std::fs::write(&path, "upload_root = \"/srv/uploads\"\nconcurrency = 8\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.upload_root, PathBuf::from("/srv/uploads"));
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.port, 5000);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("chunkup.toml");
        std::fs::write(&path, "port = \"not a number\"").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn derived_configs() {
        let config = Config {
            chunk_size: 4096,
            max_chunk_count: 7,
            concurrency: 2,
            ..Config::default()
        };
        let client = config.client_config();
        assert_eq!(client.split.chunk_size, 4096);
        assert_eq!(client.split.max_chunk_count, 7);
        assert_eq!(client.concurrency, 2);

        let store = config.store_config();
        assert_eq!(store.max_chunk_count, 7);
        assert_eq!(store.upload_root, PathBuf::from("./upload"));
    }

    #[test]
    fn default_path_not_empty() {
        assert!(default_path().to_string_lossy().contains("chunkup"));
    }
}
