//! Upload coordinator: fingerprint, resume, windowed chunk upload, merge.

use std::collections::HashSet;
use std::path::Path;

use chunkup_protocol::FileIdentity;
use chunkup_protocol::constants::CODE_NOT_FOUND;
use chunkup_protocol::messages::Status;
use chunkup_transfer::{ChunkDescriptor, ChunkReader};
use futures_util::future::join_all;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::connection::ChunkConnection;
use crate::error::UploadError;
use crate::types::{ClientConfig, UploadEvent, UploadOutcome};

/// Drives one file upload over a [`ChunkConnection`].
pub struct UploadCoordinator<'a> {
    conn: &'a dyn ChunkConnection,
    config: ClientConfig,
    cancel: CancellationToken,
    events: Option<mpsc::Sender<UploadEvent>>,
}

impl<'a> UploadCoordinator<'a> {
    pub fn new(conn: &'a dyn ChunkConnection, config: ClientConfig) -> Self {
        Self {
            conn,
            config,
            cancel: CancellationToken::new(),
            events: None,
        }
    }

    /// Checks `cancel` between batches and before merging.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Emits progress on `events`. A full or closed channel never affects
    /// the upload.
    pub fn with_events(mut self, events: mpsc::Sender<UploadEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Uploads the file at `path`, sending only chunks the server lacks.
    ///
    /// Batches of `concurrency` chunks are sent in parallel; each batch
    /// settles fully before the next starts. Any failed chunk aborts the
    /// upload after its batch settles. Restarting is cheap: the next run
    /// resumes from whatever the server stored.
    pub async fn upload(&self, path: &Path) -> Result<UploadOutcome, UploadError> {
        let result = self.run(path).await;
        if let Err(e) = &result {
            warn!(path = %path.display(), "upload failed: {e}");
            self.emit(UploadEvent::Failed {
                error: e.to_string(),
            });
        }
        result
    }

    async fn run(&self, path: &Path) -> Result<UploadOutcome, UploadError> {
        self.config.validate()?;

        // 1. Fingerprint.
        let mut reader = ChunkReader::open(path).await?;
        let identity = reader.fingerprint().await?;
        let size = reader.file_size();
        self.emit(UploadEvent::Fingerprinted {
            identity: identity.clone(),
            bytes: size,
        });
        self.check_cancelled()?;

        // 2. Resume query.
        let status = self.conn.query_chunks(&identity).await?;
        let received: HashSet<String> = match status.status {
            Status::AlreadyMerged => {
                let artifact_path = status.artifact_path.ok_or_else(|| {
                    UploadError::UnexpectedReply("already-merged without artifactPath".into())
                })?;
                info!(hash = %identity.hash, artifact = %artifact_path, "already uploaded");
                self.emit(UploadEvent::Merged {
                    artifact_path: artifact_path.clone(),
                });
                return Ok(UploadOutcome {
                    file_name: identity.artifact_name(),
                    identity,
                    artifact_path,
                    chunks_total: 0,
                    chunks_sent: 0,
                    already_merged: true,
                });
            }
            Status::Partial | Status::Fresh => status.chunks.into_iter().collect(),
            other => {
                return Err(UploadError::UnexpectedReply(format!(
                    "resume status {other:?}"
                )));
            }
        };

        // 3. Split and filter.
        let plan = self.config.split.plan(&identity, size)?;
        let pending: Vec<&ChunkDescriptor> = plan
            .iter()
            .filter(|d| !received.contains(&d.file_name()))
            .collect();
        let already_stored = plan.len() - pending.len();
        debug!(
            hash = %identity.hash,
            chunks = plan.len(),
            already_stored,
            "resume state applied"
        );
        self.emit(UploadEvent::Resumed {
            total: plan.len(),
            already_stored,
        });

        // 4. Windowed upload.
        let mut sent = 0usize;
        for (index, window) in pending.chunks(self.config.concurrency).enumerate() {
            self.check_cancelled()?;

            let mut payloads = Vec::with_capacity(window.len());
            for descriptor in window {
                payloads.push(reader.read(descriptor).await?);
            }

            let results = join_all(payloads.iter().map(|p| self.conn.upload_chunk(p))).await;

            let mut failed = 0usize;
            let mut first_error = None;
            for (payload, result) in payloads.iter().zip(results) {
                match result {
                    Ok(()) => {
                        sent += 1;
                        debug!(
                            hash = %identity.hash,
                            sequence = payload.descriptor.sequence,
                            bytes = payload.descriptor.len,
                            "chunk sent"
                        );
                        self.emit(UploadEvent::ChunkSent {
                            sequence: payload.descriptor.sequence,
                            bytes: payload.descriptor.len,
                            sent,
                            remaining: pending.len() - sent,
                        });
                    }
                    Err(e) => {
                        warn!(
                            hash = %identity.hash,
                            sequence = payload.descriptor.sequence,
                            "chunk upload failed: {e}"
                        );
                        failed += 1;
                        first_error.get_or_insert(e);
                    }
                }
            }

            if let Some(source) = first_error {
                return Err(UploadError::Aborted {
                    failed,
                    batch: index + 1,
                    source: Box::new(source),
                });
            }
        }

        // 5. Merge.
        self.check_cancelled()?;
        let merged = match self.conn.merge_chunks(&identity.hash).await {
            Ok(merged) => merged,
            Err(UploadError::Server {
                code: CODE_NOT_FOUND,
                message,
            }) => match self.merged_elsewhere(&identity).await? {
                Some(artifact_path) => {
                    info!(
                        hash = %identity.hash,
                        artifact = %artifact_path,
                        sent,
                        "merged by a concurrent upload"
                    );
                    self.emit(UploadEvent::Merged {
                        artifact_path: artifact_path.clone(),
                    });
                    return Ok(UploadOutcome {
                        file_name: identity.artifact_name(),
                        identity,
                        artifact_path,
                        chunks_total: plan.len(),
                        chunks_sent: sent,
                        already_merged: true,
                    });
                }
                None => {
                    return Err(UploadError::Server {
                        code: CODE_NOT_FOUND,
                        message,
                    });
                }
            },
            Err(e) => return Err(e),
        };
        info!(
            hash = %identity.hash,
            chunks = plan.len(),
            sent,
            artifact = %merged.artifact_path,
            "upload complete"
        );
        self.emit(UploadEvent::Merged {
            artifact_path: merged.artifact_path.clone(),
        });

        Ok(UploadOutcome {
            identity,
            artifact_path: merged.artifact_path,
            file_name: merged.file_name,
            chunks_total: plan.len(),
            chunks_sent: sent,
            already_merged: false,
        })
    }

    /// After a not-found merge, asks whether another upload of the same
    /// content already produced the artifact.
    async fn merged_elsewhere(
        &self,
        identity: &FileIdentity,
    ) -> Result<Option<String>, UploadError> {
        let status = self.conn.query_chunks(identity).await?;
        match status.status {
            Status::AlreadyMerged => Ok(status.artifact_path),
            _ => Ok(None),
        }
    }

    fn check_cancelled(&self) -> Result<(), UploadError> {
        if self.cancel.is_cancelled() {
            return Err(UploadError::Cancelled);
        }
        Ok(())
    }

    fn emit(&self, event: UploadEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.try_send(event);
        }
    }
}
