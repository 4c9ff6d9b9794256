//! Applying sync decisions
//!
//! The [`Applier`] runs the full evaluate → upload → record sequence for
//! one path, holding a per-path lock across the whole sequence so two
//! concurrent settlements of the same path can never interleave their
//! upload and ledger writes. Different paths proceed fully in parallel.
//!
//! ## Exactly-once recording
//!
//! The ledger is written only *after* the remote confirms the upload.
//! A crash or failure between upload and record re-uploads that version
//! on the next evaluation - duplicate uploads are tolerated, silently
//! dropped versions are not.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use docsync_core::domain::Fingerprint;
use docsync_core::ports::{RemoteStore, SyncLedger};

use crate::detector::{ChangeDetector, Decision, DetectorError, SkipReason};
use crate::SyncError;

// ============================================================================
// Outcome
// ============================================================================

/// What actually happened to a path after a full apply sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Uploaded and recorded; the fingerprint now in the ledger.
    Uploaded(Fingerprint),
    /// The file needs an upload but no remote is configured (degraded
    /// mode). Nothing was recorded, so the upload happens once
    /// credentials return.
    WouldUpload,
    /// Left alone, with the reason.
    Skipped(SkipReason),
    /// The path was gone from disk; its ledger entry (if any) was dropped.
    Removed,
}

// ============================================================================
// Applier
// ============================================================================

/// Runs sync decisions to completion, one path at a time per path.
pub struct Applier {
    detector: ChangeDetector,
    ledger: Arc<dyn SyncLedger>,
    /// `None` in degraded mode: evaluation still runs, uploads do not.
    remote: Option<Arc<dyn RemoteStore>>,
    /// Per-path serialization. Lock entries are tiny and paths in a
    /// watched tree are bounded, so entries are kept for the process
    /// lifetime rather than garbage-collected.
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl Applier {
    pub fn new(
        detector: ChangeDetector,
        ledger: Arc<dyn SyncLedger>,
        remote: Option<Arc<dyn RemoteStore>>,
    ) -> Self {
        Self {
            detector,
            ledger,
            remote,
            locks: DashMap::new(),
        }
    }

    /// True when uploads are disabled for lack of a remote.
    pub fn is_degraded(&self) -> bool {
        self.remote.is_none()
    }

    /// Evaluates and applies one path.
    ///
    /// The per-path lock is held from evaluation through the ledger
    /// write, so the fingerprint recorded is always the one that was
    /// uploaded.
    ///
    /// # Errors
    /// Transient I/O, upload, and ledger failures are returned without
    /// touching the ledger; the path stays dirty and will be retried on
    /// the next event or scan.
    pub async fn apply(&self, path: &Path) -> Result<Outcome, SyncError> {
        let lock = self
            .locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        // The DashMap guard is gone; only the Arc'd mutex is held across
        // the awaits below.
        let _guard = lock.lock().await;

        let decision = self.detector.evaluate(path).await.map_err(|e| match e {
            DetectorError::TransientIo(io) => SyncError::TransientIo(io),
            DetectorError::Ledger(err) => SyncError::Ledger(err),
        })?;

        match decision {
            Decision::Upload { bytes, fingerprint } => {
                self.upload_and_record(path, bytes, fingerprint).await
            }
            Decision::Skip(reason) => {
                debug!(path = %path.display(), reason = ?reason, "Skipping path");
                Ok(Outcome::Skipped(reason))
            }
            Decision::Remove => {
                self.ledger
                    .forget(path)
                    .await
                    .map_err(SyncError::Ledger)?;
                info!(path = %path.display(), "Removed deleted path from ledger");
                Ok(Outcome::Removed)
            }
        }
    }

    async fn upload_and_record(
        &self,
        path: &Path,
        bytes: Vec<u8>,
        fingerprint: Fingerprint,
    ) -> Result<Outcome, SyncError> {
        let Some(remote) = &self.remote else {
            warn!(
                path = %path.display(),
                "File changed but sync is degraded (no credentials); not uploading"
            );
            return Ok(Outcome::WouldUpload);
        };

        let name = file_name_for_upload(path);
        let size = bytes.len();

        let receipt = remote.upload(&name, bytes).await?;

        self.ledger
            .record_synced(path, &fingerprint)
            .await
            .map_err(SyncError::Ledger)?;

        info!(
            path = %path.display(),
            size,
            remote_id = %receipt.remote_id,
            "Uploaded and recorded"
        );

        Ok(Outcome::Uploaded(fingerprint))
    }
}

/// The remote stores documents by name; the final path component is the
/// natural one.
fn file_name_for_upload(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

// ============================================================================
// Unit tests
// ============================================================================
