//! Startup reconciliation scan
//!
//! The scan makes the ledger agree with the filesystem before any live
//! event is processed: every eligible file on disk is evaluated (catching
//! edits and creations that happened while the daemon was down), and every
//! ledger entry whose file is gone is dropped (catching offline deletions).
//! A path whose content still matches its ledger entry costs one read and
//! no network traffic.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};
use walkdir::WalkDir;

use docsync_core::ports::SyncLedger;

use crate::apply::{Applier, Outcome};
use crate::watcher::is_hidden;

// ============================================================================
// ScanSummary
// ============================================================================

/// Counters for one reconciliation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    /// Paths evaluated (files on disk plus stale ledger entries).
    pub evaluated: usize,
    /// Files uploaded and recorded.
    pub uploaded: usize,
    /// Files that needed an upload but sync is degraded.
    pub would_upload: usize,
    /// Files left alone (unchanged, wrong extension, too large, non-file).
    pub skipped: usize,
    /// Ledger entries dropped for files gone from disk.
    pub removed: usize,
    /// Paths whose evaluation or upload failed; retried on later events.
    pub failed: usize,
}

// ============================================================================
// Tree walk
// ============================================================================

/// Lists every file under `root`, pruning hidden subtrees entirely.
///
/// Directory walking is blocking I/O, kept off the async runtime.
async fn collect_files(root: &Path) -> Vec<PathBuf> {
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || {
        WalkDir::new(&root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| !is_hidden(&root, entry.path()))
            .filter_map(|entry| match entry {
                Ok(e) if e.file_type().is_file() => Some(e.into_path()),
                Ok(_) => None,
                Err(err) => {
                    warn!(error = %err, "Skipping unreadable entry during scan");
                    None
                }
            })
            .collect()
    })
    .await
    .unwrap_or_default()
}

/// Reconciles the ledger with the tree under `root`.
///
/// Never aborts on a per-path failure; failed paths are counted and left
/// for the watch loop to retry.
pub async fn scan_tree(
    root: &Path,
    applier: &Applier,
    ledger: &Arc<dyn SyncLedger>,
) -> ScanSummary {
    info!(root = %root.display(), "Starting reconciliation scan");

    let mut summary = ScanSummary::default();

    let on_disk = collect_files(root).await;
    let on_disk_set: HashSet<&PathBuf> = on_disk.iter().collect();

    for path in &on_disk {
        summary.evaluated += 1;
        match applier.apply(path).await {
            Ok(Outcome::Uploaded(_)) => summary.uploaded += 1,
            Ok(Outcome::WouldUpload) => summary.would_upload += 1,
            Ok(Outcome::Skipped(_)) => summary.skipped += 1,
            Ok(Outcome::Removed) => summary.removed += 1,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Scan evaluation failed");
                summary.failed += 1;
            }
        }
    }

    // Offline deletions: ledger entries whose files are gone.
    match ledger.list().await {
        Ok(tracked) => {
            for entry in tracked {
                if on_disk_set.contains(&entry.path) {
                    continue;
                }
                summary.evaluated += 1;
                match applier.apply(&entry.path).await {
                    Ok(Outcome::Removed) => summary.removed += 1,
                    Ok(_) => summary.skipped += 1,
                    Err(err) => {
                        warn!(
                            path = %entry.path.display(),
                            error = %err,
                            "Stale ledger entry cleanup failed"
                        );
                        summary.failed += 1;
                    }
                }
            }
        }
        Err(err) => {
            warn!(error = %err, "Could not list ledger for stale-entry cleanup");
        }
    }

    info!(
        evaluated = summary.evaluated,
        uploaded = summary.uploaded,
        would_upload = summary.would_upload,
        skipped = summary.skipped,
        removed = summary.removed,
        failed = summary.failed,
        "Reconciliation scan complete"
    );

    summary
}

// ============================================================================
// Unit tests
// ============================================================================
