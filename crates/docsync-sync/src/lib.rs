//! docsync sync - the continuous synchronization engine
//!
//! Watches a directory tree, decides which files have semantically changed
//! since their last confirmed upload, and pushes exactly one upload per
//! distinct content version to the remote document store, resuming cleanly
//! across restarts.
//!
//! ## Modules
//!
//! - [`fingerprint`] - content hashing of file bytes
//! - [`detector`] - per-path upload/skip/remove decision policy
//! - [`watcher`] - notify-based filesystem event source
//! - [`debounce`] - settle-window coalescing of event bursts
//! - [`apply`] - per-path serialized evaluate → upload → record sequence
//! - [`scanner`] - initial full-tree reconciliation
//! - [`engine`] - the watch loop state machine tying it all together
//! - [`filesystem`] - workspace-files adapter for collaborator components

pub mod apply;
pub mod debounce;
pub mod detector;
pub mod engine;
pub mod filesystem;
pub mod fingerprint;
pub mod scanner;
pub mod watcher;

use thiserror::Error;

use docsync_core::ports::RemoteStoreError;

/// Errors that can occur while evaluating and applying a single path.
///
/// Every variant leaves the ledger untouched for that path, so the file
/// stays eligible for re-evaluation on the next filesystem event or scan.
/// None of these ever halts the scan or the watch loop.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The file disappeared or was unreadable mid-evaluation. Not fatal:
    /// the next notification or scan retries naturally.
    #[error("file not ready for evaluation: {0}")]
    TransientIo(#[from] std::io::Error),

    /// The upload call failed (unauthorized, unreachable, or rejected).
    #[error("upload failed: {0}")]
    Upload(#[from] RemoteStoreError),

    /// A ledger read or write failed mid-run. Logged and surfaced, never a
    /// crash of the watch loop.
    #[error("ledger operation failed: {0}")]
    Ledger(#[source] anyhow::Error),
}
