//! Sync ledger port (driven/secondary port)
//!
//! The ledger is the durable record of "what we believe is already
//! uploaded": one row per path, holding the fingerprint of the last
//! confirmed upload. It is the single source of truth for sync status;
//! nothing is ever inferred from the remote store.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific
//!   (SQLite, in-memory, etc.) and don't need domain-level classification.
//! - The "does this path need syncing" comparison is deliberately *not* a
//!   ledger method: it requires reading the file, and file I/O belongs to
//!   the change detector, not the persistence port.
//! - A failed mid-run write is logged and surfaced by the caller, never
//!   fatal to the watch loop; only a ledger that cannot be *opened* at
//!   startup refuses service.

use std::path::Path;

use crate::domain::{Fingerprint, TrackedFile};

/// Port trait for the durable sync ledger.
///
/// Implementations must guarantee that individual operations are atomic and
/// survive a process crash between operations. Callers serialize the
/// check-upload-record sequence per path; the ledger itself only promises
/// per-operation atomicity.
#[async_trait::async_trait]
pub trait SyncLedger: Send + Sync {
    /// Retrieves the tracked-file row for a path, if one exists.
    ///
    /// `None` means the path was never uploaded or was explicitly forgotten.
    async fn get(&self, path: &Path) -> anyhow::Result<Option<TrackedFile>>;

    /// Records a confirmed upload: inserts a new row or overwrites the
    /// existing row's fingerprint and timestamp.
    ///
    /// Idempotent: recording the same `(path, fingerprint)` twice leaves the
    /// same observable state.
    async fn record_synced(&self, path: &Path, fingerprint: &Fingerprint) -> anyhow::Result<()>;

    /// Removes the row for a path. No-op when no row exists.
    async fn forget(&self, path: &Path) -> anyhow::Result<()>;

    /// Lists all tracked files, ordered by path.
    async fn list(&self) -> anyhow::Result<Vec<TrackedFile>>;
}
