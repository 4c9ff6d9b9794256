//! Per-path sync decision policy
//!
//! The [`ChangeDetector`] answers one question for a settled path: does
//! this path need an upload, a ledger removal, or nothing at all? The
//! decision is made fresh at evaluation time from the live filesystem and
//! the ledger, never from the event that triggered it - by the time a
//! burst settles, the event kind is stale information.
//!
//! ## Decision order
//!
//! 1. Path missing on disk → [`Decision::Remove`]
//! 2. Not a regular file → skip
//! 3. Extension not in the configured set → skip
//! 4. Larger than the size ceiling → skip
//! 5. Fingerprint equals the ledger entry → skip (already synced)
//! 6. Otherwise → upload, carrying the bytes just read so the upload body
//!    is exactly what was fingerprinted

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use docsync_core::config::SyncConfig;
use docsync_core::domain::Fingerprint;
use docsync_core::ports::SyncLedger;

use crate::fingerprint::fingerprint_file;

// ============================================================================
// Policy
// ============================================================================

/// Static eligibility policy derived from configuration.
#[derive(Debug, Clone)]
pub struct SyncPolicy {
    /// Allowed file extensions, lowercased, without the leading dot.
    extensions: HashSet<String>,
    /// Maximum file size in bytes.
    max_file_size: u64,
}

impl SyncPolicy {
    pub fn new(extensions: impl IntoIterator<Item = String>, max_file_size: u64) -> Self {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            max_file_size,
        }
    }

    /// Builds the policy from the sync section of the configuration.
    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.extensions.clone(), config.max_file_size_kib * 1024)
    }

    /// Extension check is case-insensitive: `REPORT.MD` syncs like
    /// `report.md`.
    pub fn extension_allowed(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| {
                self.extensions
                    .contains(&ext.to_string_lossy().to_ascii_lowercase())
            })
            .unwrap_or(false)
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }
}

// ============================================================================
// Decision types
// ============================================================================

/// Why a path was left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The path exists but is a directory, symlink, or other non-file.
    NotAFile,
    /// The file's extension is not in the configured set.
    UnsupportedExtension,
    /// The file exceeds the size ceiling; actual size in bytes.
    TooLarge(u64),
    /// The ledger already holds this exact content version.
    AlreadySynced,
}

/// The outcome of evaluating one path.
pub enum Decision {
    /// The file has new content; the carried bytes are what must be
    /// uploaded, and the fingerprint was computed from exactly those bytes.
    Upload {
        bytes: Vec<u8>,
        fingerprint: Fingerprint,
    },
    /// No action needed.
    Skip(SkipReason),
    /// The path is gone from disk; any ledger entry for it must be dropped.
    Remove,
}

impl std::fmt::Debug for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Upload { bytes, fingerprint } => f
                .debug_struct("Upload")
                .field("len", &bytes.len())
                .field("fingerprint", fingerprint)
                .finish(),
            Decision::Skip(reason) => f.debug_tuple("Skip").field(reason).finish(),
            Decision::Remove => write!(f, "Remove"),
        }
    }
}

/// Errors that prevent reaching a decision at all.
///
/// Both variants mean "try again on the next event or scan"; neither
/// mutates the ledger.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("could not read file for evaluation: {0}")]
    TransientIo(#[from] std::io::Error),

    #[error("ledger lookup failed: {0}")]
    Ledger(#[source] anyhow::Error),
}

// ============================================================================
// ChangeDetector
// ============================================================================

/// Decides, per path, whether an upload is due.
pub struct ChangeDetector {
    ledger: Arc<dyn SyncLedger>,
    policy: SyncPolicy,
}

impl ChangeDetector {
    pub fn new(ledger: Arc<dyn SyncLedger>, policy: SyncPolicy) -> Self {
        Self { ledger, policy }
    }

    /// Evaluates one path against the filesystem and the ledger.
    ///
    /// A file that vanishes between the metadata check and the read is
    /// reported as [`Decision::Remove`], same as one that was already gone.
    ///
    /// # Errors
    /// I/O failures other than not-found, and ledger lookup failures, are
    /// returned without a decision; the path stays eligible for retry.
    pub async fn evaluate(&self, path: &Path) -> Result<Decision, DetectorError> {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Path gone from disk");
                return Ok(Decision::Remove);
            }
            Err(e) => return Err(DetectorError::TransientIo(e)),
        };

        if !metadata.is_file() {
            return Ok(Decision::Skip(SkipReason::NotAFile));
        }

        if !self.policy.extension_allowed(path) {
            return Ok(Decision::Skip(SkipReason::UnsupportedExtension));
        }

        if metadata.len() > self.policy.max_file_size() {
            debug!(
                path = %path.display(),
                size = metadata.len(),
                limit = self.policy.max_file_size(),
                "File exceeds size ceiling"
            );
            return Ok(Decision::Skip(SkipReason::TooLarge(metadata.len())));
        }

        let (bytes, fingerprint) = match fingerprint_file(path).await {
            Ok(pair) => pair,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Deleted between metadata and read.
                return Ok(Decision::Remove);
            }
            Err(e) => return Err(DetectorError::TransientIo(e)),
        };

        let recorded = self
            .ledger
            .get(path)
            .await
            .map_err(DetectorError::Ledger)?;

        if let Some(tracked) = recorded {
            if tracked.fingerprint == fingerprint {
                return Ok(Decision::Skip(SkipReason::AlreadySynced));
            }
        }

        Ok(Decision::Upload { bytes, fingerprint })
    }
}

// ============================================================================
// Unit tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MemoryLedger;

    fn policy() -> SyncPolicy {
        SyncPolicy::new(vec!["txt".to_string(), "md".to_string()], 1024)
    }

    fn detector(ledger: Arc<MemoryLedger>) -> ChangeDetector {
        ChangeDetector::new(ledger, policy())
    }

    #[test]
    fn test_extension_check_case_insensitive() {
        let p = policy();
        assert!(p.extension_allowed(Path::new("/docs/a.txt")));
        assert!(p.extension_allowed(Path::new("/docs/REPORT.MD")));
        assert!(!p.extension_allowed(Path::new("/docs/a.bin")));
        assert!(!p.extension_allowed(Path::new("/docs/noext")));
    }

    #[test]
    fn test_policy_normalizes_leading_dots() {
        let p = SyncPolicy::new(vec![".TXT".to_string()], 1024);
        assert!(p.extension_allowed(Path::new("/a.txt")));
    }

    #[tokio::test]
    async fn test_new_file_needs_upload() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        tokio::fs::write(&path, b"hello").await.unwrap();

        let ledger = Arc::new(MemoryLedger::new());
        let decision = detector(ledger).evaluate(&path).await.unwrap();

        match decision {
            Decision::Upload { bytes, fingerprint } => {
                assert_eq!(bytes, b"hello");
                assert_eq!(
                    fingerprint,
                    docsync_core::domain::fingerprint_bytes(b"hello")
                );
            }
            other => panic!("expected Upload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unchanged_file_skipped() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        tokio::fs::write(&path, b"hello").await.unwrap();

        let ledger = Arc::new(MemoryLedger::new());
        ledger
            .record_synced(&path, &docsync_core::domain::fingerprint_bytes(b"hello"))
            .await
            .unwrap();

        let decision = detector(ledger).evaluate(&path).await.unwrap();
        assert!(matches!(
            decision,
            Decision::Skip(SkipReason::AlreadySynced)
        ));
    }

    #[tokio::test]
    async fn test_changed_file_needs_upload() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        tokio::fs::write(&path, b"version two").await.unwrap();

        let ledger = Arc::new(MemoryLedger::new());
        ledger
            .record_synced(
                &path,
                &docsync_core::domain::fingerprint_bytes(b"version one"),
            )
            .await
            .unwrap();

        let decision = detector(ledger).evaluate(&path).await.unwrap();
        assert!(matches!(decision, Decision::Upload { .. }));
    }

    #[tokio::test]
    async fn test_touched_but_identical_file_skipped() {
        // Re-writing identical bytes changes mtime but not content; the
        // decision must come from content, not timestamps.
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        tokio::fs::write(&path, b"same").await.unwrap();

        let ledger = Arc::new(MemoryLedger::new());
        ledger
            .record_synced(&path, &docsync_core::domain::fingerprint_bytes(b"same"))
            .await
            .unwrap();

        tokio::fs::write(&path, b"same").await.unwrap();

        let decision = detector(ledger).evaluate(&path).await.unwrap();
        assert!(matches!(
            decision,
            Decision::Skip(SkipReason::AlreadySynced)
        ));
    }

    #[tokio::test]
    async fn test_missing_path_removes() {
        let dir = tempfile::TempDir::new().unwrap();
        let ledger = Arc::new(MemoryLedger::new());
        let decision = detector(ledger)
            .evaluate(&dir.path().join("gone.txt"))
            .await
            .unwrap();
        assert!(matches!(decision, Decision::Remove));
    }

    #[tokio::test]
    async fn test_directory_skipped() {
        let dir = tempfile::TempDir::new().unwrap();
        let sub = dir.path().join("sub.txt");
        tokio::fs::create_dir(&sub).await.unwrap();

        let ledger = Arc::new(MemoryLedger::new());
        let decision = detector(ledger).evaluate(&sub).await.unwrap();
        assert!(matches!(decision, Decision::Skip(SkipReason::NotAFile)));
    }

    #[tokio::test]
    async fn test_unsupported_extension_skipped() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("image.png");
        tokio::fs::write(&path, b"not really a png").await.unwrap();

        let ledger = Arc::new(MemoryLedger::new());
        let decision = detector(ledger).evaluate(&path).await.unwrap();
        assert!(matches!(
            decision,
            Decision::Skip(SkipReason::UnsupportedExtension)
        ));
    }

    #[tokio::test]
    async fn test_oversized_file_skipped() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("big.txt");
        tokio::fs::write(&path, vec![b'x'; 2048]).await.unwrap();

        let ledger = Arc::new(MemoryLedger::new());
        let decision = detector(ledger).evaluate(&path).await.unwrap();
        assert!(matches!(
            decision,
            Decision::Skip(SkipReason::TooLarge(2048))
        ));
    }

    #[tokio::test]
    async fn test_file_at_exact_limit_uploads() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("edge.txt");
        tokio::fs::write(&path, vec![b'x'; 1024]).await.unwrap();

        let ledger = Arc::new(MemoryLedger::new());
        let decision = detector(ledger).evaluate(&path).await.unwrap();
        assert!(matches!(decision, Decision::Upload { .. }));
    }
}
