//! Content fingerprinting of files on disk
//!
//! One read serves two purposes: the returned bytes are what gets uploaded,
//! and the fingerprint is computed from exactly those bytes. This keeps the
//! "recorded fingerprint matches the uploaded content" invariant immune to
//! writes racing between a hash pass and a separate upload read.

use std::path::Path;

use docsync_core::domain::{fingerprint_bytes, Fingerprint};

/// Reads a file and computes the fingerprint of its full contents.
///
/// # Errors
/// Any read failure (missing file, permissions, race with deletion) is
/// returned as-is; callers treat it as "cannot evaluate now", never as a
/// sync decision.
pub async fn fingerprint_file(path: &Path) -> std::io::Result<(Vec<u8>, Fingerprint)> {
    let bytes = tokio::fs::read(path).await?;
    let fingerprint = fingerprint_bytes(&bytes);
    Ok((bytes, fingerprint))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fingerprint_matches_content() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        tokio::fs::write(&path, b"some content").await.unwrap();

        let (bytes, fp) = fingerprint_file(&path).await.unwrap();
        assert_eq!(bytes, b"some content");
        assert_eq!(fp, fingerprint_bytes(b"some content"));
    }

    #[tokio::test]
    async fn test_fingerprint_stable_across_reads() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        tokio::fs::write(&path, b"stable").await.unwrap();

        let (_, first) = fingerprint_file(&path).await.unwrap();
        let (_, second) = fingerprint_file(&path).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_fingerprint_changes_with_content() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a.txt");

        tokio::fs::write(&path, b"version one").await.unwrap();
        let (_, first) = fingerprint_file(&path).await.unwrap();

        tokio::fs::write(&path, b"version two").await.unwrap();
        let (_, second) = fingerprint_file(&path).await.unwrap();

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = fingerprint_file(&dir.path().join("missing.txt"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
