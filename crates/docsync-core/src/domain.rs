//! Domain types for docsync
//!
//! The central concept is the [`Fingerprint`]: a deterministic SHA-256 digest
//! of a file's full byte content, hex-encoded. Two files have the same
//! fingerprint if and only if (for practical purposes) their bytes are
//! identical, which is what "semantically changed since last upload" means
//! for this engine.
//!
//! A [`TrackedFile`] is one ledger row: the proof that a specific content
//! version of a path was confirmed uploaded at a specific time.

use std::fmt::{self, Display};
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid fingerprint format (expected 64 lowercase hex characters)
    #[error("Invalid fingerprint format: {0}")]
    InvalidFingerprint(String),

    /// Invalid path format or content
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

// ============================================================================
// Fingerprint newtype
// ============================================================================

/// Hex-encoded SHA-256 digest length.
const FINGERPRINT_LEN: usize = 64;

/// Content fingerprint of a file's bytes.
///
/// Stable across platforms and process restarts for identical bytes; stored
/// as 64 lowercase hex characters. Construct via [`fingerprint_bytes`] for
/// raw content or [`Fingerprint::new`] for a previously stored value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Create a new Fingerprint from a stored hex string.
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidFingerprint`] unless the value is
    /// exactly 64 lowercase hex characters.
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let valid = value.len() == FINGERPRINT_LEN
            && value
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if valid {
            Ok(Self(value))
        } else {
            Err(DomainError::InvalidFingerprint(value))
        }
    }

    /// Returns the hex string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Fingerprint> for String {
    fn from(fp: Fingerprint) -> Self {
        fp.0
    }
}

/// Computes the content fingerprint of a byte slice.
///
/// Deterministic and pure: the same bytes always produce the same
/// fingerprint, regardless of path, platform, or process.
pub fn fingerprint_bytes(bytes: &[u8]) -> Fingerprint {
    let digest = Sha256::digest(bytes);
    // hex::encode produces lowercase, so this always satisfies the
    // Fingerprint format invariant.
    Fingerprint(hex::encode(digest))
}

// ============================================================================
// TrackedFile
// ============================================================================

/// One ledger row: a path whose content version was confirmed uploaded.
///
/// Invariant: a `TrackedFile` exists for a path if and only if that path has
/// at least one confirmed remote upload still believed current. The ledger,
/// never the remote store, is the authority for this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedFile {
    /// Absolute filesystem path (unique key).
    pub path: PathBuf,
    /// Fingerprint of the bytes as of the last confirmed upload.
    pub fingerprint: Fingerprint,
    /// Timestamp of the last successful upload.
    pub synced_at: DateTime<Utc>,
}

// ============================================================================
// Unit tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_bytes_deterministic() {
        let a = fingerprint_bytes(b"hello world");
        let b = fingerprint_bytes(b"hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_bytes_differs_on_any_byte() {
        let a = fingerprint_bytes(b"hello world");
        let b = fingerprint_bytes(b"hello worle");
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_bytes_known_vector() {
        // SHA-256 of the empty string.
        let fp = fingerprint_bytes(b"");
        assert_eq!(
            fp.as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_fingerprint_format_validation() {
        assert!(Fingerprint::new("a".repeat(64)).is_ok());
        assert!(Fingerprint::new("a".repeat(63)).is_err());
        assert!(Fingerprint::new("A".repeat(64)).is_err());
        assert!(Fingerprint::new("g".repeat(64)).is_err());
        assert!(Fingerprint::new(String::new()).is_err());
    }

    #[test]
    fn test_fingerprint_roundtrip_through_string() {
        let fp = fingerprint_bytes(b"roundtrip");
        let s: String = fp.clone().into();
        let parsed: Fingerprint = s.parse().unwrap();
        assert_eq!(fp, parsed);
    }

    #[test]
    fn test_tracked_file_serde_roundtrip() {
        let file = TrackedFile {
            path: PathBuf::from("/docs/notes.md"),
            fingerprint: fingerprint_bytes(b"notes"),
            synced_at: Utc::now(),
        };
        let json = serde_json::to_string(&file).unwrap();
        let back: TrackedFile = serde_json::from_str(&json).unwrap();
        assert_eq!(file, back);
    }
}
