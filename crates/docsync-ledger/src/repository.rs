//! SQLite implementation of the SyncLedger port
//!
//! One table, keyed by absolute path. All domain serialization happens
//! here:
//!
//! | Domain Type    | SQL Type | Strategy                                   |
//! |----------------|----------|--------------------------------------------|
//! | PathBuf        | TEXT     | lossless UTF-8 path string                 |
//! | Fingerprint    | TEXT     | hex string via `.as_str()` / `Fingerprint::new()` |
//! | DateTime<Utc>  | TEXT     | RFC 3339 via `to_rfc3339()` / `parse_from_rfc3339()` |

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use docsync_core::domain::{Fingerprint, TrackedFile};
use docsync_core::ports::SyncLedger;

use crate::LedgerError;

/// SQLite-based implementation of the sync ledger port
///
/// All operations go through a connection pool; each statement is a single
/// implicit transaction, so individual operations are atomic and durable
/// under WAL.
pub struct SqliteSyncLedger {
    pool: SqlitePool,
}

impl SqliteSyncLedger {
    /// Creates a new ledger instance with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Helper functions for type conversion
// ============================================================================

/// Parse a DateTime<Utc> from an RFC 3339 string
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, LedgerError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            LedgerError::SerializationError(format!("Failed to parse datetime '{}': {}", s, e))
        })
}

/// Render a path as its stored TEXT key.
///
/// Paths arriving here come from the watcher or the scanner, both of which
/// produce valid UTF-8 on the supported platforms; a non-UTF-8 path is a
/// serialization error rather than silent lossy storage.
fn path_to_key(path: &Path) -> Result<&str, LedgerError> {
    path.to_str().ok_or_else(|| {
        LedgerError::SerializationError(format!("Path is not valid UTF-8: {}", path.display()))
    })
}

/// Reconstruct a TrackedFile from a database row
fn tracked_file_from_row(row: &SqliteRow) -> Result<TrackedFile, LedgerError> {
    let path_str: String = row.get("path");
    let fingerprint_str: String = row.get("fingerprint");
    let synced_at_str: String = row.get("synced_at");

    let fingerprint = Fingerprint::new(fingerprint_str).map_err(|e| {
        LedgerError::SerializationError(format!("Invalid stored fingerprint: {}", e))
    })?;

    Ok(TrackedFile {
        path: PathBuf::from(path_str),
        fingerprint,
        synced_at: parse_datetime(&synced_at_str)?,
    })
}

// ============================================================================
// SyncLedger implementation
// ============================================================================

#[async_trait::async_trait]
impl SyncLedger for SqliteSyncLedger {
    async fn get(&self, path: &Path) -> anyhow::Result<Option<TrackedFile>> {
        let key = path_to_key(path)?;

        let row = sqlx::query("SELECT path, fingerprint, synced_at FROM synced_files WHERE path = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(LedgerError::from)?;

        match row {
            Some(row) => Ok(Some(tracked_file_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn record_synced(&self, path: &Path, fingerprint: &Fingerprint) -> anyhow::Result<()> {
        let key = path_to_key(path)?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO synced_files (path, fingerprint, synced_at) VALUES (?, ?, ?) \
             ON CONFLICT(path) DO UPDATE SET fingerprint = excluded.fingerprint, \
             synced_at = excluded.synced_at",
        )
        .bind(key)
        .bind(fingerprint.as_str())
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(LedgerError::from)?;

        tracing::debug!(path = %path.display(), fingerprint = %fingerprint, "Recorded synced");
        Ok(())
    }

    async fn forget(&self, path: &Path) -> anyhow::Result<()> {
        let key = path_to_key(path)?;

        let result = sqlx::query("DELETE FROM synced_files WHERE path = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(LedgerError::from)?;

        tracing::debug!(
            path = %path.display(),
            removed = result.rows_affected(),
            "Forgot path"
        );
        Ok(())
    }

    async fn list(&self) -> anyhow::Result<Vec<TrackedFile>> {
        let rows =
            sqlx::query("SELECT path, fingerprint, synced_at FROM synced_files ORDER BY path")
                .fetch_all(&self.pool)
                .await
                .map_err(LedgerError::from)?;

        let mut files = Vec::with_capacity(rows.len());
        for row in &rows {
            files.push(tracked_file_from_row(row)?);
        }
        Ok(files)
    }
}

// ============================================================================
// Unit tests
// ============================================================================
