//! docsync ledger - durable sync-state persistence
//!
//! SQLite-backed record of which files were last confirmed uploaded and
//! with what content fingerprint. This is the engine's only durable state:
//! a freshly started process resumes from exactly where the ledger left
//! off, re-uploading nothing that is unchanged and missing nothing that
//! changed while it was down.
//!
//! ## Key Components
//!
//! - [`DatabasePool`] - connection pool with WAL mode and schema migration
//! - [`SqliteSyncLedger`] - [`SyncLedger`](docsync_core::ports::SyncLedger)
//!   implementation
//! - [`LedgerError`] - error types for ledger operations
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use docsync_ledger::{DatabasePool, SqliteSyncLedger};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = DatabasePool::new(Path::new("/home/user/.local/share/docsync/ledger.db")).await?;
//! let ledger = SqliteSyncLedger::new(pool.pool().clone());
//! // Use ledger as SyncLedger...
//! # Ok(())
//! # }
//! ```

pub mod pool;
pub mod repository;

pub use pool::DatabasePool;
pub use repository::SqliteSyncLedger;

/// Errors that can occur during ledger operations
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Failed to establish a database connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A database query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Serialization or deserialization of a stored value failed
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::QueryFailed(e.to_string())
    }
}
