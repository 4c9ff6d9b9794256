//! Remote document store port (driven/secondary port)
//!
//! A single operation: push a file's bytes to the store's ingestion
//! endpoint. The error taxonomy is part of the port because the engine's
//! behavior depends on it (every failure kind leaves the ledger untouched
//! so the file stays eligible for re-upload; none is retried here - retry
//! happens naturally on the next filesystem event or scan).

use thiserror::Error;

/// Successful upload acknowledgement from the remote store.
///
/// The identifier is opaque to the engine; its presence is the success
/// signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Remote-side identifier of the ingested document.
    pub remote_id: String,
}

/// Upload failure kinds.
#[derive(Debug, Error)]
pub enum RemoteStoreError {
    /// The credential was rejected (HTTP 401/403).
    #[error("Unauthorized: credential rejected by remote store")]
    Unauthorized,

    /// The store could not be reached (connection failure or timeout).
    #[error("Remote store unreachable: {0}")]
    Unreachable(String),

    /// The store answered with a non-2xx status, or a 2xx response whose
    /// body did not carry the expected identifier.
    #[error("Remote store rejected upload (status {status})")]
    RemoteRejected {
        /// HTTP status code of the response.
        status: u16,
    },

    /// The local file could not be read at send time.
    #[error("IO failure reading upload content: {0}")]
    Io(#[from] std::io::Error),
}

/// Port trait for the remote document store.
#[async_trait::async_trait]
pub trait RemoteStore: Send + Sync {
    /// Uploads `bytes` under the given file base name.
    ///
    /// Success is a 2xx response carrying a parseable identifier. This call
    /// performs no retries; a bounded request timeout is the only built-in
    /// failure deadline.
    async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<UploadReceipt, RemoteStoreError>;
}
