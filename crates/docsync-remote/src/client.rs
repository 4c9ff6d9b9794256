//! Document store HTTP client
//!
//! Typed client for the remote store's file ingestion endpoint. One call:
//! an authenticated `multipart/form-data` POST carrying the file's base
//! name and raw bytes. Any 2xx response with a parseable identifier is
//! success; everything else maps onto the port's failure taxonomy and is
//! never retried here - the file simply stays eligible for re-upload
//! because its fingerprint is only recorded after confirmed success.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use docsync_remote::DocStoreClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! use docsync_core::ports::RemoteStore;
//!
//! let client = DocStoreClient::new("http://localhost:8080", "api-token", 30)?;
//! let receipt = client.upload("notes.md", b"# notes".to_vec()).await?;
//! println!("ingested as {}", receipt.remote_id);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use docsync_core::ports::{RemoteStore, RemoteStoreError, UploadReceipt};

/// Ingestion endpoint path on the document store.
const INGEST_PATH: &str = "/api/v1/files/";

// ============================================================================
// Response types
// ============================================================================

/// Response body from the ingestion endpoint.
///
/// Only the identifier matters to the engine; the rest of the body is
/// ignored.
#[derive(Debug, Deserialize)]
struct IngestResponse {
    /// Remote-side identifier of the stored document.
    id: String,
}

// ============================================================================
// DocStoreClient
// ============================================================================

/// HTTP client for the remote document store
///
/// Wraps `reqwest::Client` with bearer authentication, base URL
/// construction, and a bounded per-request timeout. The timeout is the only
/// built-in failure deadline; retry policy lives with the caller.
pub struct DocStoreClient {
    /// The underlying HTTP client (carries the request timeout)
    client: Client,
    /// Base URL of the document store, without trailing slash
    base_url: String,
    /// API token sent as a bearer credential
    token: String,
}

impl DocStoreClient {
    /// Creates a new client for the given store
    ///
    /// # Arguments
    /// * `base_url` - store base URL, e.g. `http://localhost:8080`
    /// * `token` - resolved API token
    /// * `timeout_secs` - per-request timeout in seconds
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Ok(Self {
            client,
            base_url,
            token: token.into(),
        })
    }

    /// Returns the base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of the ingestion endpoint
    fn ingest_url(&self) -> String {
        format!("{}{}", self.base_url, INGEST_PATH)
    }
}

/// Maps a reqwest transport error onto the port taxonomy.
///
/// Anything that prevented a response from arriving (connection refused,
/// DNS failure, timeout) is `Unreachable`.
fn map_send_error(e: reqwest::Error) -> RemoteStoreError {
    RemoteStoreError::Unreachable(e.to_string())
}

#[async_trait::async_trait]
impl RemoteStore for DocStoreClient {
    async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<UploadReceipt, RemoteStoreError> {
        let size = bytes.len();
        debug!(name, size, "Uploading file to document store");

        let part = Part::bytes(bytes).file_name(name.to_string());
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.ingest_url())
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!(name, status = status.as_u16(), "Upload rejected: unauthorized");
            return Err(RemoteStoreError::Unauthorized);
        }

        if !status.is_success() {
            warn!(name, status = status.as_u16(), "Upload rejected by remote store");
            return Err(RemoteStoreError::RemoteRejected {
                status: status.as_u16(),
            });
        }

        // A 2xx body without an identifier is treated as a rejection: we
        // must not record a sync we cannot prove happened.
        let body: IngestResponse = response.json().await.map_err(|e| {
            warn!(name, error = %e, "2xx upload response missing identifier");
            RemoteStoreError::RemoteRejected {
                status: status.as_u16(),
            }
        })?;

        debug!(name, remote_id = %body.id, "Upload confirmed");
        Ok(UploadReceipt { remote_id: body.id })
    }
}

// ============================================================================
// Unit tests
// ============================================================================
