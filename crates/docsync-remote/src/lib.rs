//! docsync remote - document store client
//!
//! HTTP adapter for the remote document store's ingestion endpoint, plus
//! startup credential resolution.
//!
//! ## Key Components
//!
//! - [`DocStoreClient`] - implements the
//!   [`RemoteStore`](docsync_core::ports::RemoteStore) port: one bounded,
//!   authenticated multipart upload call, no retries
//! - [`CredentialSource`] - resolves the API token from an environment
//!   variable or a per-user config file; absence is a valid state that puts
//!   the engine into watch-only (degraded) mode

pub mod client;
pub mod credentials;

pub use client::DocStoreClient;
pub use credentials::{CredentialSource, TOKEN_ENV_VAR};
