//! docsync core - domain types, configuration, and port definitions
//!
//! This crate holds everything the adapters agree on:
//!
//! - [`config`] - typed YAML configuration with defaults and validation
//! - [`domain`] - content fingerprints, tracked-file records, domain errors
//! - [`ports`] - async traits implemented by the ledger, remote store, and
//!   workspace-files adapters
//!
//! It contains no I/O of its own; all side effects live behind the ports.

pub mod config;
pub mod domain;
pub mod ports;

pub use config::Config;
pub use domain::{fingerprint_bytes, DomainError, Fingerprint, TrackedFile};
