//! Port definitions (hexagonal architecture)
//!
//! These traits are the seams between the sync engine and the outside world.
//! Driven adapters (SQLite ledger, HTTP document store, local filesystem)
//! implement them in sibling crates.

pub mod remote_store;
pub mod sync_ledger;
pub mod workspace_files;

pub use remote_store::{RemoteStore, RemoteStoreError, UploadReceipt};
pub use sync_ledger::SyncLedger;
pub use workspace_files::WorkspaceFiles;
