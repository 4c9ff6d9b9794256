//! docsync daemon - background document synchronization service
//!
//! This binary runs as a systemd user service and handles:
//! - Watching the configured document tree for changes
//! - Startup reconciliation of the tree against the sync ledger
//! - Uploading changed files to the remote document store
//! - Graceful shutdown on SIGTERM/SIGINT
//!
//! # Architecture
//!
//! The daemon wires the SQLite ledger and the HTTP document-store client
//! into the sync engine and runs it until a shutdown signal arrives. The
//! engine is controlled by a `CancellationToken` that is triggered on
//! receipt of SIGTERM or SIGINT.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use docsync_core::config::Config;
use docsync_core::ports::{RemoteStore, SyncLedger};
use docsync_ledger::{DatabasePool, SqliteSyncLedger};
use docsync_remote::{CredentialSource, DocStoreClient};
use docsync_sync::engine::SyncEngine;

// ============================================================================
// DaemonService struct
// ============================================================================

/// Main daemon service that owns the wired-up engine
struct DaemonService {
    config: Config,
    engine: SyncEngine,
    /// Token for signalling graceful shutdown
    shutdown: CancellationToken,
}

impl DaemonService {
    /// Creates a new DaemonService
    ///
    /// Loads and validates configuration, creates the watched root if
    /// missing, opens the ledger database (fatal on failure), and resolves
    /// credentials. A missing credential is not fatal: the engine starts
    /// in watch-only degraded mode.
    async fn new(shutdown: CancellationToken) -> Result<Self> {
        // Load configuration
        let config_path = Config::default_path();
        let config = Config::load_or_default(&config_path);
        info!(config_path = %config_path.display(), "Loaded configuration");

        let validation_errors = config.validate();
        if !validation_errors.is_empty() {
            for err in &validation_errors {
                error!(field = %err.field, message = %err.message, "Invalid configuration");
            }
            anyhow::bail!(
                "Configuration is invalid ({} error(s)); fix {} and restart",
                validation_errors.len(),
                config_path.display()
            );
        }

        // Ensure the watched root exists
        tokio::fs::create_dir_all(&config.sync.root)
            .await
            .with_context(|| {
                format!("Failed to create sync root {}", config.sync.root.display())
            })?;

        // Open the ledger database. Refusing to start without it is the
        // crash-tolerance contract: without a ledger every restart would
        // re-upload the whole tree.
        let db_path = ledger_db_path();
        let db_pool = DatabasePool::new(&db_path)
            .await
            .with_context(|| format!("Failed to open sync ledger at {}", db_path.display()))?;
        let ledger: Arc<dyn SyncLedger> = Arc::new(SqliteSyncLedger::new(db_pool.pool().clone()));
        info!(db_path = %db_path.display(), "Sync ledger open");

        // Resolve credentials; absence degrades rather than aborts.
        let credentials = CredentialSource::default();
        let remote: Option<Arc<dyn RemoteStore>> = match credentials.resolve() {
            Some(token) => {
                let client = DocStoreClient::new(
                    config.remote.base_url.clone(),
                    token,
                    config.remote.request_timeout_secs,
                )
                .context("Failed to build document store client")?;
                Some(Arc::new(client))
            }
            None => {
                warn!(
                    env_var = credentials.env_var(),
                    token_file = %credentials.file_path().display(),
                    "No API token found; set the environment variable or create the \
                     token file, then restart to enable uploads"
                );
                None
            }
        };

        let engine = SyncEngine::new(config.sync.clone(), ledger, remote);

        Ok(Self {
            config,
            engine,
            shutdown,
        })
    }

    /// Runs the engine until shutdown
    async fn run(&self) -> Result<()> {
        info!(
            root = %self.config.sync.root.display(),
            remote = %self.config.remote.base_url,
            "Starting synchronization"
        );

        let summary = self.engine.run(self.shutdown.clone()).await?;

        info!(
            uploaded = summary.uploaded,
            removed = summary.removed,
            failed = summary.failed,
            "Final startup-scan totals"
        );

        Ok(())
    }
}

/// Platform-appropriate location for the ledger database.
///
/// Typically `$XDG_DATA_HOME/docsync/ledger.db` on Linux. Kept outside the
/// watched tree so the ledger itself is never a sync candidate.
fn ledger_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docsync")
        .join("ledger.db")
}

// ============================================================================
// Graceful shutdown signal handler
// ============================================================================

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

// ============================================================================
// Main entry point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG wins; the config file's logging.level is the fallback.
    let fallback_level = Config::load_or_default(&Config::default_path())
        .logging
        .level;
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();

    info!("docsync daemon starting (docsyncd)");

    let shutdown_token = CancellationToken::new();

    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let service = DaemonService::new(shutdown_token.clone()).await?;

    let result = service.run().await;

    match &result {
        Ok(()) => info!("docsync daemon shut down gracefully"),
        Err(e) => error!(error = %e, "docsync daemon exiting with error"),
    }

    result
}

// ============================================================================
// Tests
// ============================================================================
