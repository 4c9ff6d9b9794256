//! The synchronization engine
//!
//! Ties the watcher, debounce gate, and applier into one long-running
//! loop: reconcile the tree against the ledger, then watch for changes
//! and apply each settled path on its own task until cancelled.
//!
//! ## Lifecycle
//!
//! ```text
//! Starting → Scanning → Watching ──→ Stopped
//!                          │  ▲
//!                          ▼  │ (select loop)
//!                     events / settle ticks
//! ```
//!
//! When no remote store is available the engine runs the same loop in
//! watch-only mode: files are still evaluated and deletions still clean
//! the ledger, but nothing is uploaded or recorded, so every pending
//! upload happens on the first healthy run.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use docsync_core::config::SyncConfig;
use docsync_core::ports::{RemoteStore, SyncLedger};

use crate::apply::Applier;
use crate::debounce::DebounceGate;
use crate::detector::{ChangeDetector, SyncPolicy};
use crate::scanner::{scan_tree, ScanSummary};
use crate::watcher::{is_hidden, FileWatcher};

// ============================================================================
// EngineState
// ============================================================================

/// Observable lifecycle state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Constructed, not yet running.
    Starting,
    /// Running the startup reconciliation scan.
    Scanning,
    /// Watching for filesystem events with uploads enabled.
    Watching,
    /// Watching for filesystem events without a remote (no credentials).
    Degraded,
    /// Shut down; in-flight work drained.
    Stopped,
}

// ============================================================================
// SyncEngine
// ============================================================================

/// Continuous synchronization engine for one watched tree.
pub struct SyncEngine {
    config: SyncConfig,
    ledger: Arc<dyn SyncLedger>,
    applier: Arc<Applier>,
    state_tx: watch::Sender<EngineState>,
}

impl SyncEngine {
    /// Builds an engine over the given ports.
    ///
    /// Passing `None` for the remote puts the engine in watch-only
    /// degraded mode for its whole run; credentials are only read at
    /// startup, so recovering from degraded mode means restarting.
    pub fn new(
        config: SyncConfig,
        ledger: Arc<dyn SyncLedger>,
        remote: Option<Arc<dyn RemoteStore>>,
    ) -> Self {
        let detector = ChangeDetector::new(ledger.clone(), SyncPolicy::from_config(&config));
        let applier = Arc::new(Applier::new(detector, ledger.clone(), remote));
        let (state_tx, _) = watch::channel(EngineState::Starting);

        Self {
            config,
            ledger,
            applier,
            state_tx,
        }
    }

    /// Returns a receiver that observes lifecycle state transitions.
    pub fn state(&self) -> watch::Receiver<EngineState> {
        self.state_tx.subscribe()
    }

    fn set_state(&self, state: EngineState) {
        debug!(state = ?state, "Engine state transition");
        self.state_tx.send_replace(state);
    }

    /// Runs the startup scan and then the watch loop until `cancel` fires.
    ///
    /// # Errors
    /// Only setup failures (the root cannot be watched) abort the run;
    /// per-path sync failures are logged and retried on later events.
    pub async fn run(&self, cancel: CancellationToken) -> Result<ScanSummary> {
        let root = self.config.root.clone();
        let degraded = self.applier.is_degraded();

        if degraded {
            warn!(
                root = %root.display(),
                "No API credentials available; running in watch-only mode"
            );
        }

        self.set_state(EngineState::Scanning);
        let summary = scan_tree(&root, &self.applier, &self.ledger).await;

        // Watch before declaring ready so no event can slip between the
        // scan and the subscription being live. Events for files the scan
        // already handled just re-evaluate to AlreadySynced.
        let (mut watcher, mut events) = FileWatcher::new()?;
        watcher
            .watch(&root)
            .with_context(|| format!("Cannot watch sync root {}", root.display()))?;

        self.set_state(if degraded {
            EngineState::Degraded
        } else {
            EngineState::Watching
        });
        info!(root = %root.display(), "Watching for changes");

        let mut gate = DebounceGate::new(Duration::from_millis(self.config.debounce_delay_ms));
        let mut settle_tick =
            tokio::time::interval(Duration::from_millis(self.config.settle_poll_ms));
        settle_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let tracker = TaskTracker::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Shutdown requested");
                    break;
                }

                event = events.recv() => {
                    match event {
                        Some(event) => {
                            for path in event.paths() {
                                if is_hidden(&root, path) {
                                    continue;
                                }
                                gate.notify(path.to_path_buf());
                            }
                        }
                        None => {
                            warn!("Watcher channel closed; stopping");
                            break;
                        }
                    }
                }

                _ = settle_tick.tick() => {
                    for path in gate.settle() {
                        let applier = self.applier.clone();
                        tracker.spawn(async move {
                            if let Err(err) = applier.apply(&path).await {
                                warn!(
                                    path = %path.display(),
                                    error = %err,
                                    "Sync failed; will retry on next change"
                                );
                            }
                        });
                    }
                }
            }
        }

        drop(watcher);

        if !gate.is_empty() {
            // Unsettled paths are not lost; the next startup scan
            // re-evaluates the whole tree.
            info!(pending = gate.pending_count(), "Leaving unsettled paths to next scan");
        }

        tracker.close();
        tracker.wait().await;

        self.set_state(EngineState::Stopped);
        info!("Engine stopped");

        Ok(summary)
    }
}

// ============================================================================
// Integration-style tests (real watcher, real filesystem)
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{MemoryLedger, RecordingRemote};

    fn test_config(root: &std::path::Path) -> SyncConfig {
        SyncConfig {
            root: root.to_path_buf(),
            debounce_delay_ms: 50,
            settle_poll_ms: 20,
            extensions: vec!["txt".to_string(), "md".to_string()],
            max_file_size_kib: 64,
        }
    }

    struct Running {
        ledger: Arc<MemoryLedger>,
        remote: Arc<RecordingRemote>,
        cancel: CancellationToken,
        handle: tokio::task::JoinHandle<Result<ScanSummary>>,
        state: watch::Receiver<EngineState>,
    }

    async fn start_engine(root: &std::path::Path, with_remote: bool) -> Running {
        let ledger = Arc::new(MemoryLedger::new());
        let remote = Arc::new(RecordingRemote::new());
        let engine = Arc::new(SyncEngine::new(
            test_config(root),
            ledger.clone(),
            with_remote.then(|| remote.clone() as Arc<dyn RemoteStore>),
        ));
        let state = engine.state();
        let cancel = CancellationToken::new();

        let handle = {
            let engine = engine.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { engine.run(cancel).await })
        };

        // Wait until the watch subscription is live.
        let mut state_rx = state.clone();
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let current = *state_rx.borrow();
                if current == EngineState::Watching || current == EngineState::Degraded {
                    break;
                }
                state_rx.changed().await.unwrap();
            }
        })
        .await
        .expect("engine did not reach watching state");

        Running {
            ledger,
            remote,
            cancel,
            handle,
            state,
        }
    }

    async fn wait_for_uploads(remote: &RecordingRemote, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if remote.uploaded_names().await.len() >= count {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("expected uploads did not happen");
    }

    #[tokio::test]
    async fn test_startup_scan_uploads_existing_files() {
        let dir = tempfile::TempDir::new().unwrap();
        tokio::fs::write(dir.path().join("pre.txt"), b"existing")
            .await
            .unwrap();

        let running = start_engine(dir.path(), true).await;
        assert_eq!(running.remote.uploaded_names().await, vec!["pre.txt"]);

        running.cancel.cancel();
        let summary = running.handle.await.unwrap().unwrap();
        assert_eq!(summary.uploaded, 1);
    }

    #[tokio::test]
    async fn test_created_file_synced_after_settle() {
        let dir = tempfile::TempDir::new().unwrap();
        let running = start_engine(dir.path(), true).await;

        tokio::fs::write(dir.path().join("new.txt"), b"created live")
            .await
            .unwrap();

        wait_for_uploads(&running.remote, 1).await;
        assert_eq!(running.remote.uploaded_names().await, vec!["new.txt"]);
        assert_eq!(running.ledger.len().await, 1);

        running.cancel.cancel();
        running.handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_rapid_rewrites_coalesce() {
        let dir = tempfile::TempDir::new().unwrap();
        let running = start_engine(dir.path(), true).await;

        let path = dir.path().join("burst.txt");
        for i in 0..10 {
            tokio::fs::write(&path, format!("draft {i}")).await.unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        wait_for_uploads(&running.remote, 1).await;
        // Allow any straggler settlement to land before counting.
        tokio::time::sleep(Duration::from_millis(200)).await;

        let uploads = running.remote.uploaded_names().await;
        assert!(
            uploads.len() < 10,
            "burst of 10 writes produced {} uploads",
            uploads.len()
        );

        running.cancel.cancel();
        running.handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_deletion_cleans_ledger() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("doomed.txt");
        tokio::fs::write(&path, b"short lived").await.unwrap();

        let running = start_engine(dir.path(), true).await;
        assert_eq!(running.ledger.len().await, 1);

        tokio::fs::remove_file(&path).await.unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            while running.ledger.len().await != 0 {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("ledger entry was not removed");

        running.cancel.cancel();
        running.handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_hidden_files_ignored() {
        let dir = tempfile::TempDir::new().unwrap();
        let running = start_engine(dir.path(), true).await;

        tokio::fs::write(dir.path().join(".state.txt"), b"internal")
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("visible.txt"), b"public")
            .await
            .unwrap();

        wait_for_uploads(&running.remote, 1).await;
        assert_eq!(running.remote.uploaded_names().await, vec!["visible.txt"]);

        running.cancel.cancel();
        running.handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_degraded_mode_watches_without_uploading() {
        let dir = tempfile::TempDir::new().unwrap();
        tokio::fs::write(dir.path().join("pre.txt"), b"existing")
            .await
            .unwrap();

        let running = start_engine(dir.path(), false).await;
        assert_eq!(*running.state.borrow(), EngineState::Degraded);

        tokio::fs::write(dir.path().join("live.txt"), b"live")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(running.remote.uploaded_names().await.is_empty());
        assert_eq!(running.ledger.len().await, 0);

        running.cancel.cancel();
        let summary = running.handle.await.unwrap().unwrap();
        assert_eq!(summary.would_upload, 1);
    }

    #[tokio::test]
    async fn test_cancel_reaches_stopped_state() {
        let dir = tempfile::TempDir::new().unwrap();
        let running = start_engine(dir.path(), true).await;

        running.cancel.cancel();
        running.handle.await.unwrap().unwrap();
        assert_eq!(*running.state.borrow(), EngineState::Stopped);
    }

    #[tokio::test]
    async fn test_run_fails_on_missing_root() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");

        let engine = SyncEngine::new(
            test_config(&missing),
            Arc::new(MemoryLedger::new()),
            Some(Arc::new(RecordingRemote::new())),
        );

        let err = engine.run(CancellationToken::new()).await.unwrap_err();
        assert!(err.to_string().contains("Cannot watch sync root"));
    }
}
