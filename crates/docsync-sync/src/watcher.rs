//! Filesystem event source
//!
//! Wraps the `notify` crate to monitor the watched root recursively,
//! converting raw OS events into [`ChangeEvent`] values delivered over an
//! mpsc channel. Debouncing happens downstream in the
//! [`DebounceGate`](crate::debounce::DebounceGate); this module only maps
//! and forwards.
//!
//! ## Architecture
//!
//! ```text
//! inotify / kqueue
//!       │
//!       ▼
//!  FileWatcher  ──→  mpsc::channel  ──→  SyncEngine select loop
//! ```

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

// ============================================================================
// ChangeEvent enum
// ============================================================================

/// A filesystem change event detected by the watcher
///
/// Internal representation used by the sync engine, decoupled from the
/// `notify` crate's raw event types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// A new file or directory was created at the given path
    Created(PathBuf),
    /// An existing file was modified (content or metadata changed)
    Modified(PathBuf),
    /// A file or directory was deleted from the given path
    Deleted(PathBuf),
    /// A file or directory was renamed/moved
    Renamed {
        /// The original path before the rename
        old: PathBuf,
        /// The new path after the rename
        new: PathBuf,
    },
}

impl ChangeEvent {
    /// Returns every path touched by this event.
    ///
    /// Renames yield both sides: evaluating the old path routes it to
    /// ledger removal (it no longer exists) and the new path to upload,
    /// with no rename-specific logic anywhere else.
    pub fn paths(&self) -> Vec<&Path> {
        match self {
            ChangeEvent::Created(p) | ChangeEvent::Modified(p) | ChangeEvent::Deleted(p) => {
                vec![p]
            }
            ChangeEvent::Renamed { old, new } => vec![old, new],
        }
    }
}

// ============================================================================
// Hidden-path exclusion
// ============================================================================

/// Returns true when any component of `path` below `root` starts with a dot.
///
/// Hidden entries are excluded from both the initial scan and event-driven
/// sync; their deletions are observed but ignored, so they never reach the
/// ledger in the first place.
pub fn is_hidden(root: &Path, path: &Path) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.components().any(|c| match c {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    })
}

// ============================================================================
// FileWatcher
// ============================================================================

/// Watches the document tree using the OS-native mechanism
///
/// On Linux this typically uses inotify. The watcher converts raw OS events
/// into [`ChangeEvent`] values and sends them through an mpsc channel; it
/// stops delivering when dropped.
pub struct FileWatcher {
    /// The underlying notify watcher instance
    watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Creates a new `FileWatcher`
    ///
    /// Returns the watcher and a receiver channel for consuming change
    /// events.
    ///
    /// # Errors
    /// Returns an error if the underlying OS watcher cannot be created
    pub fn new() -> Result<(Self, mpsc::Receiver<ChangeEvent>)> {
        let (event_tx, event_rx) = mpsc::channel::<ChangeEvent>(1024);

        info!("Initializing file watcher");

        let watcher = RecommendedWatcher::new(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    if let Some(change) = map_notify_event(&event) {
                        if let Err(e) = event_tx.blocking_send(change) {
                            warn!(error = %e, "Failed to send change event (receiver dropped)");
                        }
                    }
                }
                Err(err) => {
                    error!(error = %err, "File watcher error");
                }
            },
            notify::Config::default(),
        )
        .context("Failed to create file watcher")?;

        Ok((Self { watcher }, event_rx))
    }

    /// Starts watching a directory recursively for filesystem changes
    ///
    /// All subdirectories under the given path will be monitored.
    ///
    /// # Errors
    /// Returns an error if the path cannot be watched (e.g., does not
    /// exist, insufficient permissions, or inotify watch limit reached)
    pub fn watch(&mut self, path: &Path) -> Result<()> {
        info!(path = %path.display(), "Starting recursive watch");

        self.watcher
            .watch(path, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch path: {}", path.display()))?;

        Ok(())
    }

    /// Stops watching a directory
    ///
    /// # Errors
    /// Returns an error if the path was not being watched
    pub fn unwatch(&mut self, path: &Path) -> Result<()> {
        info!(path = %path.display(), "Stopping watch");

        self.watcher
            .unwatch(path)
            .with_context(|| format!("Failed to unwatch path: {}", path.display()))?;

        Ok(())
    }
}

// ============================================================================
// Event mapping - notify::Event → ChangeEvent
// ============================================================================

/// Converts a `notify::Event` into our internal `ChangeEvent`
///
/// Maps the notify event kinds as follows:
/// - `Create(*)` -> `ChangeEvent::Created`
/// - `Modify(Data(*))` -> `ChangeEvent::Modified`
/// - `Modify(Name(Both))` with 2 paths -> `ChangeEvent::Renamed`
/// - `Remove(*)` -> `ChangeEvent::Deleted`
/// - Other `Modify(*)` -> `ChangeEvent::Modified`
///
/// Returns `None` for events that have no associated paths or that should
/// be ignored (e.g., access events).
fn map_notify_event(event: &notify::Event) -> Option<ChangeEvent> {
    let paths = &event.paths;

    match &event.kind {
        EventKind::Create(_) => {
            let path = paths.first()?;
            debug!(path = %path.display(), "Mapped Create event");
            Some(ChangeEvent::Created(path.clone()))
        }

        EventKind::Modify(ModifyKind::Data(_)) => {
            let path = paths.first()?;
            debug!(path = %path.display(), "Mapped Modify(Data) event");
            Some(ChangeEvent::Modified(path.clone()))
        }

        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            if paths.len() >= 2 {
                let old = paths[0].clone();
                let new = paths[1].clone();
                debug!(
                    old = %old.display(),
                    new = %new.display(),
                    "Mapped Rename event"
                );
                Some(ChangeEvent::Renamed { old, new })
            } else {
                // Fallback: treat as a modification of the first path
                let path = paths.first()?;
                debug!(path = %path.display(), "Rename with single path, treating as Modified");
                Some(ChangeEvent::Modified(path.clone()))
            }
        }

        EventKind::Remove(_) => {
            let path = paths.first()?;
            debug!(path = %path.display(), "Mapped Remove event");
            Some(ChangeEvent::Deleted(path.clone()))
        }

        EventKind::Modify(_) => {
            // Other modify kinds (metadata, name-from, name-to, etc.)
            let path = paths.first()?;
            debug!(path = %path.display(), kind = ?event.kind, "Mapped other Modify event");
            Some(ChangeEvent::Modified(path.clone()))
        }

        // Ignore access events and other event types
        _ => {
            debug!(kind = ?event.kind, "Ignoring event kind");
            None
        }
    }
}

// ============================================================================
// Unit tests
// ============================================================================
