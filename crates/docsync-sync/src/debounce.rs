//! Debounced coalescing of filesystem event bursts
//!
//! Editors routinely emit several write events per save. The
//! [`DebounceGate`] collapses any burst of notifications for one path into
//! a single settlement, timed from the *last* notification in the burst,
//! so the engine never evaluates a half-written intermediate save.
//!
//! ## Design
//!
//! The gate owns the pending map outright (path → time of the most recent
//! raw notification); there is no ambient shared state and no sleeping
//! inside the event-consuming path. The engine's select loop calls
//! [`notify`](DebounceGate::notify) as events arrive and drains
//! [`settle`](DebounceGate::settle) on a poll tick.
//!
//! Settlement is path-only: what to do about the path (upload, skip, or
//! remove from the ledger) is decided at evaluation time by looking at the
//! filesystem. That is what keeps the delete-mid-burst case correct - the
//! pending entry still settles, and the evaluation sees a missing file.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::debug;

/// Coalesces rapid same-path notifications into one settlement per burst.
pub struct DebounceGate {
    /// Pending paths keyed by path, storing the last notification time.
    /// At most one entry per path at any instant.
    pending: HashMap<PathBuf, Instant>,
    /// Minimum quiet period before a path is considered settled.
    settle_interval: Duration,
}

impl DebounceGate {
    /// Creates a gate with the given settle interval.
    pub fn new(settle_interval: Duration) -> Self {
        Self {
            pending: HashMap::new(),
            settle_interval,
        }
    }

    /// Records a raw notification for a path.
    ///
    /// If the path is already pending, its timer is reset to now - rapid
    /// changes keep extending the settle window until they stop.
    pub fn notify(&mut self, path: PathBuf) {
        debug!(path = %path.display(), "Notification recorded");
        self.pending.insert(path, Instant::now());
    }

    /// Drains and returns all paths quiet for at least the settle interval.
    ///
    /// Paths still inside their settle window remain pending.
    pub fn settle(&mut self) -> Vec<PathBuf> {
        let now = Instant::now();
        let settled: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(_, last_seen)| now.duration_since(**last_seen) >= self.settle_interval)
            .map(|(path, _)| path.clone())
            .collect();

        for path in &settled {
            self.pending.remove(path);
        }

        if !settled.is_empty() {
            debug!(count = settled.len(), "Paths settled");
        }

        settled
    }

    /// Returns the number of pending (unsettled) paths.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if no paths are pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

// ============================================================================
// Unit tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_single_path() {
        let mut gate = DebounceGate::new(Duration::from_millis(100));
        gate.notify(PathBuf::from("/a.txt"));
        assert_eq!(gate.pending_count(), 1);
    }

    #[test]
    fn test_notify_multiple_paths() {
        let mut gate = DebounceGate::new(Duration::from_millis(100));
        gate.notify(PathBuf::from("/a.txt"));
        gate.notify(PathBuf::from("/b.txt"));
        gate.notify(PathBuf::from("/c.txt"));
        assert_eq!(gate.pending_count(), 3);
    }

    #[test]
    fn test_burst_coalesces_to_one_entry() {
        let mut gate = DebounceGate::new(Duration::from_millis(100));

        // Five rapid notifications for the same path.
        for _ in 0..5 {
            gate.notify(PathBuf::from("/notes.txt"));
        }

        assert_eq!(gate.pending_count(), 1);
    }

    #[test]
    fn test_burst_settles_exactly_once() {
        let mut gate = DebounceGate::new(Duration::from_millis(0));

        for _ in 0..5 {
            gate.notify(PathBuf::from("/notes.txt"));
        }

        std::thread::sleep(Duration::from_millis(10));
        let settled = gate.settle();
        assert_eq!(settled, vec![PathBuf::from("/notes.txt")]);

        // Nothing left to settle.
        assert!(gate.settle().is_empty());
        assert!(gate.is_empty());
    }

    #[test]
    fn test_settle_returns_nothing_inside_window() {
        let mut gate = DebounceGate::new(Duration::from_secs(60));
        gate.notify(PathBuf::from("/a.txt"));

        assert!(gate.settle().is_empty());
        assert_eq!(gate.pending_count(), 1);
    }

    #[test]
    fn test_settle_removes_settled_paths() {
        let mut gate = DebounceGate::new(Duration::from_millis(0));
        gate.notify(PathBuf::from("/a.txt"));

        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(gate.settle().len(), 1);
        assert!(gate.settle().is_empty());
    }

    #[test]
    fn test_partial_settlement_across_paths() {
        let mut gate = DebounceGate::new(Duration::from_millis(50));

        gate.notify(PathBuf::from("/old.txt"));
        std::thread::sleep(Duration::from_millis(60));
        gate.notify(PathBuf::from("/new.txt"));

        let settled = gate.settle();
        assert_eq!(settled, vec![PathBuf::from("/old.txt")]);
        assert_eq!(gate.pending_count(), 1);
    }

    #[test]
    fn test_new_notification_resets_timer() {
        let mut gate = DebounceGate::new(Duration::from_millis(50));

        gate.notify(PathBuf::from("/a.txt"));
        std::thread::sleep(Duration::from_millis(30));

        // Still inside the window; a new notification resets the timer.
        gate.notify(PathBuf::from("/a.txt"));
        std::thread::sleep(Duration::from_millis(30));

        // 60ms since the first notification but only 30ms since the last:
        // must not settle yet.
        assert!(gate.settle().is_empty());

        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(gate.settle().len(), 1);
    }

    #[test]
    fn test_empty_gate() {
        let mut gate = DebounceGate::new(Duration::from_millis(100));
        assert!(gate.is_empty());
        assert_eq!(gate.pending_count(), 0);
        assert!(gate.settle().is_empty());
    }
}
