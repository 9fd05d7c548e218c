//! Structural statistics for a B-tree.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the structural changes a tree has gone through.
///
/// All fields are atomic so they can be read without taking the tree
/// lock. Writers only touch them while holding that lock.
///
/// # Memory Ordering
/// We use `Ordering::Relaxed` for all operations because:
/// - We only need atomicity (no partial updates)
/// - We don't need synchronization between different counters
/// - Readers outside the lock only need a roughly current picture
///
/// # Example
/// ```
/// use pageindex::TreeStats;
/// use std::sync::atomic::Ordering;
///
/// let stats = TreeStats::new();
/// stats.page_splits.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(stats.snapshot().page_splits, 1);
/// ```
#[derive(Debug)]
pub struct TreeStats {
    /// Pages split because they exceeded `2 * order` entries (root included).
    pub page_splits: AtomicU64,

    /// Root splits. Each one added a level to the tree.
    pub root_splits: AtomicU64,

    /// Underflows repaired by rotating an entry through the parent.
    pub borrows: AtomicU64,

    /// Underflows repaired by merging two siblings.
    pub merges: AtomicU64,

    /// Roots replaced by their sole child. Each one removed a level.
    pub root_collapses: AtomicU64,
}

impl TreeStats {
    /// Create a new stats tracker with all counters at zero.
    pub fn new() -> Self {
        Self {
            page_splits: AtomicU64::new(0),
            root_splits: AtomicU64::new(0),
            borrows: AtomicU64::new(0),
            merges: AtomicU64::new(0),
            root_collapses: AtomicU64::new(0),
        }
    }

    /// Get a snapshot of current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            page_splits: self.page_splits.load(Ordering::Relaxed),
            root_splits: self.root_splits.load(Ordering::Relaxed),
            borrows: self.borrows.load(Ordering::Relaxed),
            merges: self.merges.load(Ordering::Relaxed),
            root_collapses: self.root_collapses.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.page_splits.store(0, Ordering::Relaxed);
        self.root_splits.store(0, Ordering::Relaxed);
        self.borrows.store(0, Ordering::Relaxed);
        self.merges.store(0, Ordering::Relaxed);
        self.root_collapses.store(0, Ordering::Relaxed);
    }

    pub(crate) fn record_split(&self) {
        self.page_splits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_root_split(&self) {
        self.root_splits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_borrow(&self) {
        self.borrows.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_merge(&self) {
        self.merges.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_root_collapse(&self) {
        self.root_collapses.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for TreeStats {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of tree statistics.
///
/// Unlike `TreeStats`, this is not atomic and can be safely
/// printed, compared, etc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub page_splits: u64,
    pub root_splits: u64,
    pub borrows: u64,
    pub merges: u64,
    pub root_collapses: u64,
}

impl StatsSnapshot {
    /// Net number of levels added since the counters were last reset.
    pub fn net_growth(&self) -> i64 {
        self.root_splits as i64 - self.root_collapses as i64
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ splits: {}, root_splits: {}, borrows: {}, merges: {}, root_collapses: {} }}",
            self.page_splits, self.root_splits, self.borrows, self.merges, self.root_collapses
        )
    }
}
