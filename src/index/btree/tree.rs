//! BTree - the thread-safe orchestration layer.
//!
//! The [`BTree`] provides:
//! - Insert / remove / search over an owned page hierarchy
//! - Root split and root collapse (the only height changes)
//! - Ordered traversal and snapshot-backed iteration
//! - Structural verification and statistics

use std::fmt;
use std::io;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::common::config::MIN_ORDER;
use crate::common::{Error, IndexConfig, Result};

use super::page::{Bounds, Ctx, Entry, Insert, ObjectId, Page, Remove};
use super::snapshot::{ReverseSnapshotIter, Snapshot, SnapshotIter};
use super::stats::TreeStats;

/// An in-memory B-tree index mapping ordered keys to object identifiers.
///
/// # Architecture
/// ```text
/// ┌──────────────────────────────────────────────────────────┐
/// │                         BTree                            │
/// │  config: IndexConfig (order, unique)   stats: TreeStats  │
/// │  ┌────────────────────────────────────────────────────┐  │
/// │  │              Mutex<TreeState>                       │  │
/// │  │   num_keys   height   root: Page                    │  │
/// │  │                        │                            │  │
/// │  │              ┌─────────┴─────────┐                  │  │
/// │  │            Page               Page    (owned)       │  │
/// │  └────────────────────────────────────────────────────┘  │
/// └──────────────────────────────────────────────────────────┘
/// ```
///
/// # Thread Safety
/// - `state`: one exclusive `Mutex` held for the whole structural walk of
///   every insert, remove, search, traversal and snapshot capture
/// - `stats`: no lock, all atomic counters
/// - snapshots and their iterators: private copies, no lock
///
/// Visitors passed to [`for_each`](Self::for_each) and
/// [`first_that`](Self::first_that) run while the lock is held and must not
/// call back into the same tree.
///
/// # Usage
/// ```
/// use pageindex::BTree;
///
/// let tree: BTree<char> = BTree::new(3, true);
/// assert!(tree.insert('b', 2));
/// assert!(tree.insert('a', 1));
/// assert!(!tree.insert('a', 9)); // duplicate rejected
///
/// assert_eq!(tree.search(&'a'), Some(1));
/// assert!(tree.remove(&'a', &1));
/// assert_eq!(tree.search(&'a'), None);
/// ```
pub struct BTree<K, V = ObjectId> {
    /// Shape of the tree (immutable after construction).
    config: IndexConfig,

    /// Root page and bookkeeping.
    state: Mutex<TreeState<K, V>>,

    /// Structural statistics.
    stats: TreeStats,
}

struct TreeState<K, V> {
    /// Never absent: an empty tree is an empty root leaf.
    root: Page<K, V>,

    /// Entries across all pages.
    num_keys: usize,

    /// Levels from root to leaf, 1 for a lone root.
    height: usize,
}

impl<K, V> BTree<K, V> {
    /// Create a new tree.
    ///
    /// # Arguments
    /// * `order` - Branching factor; pages hold at most `2 * order` entries
    /// * `unique` - Reject duplicate keys when true
    ///
    /// # Panics
    /// Panics if `order` is 0.
    pub fn new(order: usize, unique: bool) -> Self {
        assert!(order >= MIN_ORDER, "order must be > 0");
        Self::build(IndexConfig::new(order).unique(unique))
    }

    /// Create a new tree, reporting an invalid order as an error.
    ///
    /// # Errors
    /// - `Error::InvalidOrder` if `order` is 0
    pub fn try_new(order: usize, unique: bool) -> Result<Self> {
        Self::with_config(IndexConfig::new(order).unique(unique))
    }

    /// Create a new tree from a configuration.
    ///
    /// # Errors
    /// - `Error::InvalidOrder` if `config.order` is 0
    pub fn with_config(config: IndexConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: IndexConfig) -> Self {
        debug!(order = config.order, unique = config.unique, "created B-tree index");
        Self {
            config,
            state: Mutex::new(TreeState {
                root: Page::new_leaf(),
                num_keys: 0,
                height: 1,
            }),
            stats: TreeStats::new(),
        }
    }

    // ========================================================================
    // Public API: Shape and bookkeeping
    // ========================================================================

    /// Number of entries in the tree.
    pub fn size(&self) -> usize {
        self.state.lock().num_keys
    }

    /// Alias of [`size`](Self::size).
    pub fn len(&self) -> usize {
        self.size()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Levels from root to leaf; 1 for a tree that is a single root page.
    pub fn height(&self) -> usize {
        self.state.lock().height
    }

    pub fn order(&self) -> usize {
        self.config.order
    }

    pub fn is_unique(&self) -> bool {
        self.config.unique
    }

    pub fn config(&self) -> IndexConfig {
        self.config
    }

    /// Get tree statistics.
    pub fn stats(&self) -> &TreeStats {
        &self.stats
    }

    // ========================================================================
    // Public API: Traversal
    // ========================================================================

    /// Visit every entry in key order as `visitor(entry, level)`.
    ///
    /// `level` is the depth of the entry's page, 0 for the root.
    pub fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&Entry<K, V>, usize),
    {
        let state = self.state.lock();
        state.root.for_each(0, &mut visitor);
    }

    /// Return a copy of the first entry, in key order, matching `predicate`.
    ///
    /// The copy stays valid after the tree changes; it is not a live view.
    pub fn first_that<P>(&self, mut predicate: P) -> Option<Entry<K, V>>
    where
        P: FnMut(&Entry<K, V>, usize) -> bool,
        K: Clone,
        V: Clone,
    {
        let state = self.state.lock();
        state.root.first_that(0, &mut predicate).cloned()
    }

    /// Materialize every entry in key order.
    pub fn to_vec(&self) -> Vec<Entry<K, V>>
    where
        K: Clone,
        V: Clone,
    {
        let state = self.state.lock();
        let mut entries = Vec::with_capacity(state.num_keys);
        state.root.for_each(0, &mut |entry: &Entry<K, V>, _| entries.push(entry.clone()));
        entries
    }

    /// Capture an immutable, ordered copy of the tree.
    pub fn snapshot(&self) -> Snapshot<K, V>
    where
        K: Clone,
        V: Clone,
    {
        Snapshot::new(self.to_vec())
    }

    /// Ascending iterator over a snapshot taken now.
    ///
    /// Iterators reflect a point-in-time snapshot, not a live view.
    pub fn ordered_iter(&self) -> SnapshotIter<K, V>
    where
        K: Clone,
        V: Clone,
    {
        self.snapshot().into_iter()
    }

    /// Descending iterator over a snapshot taken now.
    pub fn reverse_ordered_iter(&self) -> ReverseSnapshotIter<K, V>
    where
        K: Clone,
        V: Clone,
    {
        self.ordered_iter().rev()
    }

    fn ctx(&self) -> Ctx<'_> {
        Ctx {
            config: self.config,
            stats: &self.stats,
        }
    }
}

impl<K: Ord, V> BTree<K, V> {
    // ========================================================================
    // Public API: Insert, remove, search
    // ========================================================================

    /// Insert an entry.
    ///
    /// Returns `false` and leaves the tree untouched if the tree is unique
    /// and `key` is already present.
    pub fn insert(&self, key: K, object_id: V) -> bool {
        let ctx = self.ctx();
        let mut state = self.state.lock();

        match state.root.insert(Entry::new(key, object_id), &ctx) {
            Insert::Duplicate => return false,
            Insert::Done => {}
            Insert::Split { median, right } => {
                let left = std::mem::replace(&mut state.root, Page::new_leaf());
                state.root = Page::new_root(left, median, right);
                state.height += 1;
                self.stats.record_root_split();
                trace!(target: "pageindex::btree", height = state.height, "split root");
            }
        }

        state.num_keys += 1;
        true
    }

    /// Remove an entry.
    ///
    /// A unique tree matches on `key` alone. A multi-valued tree removes the
    /// first entry, in key order, whose key and object id both match.
    /// Returns `false` if nothing matched.
    pub fn remove(&self, key: &K, object_id: &V) -> bool
    where
        V: PartialEq,
    {
        let ctx = self.ctx();
        let mut state = self.state.lock();

        if state.root.remove(key, object_id, &ctx) == Remove::NotFound {
            return false;
        }
        state.num_keys -= 1;

        if let Some(child) = state.root.take_sole_child() {
            state.root = child;
            state.height -= 1;
            self.stats.record_root_collapse();
            trace!(target: "pageindex::btree", height = state.height, "collapsed root");
        }
        true
    }

    /// Look up the object id stored under `key`.
    ///
    /// In a multi-valued tree this is the first matching entry in key order.
    pub fn search(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let state = self.state.lock();
        state
            .root
            .search(key, self.config.unique)
            .map(|entry| entry.object_id.clone())
    }

    pub fn contains_key(&self, key: &K) -> bool {
        let state = self.state.lock();
        state.root.search(key, self.config.unique).is_some()
    }
}

impl<K: Ord + fmt::Debug, V> BTree<K, V> {
    /// Check every structural invariant of the tree.
    ///
    /// Verifies key order, page fill bounds, child counts, that all leaves
    /// sit at `height()`, and that `size()` matches the stored entries.
    ///
    /// # Errors
    /// - `Error::InvariantViolation` describing the first breach found
    pub fn verify(&self) -> Result<()> {
        let state = self.state.lock();
        let mut leaf_depth = None;
        let bounds = Bounds {
            lower: None,
            upper: None,
        };
        let count = state.root.verify(&self.config, 1, bounds, &mut leaf_depth)?;

        if count != state.num_keys {
            return Err(Error::InvariantViolation(format!(
                "tree records {} keys but pages hold {}",
                state.num_keys, count
            )));
        }
        if leaf_depth != Some(state.height) {
            return Err(Error::InvariantViolation(format!(
                "tree records height {} but leaves sit at depth {:?}",
                state.height, leaf_depth
            )));
        }
        Ok(())
    }
}

impl<K: fmt::Debug, V> BTree<K, V> {
    /// Write a human-readable structural dump to `sink`.
    ///
    /// The format is meant for debugging and is not stable.
    ///
    /// # Errors
    /// - `Error::Io` if writing to `sink` fails
    pub fn print<W: io::Write>(&self, sink: &mut W) -> Result<()> {
        let dump = self.to_string();
        sink.write_all(dump.as_bytes())?;
        Ok(())
    }
}

impl<K: fmt::Debug, V> fmt::Display for BTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        writeln!(
            f,
            "BTree(order={}, unique={}, keys={}, height={})",
            self.config.order, self.config.unique, state.num_keys, state.height
        )?;
        state.root.dump(0, f)
    }
}

impl<K, V> fmt::Debug for BTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("BTree")
            .field("config", &self.config)
            .field("num_keys", &state.num_keys)
            .field("height", &state.height)
            .finish()
    }
}

impl<K, V> Default for BTree<K, V> {
    /// A unique tree of [`DEFAULT_ORDER`](crate::common::config::DEFAULT_ORDER).
    fn default() -> Self {
        Self::build(IndexConfig::default())
    }
}

impl<'a, K: Clone, V: Clone> IntoIterator for &'a BTree<K, V> {
    type Item = Entry<K, V>;
    type IntoIter = SnapshotIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.ordered_iter()
    }
}

// ============================================================================
// TESTS
// ============================================================================
