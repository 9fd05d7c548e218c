//! pageindex - An in-memory B-tree index mapping ordered keys to object ids.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           pageindex                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Tree Layer (index/btree/tree)               │   │
//! │  │   insert / remove / search  ·  root split & collapse     │   │
//! │  │   Mutex<root, num_keys, height>  ·  TreeStats            │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Page Layer (index/btree/page)               │   │
//! │  │   sorted entries + owned children                        │   │
//! │  │   split on overflow  ·  borrow / merge on underflow      │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │           Snapshots (index/btree/snapshot)               │   │
//! │  │   point-in-time ordered copies backing all iterators     │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (config, Error)
//! - [`index`] - Index structures (B-tree)
//!
//! # Quick Start
//! ```
//! use pageindex::BTree;
//!
//! let tree: BTree<char> = BTree::new(3, true);
//! for (i, key) in "D1XJ2xTg8zKL9Ah".chars().enumerate() {
//!     tree.insert(key, (i * i) as i64);
//! }
//!
//! assert_eq!(tree.search(&'A'), Some(169));
//! let keys: String = tree.ordered_iter().map(|e| e.key).collect();
//! assert_eq!(keys, "1289ADJKLTXghxz");
//! ```

pub mod common;
pub mod index;

// Re-export commonly used items at crate root for convenience
pub use common::config::{ABSENT_OBJECT_ID, DEFAULT_ORDER};
pub use common::{Error, IndexConfig, Result};

pub use index::btree::{
    BTree, Entry, ObjectId, ReverseSnapshotIter, Snapshot, SnapshotIter, StatsSnapshot, TreeStats,
};
