//! B-tree index implementation.
//!
//! # Components
//! - [`BTree`] - The public, thread-safe tree
//! - `page` - Node-local search, insert, split, borrow and merge
//! - [`Snapshot`] / [`SnapshotIter`] - Point-in-time ordered copies
//! - [`TreeStats`] - Structural statistics

mod page;
mod snapshot;
mod stats;
mod tree;

pub use page::{Entry, ObjectId};
pub use snapshot::{ReverseSnapshotIter, Snapshot, SnapshotIter};
pub use stats::{StatsSnapshot, TreeStats};
pub use tree::BTree;
