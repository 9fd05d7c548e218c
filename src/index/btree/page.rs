//! B-tree pages - the node-local half of the algorithm.
//!
//! A [`Page`] holds a sorted run of [`Entry`]s and, when internal, owns
//! `entries.len() + 1` child pages. Every structural change (split, borrow,
//! merge) moves entries and whole subtrees between pages; nothing is cloned.
//!
//! Operations recurse from the root and report back a tagged outcome
//! ([`Insert`] / [`Remove`]). The tree layer consumes the outcome that
//! reaches the root and performs the root-level change, if any.

use std::fmt;

use tracing::trace;

use crate::common::{Error, IndexConfig, Result};

use super::stats::TreeStats;

/// Default object identifier type.
pub type ObjectId = i64;

/// The unit of storage: a key and the object it points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry<K, V = ObjectId> {
    pub key: K,
    pub object_id: V,
}

impl<K, V> Entry<K, V> {
    /// Create a new entry.
    #[inline]
    pub fn new(key: K, object_id: V) -> Self {
        Self { key, object_id }
    }
}

/// Everything a page operation needs to know about its tree.
#[derive(Clone, Copy)]
pub(crate) struct Ctx<'a> {
    pub config: IndexConfig,
    pub stats: &'a TreeStats,
}

/// Outcome of inserting into a subtree.
pub(crate) enum Insert<K, V> {
    /// The entry was stored and the subtree is within capacity.
    Done,
    /// `unique` is set and the key already exists. Nothing changed.
    Duplicate,
    /// The page overflowed and split. The parent must absorb `median`
    /// and adopt `right` as the sibling just after the page.
    Split { median: Entry<K, V>, right: Page<K, V> },
}

/// Outcome of removing from a subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Remove {
    /// No matching entry in this subtree.
    NotFound,
    /// Removed, and the page still holds at least `order` entries.
    Done,
    /// Removed, and the page dropped below `order` entries.
    Underflow,
}

/// A B-tree node.
pub(crate) struct Page<K, V> {
    entries: Vec<Entry<K, V>>,
    /// Empty for leaves.
    children: Vec<Page<K, V>>,
}

impl<K, V> Page<K, V> {
    /// Create an empty leaf.
    pub fn new_leaf() -> Self {
        Self {
            entries: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Build a root from the two halves of a split old root.
    pub fn new_root(left: Self, median: Entry<K, V>, right: Self) -> Self {
        Self {
            entries: vec![median],
            children: vec![left, right],
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Detach the only child of an entry-less page.
    ///
    /// Returns `None` unless the page has zero entries and exactly one child,
    /// which only happens to a root whose last two children were merged.
    pub fn take_sole_child(&mut self) -> Option<Self> {
        if self.entries.is_empty() && self.children.len() == 1 {
            self.children.pop()
        } else {
            None
        }
    }

    /// In-order walk calling `visitor(entry, level)`; the root is level 0.
    pub fn for_each<F>(&self, level: usize, visitor: &mut F)
    where
        F: FnMut(&Entry<K, V>, usize),
    {
        for (i, entry) in self.entries.iter().enumerate() {
            if let Some(child) = self.children.get(i) {
                child.for_each(level + 1, visitor);
            }
            visitor(entry, level);
        }
        if let Some(last) = self.children.get(self.entries.len()) {
            last.for_each(level + 1, visitor);
        }
    }

    /// In-order walk that stops at the first entry matching `predicate`.
    pub fn first_that<P>(&self, level: usize, predicate: &mut P) -> Option<&Entry<K, V>>
    where
        P: FnMut(&Entry<K, V>, usize) -> bool,
    {
        for (i, entry) in self.entries.iter().enumerate() {
            if let Some(child) = self.children.get(i) {
                if let Some(found) = child.first_that(level + 1, predicate) {
                    return Some(found);
                }
            }
            if predicate(entry, level) {
                return Some(entry);
            }
        }
        self.children
            .get(self.entries.len())
            .and_then(|last| last.first_that(level + 1, predicate))
    }
}

impl<K: Ord, V> Page<K, V> {
    /// Index of the first entry whose key is not less than `key`.
    #[inline]
    fn lower_bound(&self, key: &K) -> usize {
        self.entries.partition_point(|e| e.key < *key)
    }

    /// Index of the first entry whose key is greater than `key`.
    #[inline]
    fn upper_bound(&self, key: &K) -> usize {
        self.entries.partition_point(|e| e.key <= *key)
    }

    /// Find an entry with the given key.
    ///
    /// Unique trees stop at the first match, internal or leaf. Multi-valued
    /// trees return the leftmost match in key order, which may sit in the
    /// left subtree of an equal internal key.
    pub fn search(&self, key: &K, unique: bool) -> Option<&Entry<K, V>> {
        let pos = self.lower_bound(key);
        let hit = self.entries.get(pos).filter(|e| e.key == *key);
        if unique && hit.is_some() {
            return hit;
        }
        match self.children.get(pos) {
            Some(child) => child.search(key, unique).or(hit),
            None => hit,
        }
    }

    /// Insert an entry into this subtree.
    ///
    /// Equal keys in a multi-valued tree are placed after the ones already
    /// present, so traversal reports them in insertion order.
    pub fn insert(&mut self, entry: Entry<K, V>, ctx: &Ctx<'_>) -> Insert<K, V> {
        let pos = if ctx.config.unique {
            match self.entries.binary_search_by(|e| e.key.cmp(&entry.key)) {
                Ok(_) => return Insert::Duplicate,
                Err(pos) => pos,
            }
        } else {
            self.upper_bound(&entry.key)
        };

        if self.is_leaf() {
            self.entries.insert(pos, entry);
        } else {
            match self.children[pos].insert(entry, ctx) {
                Insert::Split { median, right } => {
                    self.entries.insert(pos, median);
                    self.children.insert(pos + 1, right);
                }
                outcome => return outcome,
            }
        }

        if self.entries.len() > ctx.config.max_entries() {
            self.split(ctx)
        } else {
            Insert::Done
        }
    }

    /// Split an overflowing page around its median.
    ///
    /// The page keeps the lower `order` entries (and `order + 1` children);
    /// the new right sibling takes the upper ones.
    fn split(&mut self, ctx: &Ctx<'_>) -> Insert<K, V> {
        let order = ctx.config.order;
        let right_entries = self.entries.split_off(order + 1);
        let median = self.entries.remove(order);
        let right_children = if self.is_leaf() {
            Vec::new()
        } else {
            self.children.split_off(order + 1)
        };

        ctx.stats.record_split();
        trace!(
            target: "pageindex::btree",
            left = self.entries.len(),
            right = right_entries.len(),
            leaf = right_children.is_empty(),
            "split page"
        );

        Insert::Split {
            median,
            right: Page {
                entries: right_entries,
                children: right_children,
            },
        }
    }

    /// Remove one entry matching `key` from this subtree.
    ///
    /// Unique trees match on the key alone. Multi-valued trees also require
    /// `object_id` to match, and remove the leftmost such entry.
    pub fn remove(&mut self, key: &K, object_id: &V, ctx: &Ctx<'_>) -> Remove
    where
        V: PartialEq,
    {
        if ctx.config.unique {
            return match self.entries.binary_search_by(|e| e.key.cmp(key)) {
                Ok(i) => {
                    self.remove_at(i, ctx);
                    self.status(ctx)
                }
                Err(_) if self.is_leaf() => Remove::NotFound,
                Err(i) => self.remove_in_child(i, key, object_id, ctx),
            };
        }

        // Equal keys may be spread over entries[lo..hi] and every child
        // between them, so walk the candidates in key order.
        let lo = self.lower_bound(key);
        let hi = self.upper_bound(key);
        for i in lo..=hi {
            if !self.is_leaf() {
                match self.remove_in_child(i, key, object_id, ctx) {
                    Remove::NotFound => {}
                    outcome => return outcome,
                }
            }
            if i < hi && self.entries[i].object_id == *object_id {
                self.remove_at(i, ctx);
                return self.status(ctx);
            }
        }
        Remove::NotFound
    }

    fn remove_in_child(&mut self, i: usize, key: &K, object_id: &V, ctx: &Ctx<'_>) -> Remove
    where
        V: PartialEq,
    {
        match self.children[i].remove(key, object_id, ctx) {
            Remove::NotFound => Remove::NotFound,
            Remove::Done => Remove::Done,
            Remove::Underflow => {
                self.rebalance(i, ctx);
                self.status(ctx)
            }
        }
    }

    #[inline]
    fn status(&self, ctx: &Ctx<'_>) -> Remove {
        if self.entries.len() < ctx.config.min_entries() {
            Remove::Underflow
        } else {
            Remove::Done
        }
    }
}

impl<K, V> Page<K, V> {
    /// Delete `entries[i]`, replacing it with its in-order predecessor
    /// when the page is internal.
    fn remove_at(&mut self, i: usize, ctx: &Ctx<'_>) {
        if self.is_leaf() {
            self.entries.remove(i);
            return;
        }
        if let Some((predecessor, underflow)) = self.children[i].pop_last(ctx) {
            self.entries[i] = predecessor;
            if underflow {
                self.rebalance(i, ctx);
            }
        }
    }

    /// Detach the greatest entry of this subtree.
    ///
    /// The flag reports whether this page ended up below `order` entries.
    fn pop_last(&mut self, ctx: &Ctx<'_>) -> Option<(Entry<K, V>, bool)> {
        let entry = match self.children.last_mut() {
            None => self.entries.pop()?,
            Some(child) => {
                let (entry, underflow) = child.pop_last(ctx)?;
                if underflow {
                    self.rebalance(self.children.len() - 1, ctx);
                }
                entry
            }
        };
        Some((entry, self.entries.len() < ctx.config.min_entries()))
    }

    /// Repair `children[i]` after it fell below `order` entries.
    ///
    /// Borrows from a sibling with spare entries, left first, and merges
    /// with a sibling otherwise. A merge takes one entry from this page.
    fn rebalance(&mut self, i: usize, ctx: &Ctx<'_>) {
        if self.children.len() < 2 {
            return;
        }
        let min = ctx.config.min_entries();

        if i > 0 && self.children[i - 1].len() > min {
            self.borrow_from_left(i);
            ctx.stats.record_borrow();
            trace!(target: "pageindex::btree", child = i, direction = "left", "borrowed entry");
        } else if i + 1 < self.children.len() && self.children[i + 1].len() > min {
            self.borrow_from_right(i);
            ctx.stats.record_borrow();
            trace!(target: "pageindex::btree", child = i, direction = "right", "borrowed entry");
        } else {
            let survivor = if i > 0 { i - 1 } else { i };
            self.merge_children(survivor);
            ctx.stats.record_merge();
            trace!(
                target: "pageindex::btree",
                survivor,
                entries = self.children[survivor].len(),
                "merged siblings"
            );
        }
    }

    /// Rotate the last entry of `children[i - 1]` up through the parent
    /// and the separator down into the front of `children[i]`.
    fn borrow_from_left(&mut self, i: usize) {
        let (head, tail) = self.children.split_at_mut(i);
        let left = &mut head[i - 1];
        let child = &mut tail[0];

        let Some(moved_up) = left.entries.pop() else {
            return;
        };
        let separator = std::mem::replace(&mut self.entries[i - 1], moved_up);
        child.entries.insert(0, separator);
        if let Some(grandchild) = left.children.pop() {
            child.children.insert(0, grandchild);
        }
    }

    /// Rotate the first entry of `children[i + 1]` up through the parent
    /// and the separator down onto the end of `children[i]`.
    fn borrow_from_right(&mut self, i: usize) {
        let (head, tail) = self.children.split_at_mut(i + 1);
        let child = &mut head[i];
        let right = &mut tail[0];

        if right.entries.is_empty() {
            return;
        }
        let moved_up = right.entries.remove(0);
        let separator = std::mem::replace(&mut self.entries[i], moved_up);
        child.entries.push(separator);
        if !right.children.is_empty() {
            child.children.push(right.children.remove(0));
        }
    }

    /// Fold `children[i + 1]` and the separator `entries[i]` into `children[i]`.
    fn merge_children(&mut self, i: usize) {
        let separator = self.entries.remove(i);
        let right = self.children.remove(i + 1);
        let left = &mut self.children[i];

        left.entries.push(separator);
        left.entries.extend(right.entries);
        left.children.extend(right.children);
    }
}

// ============================================================================
// Verification and debugging output
// ============================================================================

/// Key range a subtree must stay within.
pub(crate) struct Bounds<'a, K> {
    pub lower: Option<&'a K>,
    pub upper: Option<&'a K>,
}

impl<K: Ord + fmt::Debug, V> Page<K, V> {
    /// Check every structural invariant of this subtree.
    ///
    /// `depth` is 1 for the root. Leaf depths are recorded into `leaf_depth`
    /// so all leaves can be compared against the first one seen. Returns the
    /// number of entries in the subtree.
    pub fn verify(
        &self,
        config: &IndexConfig,
        depth: usize,
        bounds: Bounds<'_, K>,
        leaf_depth: &mut Option<usize>,
    ) -> Result<usize> {
        let violation = |reason: String| Err(Error::InvariantViolation(reason));
        let is_root = depth == 1;

        if self.entries.len() > config.max_entries() {
            return violation(format!(
                "page at depth {} holds {} entries (max {})",
                depth,
                self.entries.len(),
                config.max_entries()
            ));
        }
        if !is_root && self.entries.len() < config.min_entries() {
            return violation(format!(
                "page at depth {} holds {} entries (min {})",
                depth,
                self.entries.len(),
                config.min_entries()
            ));
        }

        for pair in self.entries.windows(2) {
            let out_of_order = if config.unique {
                pair[0].key >= pair[1].key
            } else {
                pair[0].key > pair[1].key
            };
            if out_of_order {
                return violation(format!(
                    "keys {:?} and {:?} out of order at depth {}",
                    pair[0].key, pair[1].key, depth
                ));
            }
        }

        for entry in &self.entries {
            let below = bounds.lower.is_some_and(|lower| {
                if config.unique {
                    entry.key <= *lower
                } else {
                    entry.key < *lower
                }
            });
            let above = bounds.upper.is_some_and(|upper| {
                if config.unique {
                    entry.key >= *upper
                } else {
                    entry.key > *upper
                }
            });
            if below || above {
                return violation(format!(
                    "key {:?} escapes its parent's range at depth {}",
                    entry.key, depth
                ));
            }
        }

        if self.is_leaf() {
            match *leaf_depth {
                None => *leaf_depth = Some(depth),
                Some(expected) if expected != depth => {
                    return violation(format!(
                        "leaf at depth {} but another leaf is at depth {}",
                        depth, expected
                    ));
                }
                Some(_) => {}
            }
            return Ok(self.entries.len());
        }

        if self.children.len() != self.entries.len() + 1 {
            return violation(format!(
                "internal page at depth {} has {} entries but {} children",
                depth,
                self.entries.len(),
                self.children.len()
            ));
        }

        let mut count = self.entries.len();
        for (i, child) in self.children.iter().enumerate() {
            let child_bounds = Bounds {
                lower: if i == 0 {
                    bounds.lower
                } else {
                    Some(&self.entries[i - 1].key)
                },
                upper: self.entries.get(i).map(|e| &e.key).or(bounds.upper),
            };
            count += child.verify(config, depth + 1, child_bounds, leaf_depth)?;
        }
        Ok(count)
    }
}

impl<K: fmt::Debug, V> Page<K, V> {
    /// Pre-order structural dump: one line per page, indented by level.
    pub fn dump(&self, level: usize, out: &mut impl fmt::Write) -> fmt::Result {
        let keys: Vec<&K> = self.entries.iter().map(|e| &e.key).collect();
        writeln!(out, "{:indent$}level {}: {:?}", "", level, keys, indent = level * 2)?;
        for child in &self.children {
            child.dump(level + 1, out)?;
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
