//! Point-in-time copies of a tree's contents.
//!
//! Iteration never walks live pages. Every iterator is backed by a
//! [`Snapshot`] taken under the tree lock, so it reflects the tree as it was
//! when the iterator was created: later inserts and removes are invisible
//! to it, and it can never observe a half-finished split or merge.

use std::iter::FusedIterator;
use std::slice;
use std::vec;

use super::page::Entry;

/// An immutable, ordered copy of every entry in a tree.
///
/// # Example
/// ```
/// use pageindex::BTree;
///
/// let tree: BTree<u32> = BTree::new(2, true);
/// tree.insert(2, 20);
/// tree.insert(1, 10);
///
/// let snapshot = tree.snapshot();
/// tree.insert(3, 30);
///
/// let keys: Vec<u32> = snapshot.iter().map(|e| e.key).collect();
/// assert_eq!(keys, vec![1, 2]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot<K, V> {
    entries: Vec<Entry<K, V>>,
}

impl<K, V> Snapshot<K, V> {
    pub(crate) fn new(entries: Vec<Entry<K, V>>) -> Self {
        Self { entries }
    }

    /// Number of entries captured.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry with the smallest key.
    pub fn first(&self) -> Option<&Entry<K, V>> {
        self.entries.first()
    }

    /// Entry with the largest key.
    pub fn last(&self) -> Option<&Entry<K, V>> {
        self.entries.last()
    }

    pub fn as_slice(&self) -> &[Entry<K, V>] {
        &self.entries
    }

    /// Borrowing iterator in key order. Use `.rev()` for descending order.
    pub fn iter(&self) -> slice::Iter<'_, Entry<K, V>> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<Entry<K, V>> {
        self.entries
    }
}

impl<K, V> IntoIterator for Snapshot<K, V> {
    type Item = Entry<K, V>;
    type IntoIter = SnapshotIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        SnapshotIter {
            inner: self.entries.into_iter(),
        }
    }
}

impl<'a, K, V> IntoIterator for &'a Snapshot<K, V> {
    type Item = &'a Entry<K, V>;
    type IntoIter = slice::Iter<'a, Entry<K, V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Owning iterator over a [`Snapshot`], ascending from the front and
/// descending from the back.
#[derive(Debug, Clone)]
pub struct SnapshotIter<K, V> {
    inner: vec::IntoIter<Entry<K, V>>,
}

/// Descending iterator returned by `BTree::reverse_ordered_iter`.
pub type ReverseSnapshotIter<K, V> = std::iter::Rev<SnapshotIter<K, V>>;

impl<K, V> Iterator for SnapshotIter<K, V> {
    type Item = Entry<K, V>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for SnapshotIter<K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<K, V> ExactSizeIterator for SnapshotIter<K, V> {}

impl<K, V> FusedIterator for SnapshotIter<K, V> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(keys: &[char]) -> Snapshot<char, i64> {
        Snapshot::new(
            keys.iter()
                .enumerate()
                .map(|(i, &k)| Entry::new(k, i as i64))
                .collect(),
        )
    }

    #[test]
    fn test_empty_snapshot() {
        let snap = snapshot(&[]);
        assert!(snap.is_empty());
        assert_eq!(snap.len(), 0);
        assert!(snap.first().is_none());
        assert_eq!(snap.into_iter().count(), 0);
    }

    #[test]
    fn test_forward_and_backward() {
        let snap = snapshot(&['a', 'b', 'c']);

        let forward: Vec<char> = snap.clone().into_iter().map(|e| e.key).collect();
        assert_eq!(forward, vec!['a', 'b', 'c']);

        let backward: Vec<char> = snap.into_iter().rev().map(|e| e.key).collect();
        assert_eq!(backward, vec!['c', 'b', 'a']);
    }

    #[test]
    fn test_iterate_from_both_ends() {
        let mut iter = snapshot(&['a', 'b', 'c', 'd']).into_iter();

        assert_eq!(iter.len(), 4);
        assert_eq!(iter.next().map(|e| e.key), Some('a'));
        assert_eq!(iter.next_back().map(|e| e.key), Some('d'));
        assert_eq!(iter.len(), 2);
        assert_eq!(iter.next().map(|e| e.key), Some('b'));
        assert_eq!(iter.next().map(|e| e.key), Some('c'));
        assert!(iter.next().is_none());
        assert!(iter.next_back().is_none());
    }

    #[test]
    fn test_first_last() {
        let snap = snapshot(&['x', 'y', 'z']);
        assert_eq!(snap.first().map(|e| e.key), Some('x'));
        assert_eq!(snap.last().map(|e| e.key), Some('z'));
        assert_eq!(snap.as_slice().len(), 3);
    }
}
