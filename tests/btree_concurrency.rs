//! Concurrency tests for the B-tree index.
//!
//! A single tree is shared between threads through an `Arc`; every
//! operation takes the tree lock, so the final state must match a serial
//! execution of the same operations.

use pageindex::BTree;
use std::sync::Arc;
use std::thread;

const THREADS: u32 = 8;
const PER_THREAD: u32 = 500;

/// Test concurrent inserters on disjoint key ranges.
#[test]
fn test_concurrent_inserts() {
    let tree: Arc<BTree<u32>> = Arc::new(BTree::new(3, true));
    let mut handles = vec![];

    for t in 0..THREADS {
        let tree_clone = Arc::clone(&tree);
        handles.push(thread::spawn(move || {
            for i in 0..PER_THREAD {
                let key = i * THREADS + t;
                assert!(tree_clone.insert(key, key as i64));
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(tree.size(), (THREADS * PER_THREAD) as usize);
    tree.verify().unwrap();

    let keys: Vec<u32> = tree.ordered_iter().map(|e| e.key).collect();
    assert_eq!(keys, (0..THREADS * PER_THREAD).collect::<Vec<u32>>());
}

/// Test that racing inserts of the same keys admit exactly one winner each.
#[test]
fn test_concurrent_duplicate_inserts() {
    let tree: Arc<BTree<u32>> = Arc::new(BTree::new(2, true));
    let mut handles = vec![];

    for t in 0..THREADS {
        let tree_clone = Arc::clone(&tree);
        handles.push(thread::spawn(move || {
            (0..PER_THREAD)
                .filter(|&key| tree_clone.insert(key, t as i64))
                .count()
        }));
    }

    let wins: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(wins, PER_THREAD as usize);
    assert_eq!(tree.size(), PER_THREAD as usize);
    tree.verify().unwrap();
}

/// Test readers and snapshot takers running alongside writers.
#[test]
fn test_concurrent_readers_and_writers() {
    let tree: Arc<BTree<u32>> = Arc::new(BTree::new(2, true));
    for key in 0..1000 {
        tree.insert(key, key as i64);
    }

    let mut handles = vec![];

    // Writers remove the even keys.
    for t in 0..2u32 {
        let tree_clone = Arc::clone(&tree);
        handles.push(thread::spawn(move || {
            for key in (t * 2..1000).step_by(4) {
                assert!(tree_clone.remove(&key, &(key as i64)));
            }
        }));
    }

    // Odd keys are never removed, so readers must always find them.
    for _ in 0..4 {
        let tree_clone = Arc::clone(&tree);
        handles.push(thread::spawn(move || {
            for round in 0..50u32 {
                let odd = round * 2 + 1;
                assert_eq!(tree_clone.search(&odd), Some(odd as i64));

                let snapshot = tree_clone.snapshot();
                assert!(snapshot.iter().zip(snapshot.iter().skip(1)).all(|(a, b)| a.key < b.key));
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(tree.size(), 500);
    assert!(tree.ordered_iter().all(|e| e.key % 2 == 1));
    tree.verify().unwrap();
}
