//! Micro benchmarks for the in-memory B-tree.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use pageindex::BTree;

const INSERT_COUNT: u64 = 16_384;

/// Deterministic permutation of `0..n` for power-of-two `n`.
fn scrambled(n: u64) -> Vec<u64> {
    (0..n)
        .map(|i| i.wrapping_mul(0x9E37_79B9_7F4A_7C15) % n)
        .collect()
}

fn filled(order: usize, keys: &[u64]) -> BTree<u64> {
    let tree = BTree::new(order, true);
    for &k in keys {
        tree.insert(k, k as i64);
    }
    tree
}

fn micro_btree(c: &mut Criterion) {
    let mut group = c.benchmark_group("micro/btree");
    group.sample_size(30);

    let sequential: Vec<u64> = (0..INSERT_COUNT).collect();
    let random = scrambled(INSERT_COUNT);

    for order in [3usize, 16, 64] {
        group.throughput(Throughput::Elements(INSERT_COUNT));
        group.bench_function(format!("sequential_insert/order={order}"), |b| {
            b.iter_batched(
                || BTree::<u64>::new(order, true),
                |tree| {
                    for &k in &sequential {
                        tree.insert(k, k as i64);
                    }
                    black_box(tree.height());
                },
                BatchSize::SmallInput,
            );
        });

        group.bench_function(format!("random_insert/order={order}"), |b| {
            b.iter_batched(
                || BTree::<u64>::new(order, true),
                |tree| {
                    for &k in &random {
                        tree.insert(k, k as i64);
                    }
                    black_box(tree.height());
                },
                BatchSize::SmallInput,
            );
        });

        let tree = filled(order, &sequential);
        group.bench_function(format!("point_lookup/order={order}"), |b| {
            b.iter(|| {
                for &k in &random {
                    black_box(tree.search(&k));
                }
            });
        });

        group.bench_function(format!("delete_random/order={order}"), |b| {
            b.iter_batched(
                || filled(order, &sequential),
                |tree| {
                    for &k in &random {
                        tree.remove(&k, &(k as i64));
                    }
                    black_box(tree.size());
                },
                BatchSize::LargeInput,
            );
        });

        group.bench_function(format!("snapshot/order={order}"), |b| {
            b.iter(|| black_box(tree.snapshot().len()));
        });
    }

    group.finish();
}

criterion_group!(benches, micro_btree);
criterion_main!(benches);
