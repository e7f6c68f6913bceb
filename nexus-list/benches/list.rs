//! Benchmarks for list operations.
//!
//! Compares the unlocked buffer, the locking storage and both handles
//! against `Vec` where a direct counterpart exists.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use nexus_list::{AtomicList, List, ListStorage, RawList};
use std::sync::Arc;
use std::thread;

// ============================================================================
// Append
// ============================================================================

fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("append");

    for &n in &[16usize, 1024, 65_536] {
        group.throughput(Throughput::Elements(n as u64));

        group.bench_with_input(BenchmarkId::new("vec", n), &n, |b, &n| {
            b.iter(|| {
                let mut v = Vec::new();
                for i in 0..n {
                    v.push(black_box(i as u64));
                }
                black_box(v)
            });
        });

        group.bench_with_input(BenchmarkId::new("raw_list", n), &n, |b, &n| {
            b.iter(|| {
                let mut list = RawList::new();
                for i in 0..n {
                    list.add(black_box(i as u64)).unwrap();
                }
                black_box(list)
            });
        });

        group.bench_with_input(BenchmarkId::new("list_storage", n), &n, |b, &n| {
            b.iter(|| {
                let storage = ListStorage::new();
                for i in 0..n {
                    storage.add(black_box(i as u64)).unwrap();
                }
                black_box(storage)
            });
        });

        group.bench_with_input(BenchmarkId::new("list_guard", n), &n, |b, &n| {
            b.iter(|| {
                let storage = ListStorage::new();
                {
                    let mut guard = storage.lock();
                    let mut raw = guard.borrow_mut();
                    for i in 0..n {
                        raw.add(black_box(i as u64)).unwrap();
                    }
                }
                black_box(storage)
            });
        });

        group.bench_with_input(BenchmarkId::new("atomic_list", n), &n, |b, &n| {
            b.iter(|| {
                let list = AtomicList::new();
                for i in 0..n {
                    list.add(black_box(i as u64)).unwrap();
                }
                black_box(list)
            });
        });
    }

    group.finish();
}

// ============================================================================
// Front operations
// ============================================================================

fn bench_front(c: &mut Criterion) {
    let mut group = c.benchmark_group("front");

    group.bench_function("vec/insert_remove_0", |b| {
        let mut v: Vec<u64> = (0..256).collect();
        b.iter(|| {
            v.insert(0, black_box(1));
            black_box(v.remove(0))
        });
    });

    group.bench_function("raw_list/insert_pop_front", |b| {
        let mut list: RawList<u64> = RawList::from_iter_fallible(0..256).unwrap();
        b.iter(|| {
            list.insert(0, black_box(1)).unwrap();
            black_box(list.pop_front())
        });
    });

    group.finish();
}

// ============================================================================
// Search and sort
// ============================================================================

fn bench_search_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_sort");
    let values: Vec<u64> = (0..4096).map(|i| (i * 7919) % 4096).collect();

    group.bench_function("list/index_of", |b| {
        let list: List<u64> = List::from_slice(&values).unwrap();
        b.iter(|| black_box(list.index_of(black_box(&4095), 0)));
    });

    group.bench_function("list/sort", |b| {
        b.iter_batched(
            || List::<u64>::from_slice(&values).unwrap(),
            |list| {
                list.sort(true);
                list
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

// ============================================================================
// Contended append
// ============================================================================

fn bench_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_append");
    const PER_THREAD: usize = 1_000;

    for &threads in &[2usize, 4] {
        group.throughput(Throughput::Elements((threads * PER_THREAD) as u64));
        group.bench_with_input(
            BenchmarkId::new("atomic_list", threads),
            &threads,
            |b, &threads| {
                b.iter(|| {
                    let list = Arc::new(AtomicList::new());
                    let workers: Vec<_> = (0..threads)
                        .map(|_| {
                            let list = Arc::clone(&list);
                            thread::spawn(move || {
                                for i in 0..PER_THREAD {
                                    list.add(i as u64).unwrap();
                                }
                            })
                        })
                        .collect();
                    for worker in workers {
                        worker.join().unwrap();
                    }
                    black_box(list.len())
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_append,
    bench_front,
    bench_search_sort,
    bench_contended
);
criterion_main!(benches);
