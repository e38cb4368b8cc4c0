//! Throughput benchmarks: LRU and LFU caches vs Moka vs QuickCache.
//!
//! Each group benchmarks the same workload across all caches so criterion
//! can generate side-by-side HTML reports.
//!
//! Run with:
//!     cargo bench --bench throughput

use criterion::measurement::WallTime;
use criterion::{
    black_box, criterion_group, criterion_main, BenchmarkGroup, Criterion, Throughput,
};
use moka::sync::Cache as MokaCache;
use quick_cache::sync::Cache as QuickCache;
use sized_cache::policy::lfu::LfuPolicy;
use sized_cache::policy::lru::LruPolicy;
use sized_cache::policy::Policy;
use sized_cache::{Cache, Unit};
use std::sync::{Arc, Barrier};
use std::time::{Duration, Instant};

/// Number of entries each cache is pre-filled with and its logical capacity.
const CAP: u64 = 10_000;

/// Operations executed per criterion iteration (hot-loop size).
const OPS: u64 = 1_000;

type Group<'a> = BenchmarkGroup<'a, WallTime>;
type Lru = LruPolicy<u64, Unit<u64>>;
type Lfu = LfuPolicy<u64, Unit<u64>>;

fn filled<P: Policy<u64, Unit<u64>>>() -> Cache<u64, Unit<u64>, P> {
    let cache = Cache::new(CAP);
    for i in 0..CAP {
        cache.put(i, Unit(i * 2));
    }
    cache
}

// ---------------------------------------------------------------------------
// Group 1: get_hit
// ---------------------------------------------------------------------------
// All keys are present → measures pure read throughput with no eviction.

fn get_hit<P: Policy<u64, Unit<u64>>>(group: &mut Group<'_>, name: &str) {
    let cache = filled::<P>();
    group.bench_function(name, |b| {
        b.iter(|| {
            for i in 0..OPS {
                black_box(cache.get(black_box(&i)));
            }
        })
    });
}

fn bench_get_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_hit");
    group.throughput(Throughput::Elements(OPS));

    get_hit::<Lru>(&mut group, "lru");
    get_hit::<Lfu>(&mut group, "lfu");

    let moka: MokaCache<u64, u64> = MokaCache::new(CAP);
    for i in 0..CAP {
        moka.insert(i, i * 2);
    }
    group.bench_function("moka", |b| {
        b.iter(|| {
            for i in 0..OPS {
                black_box(moka.get(black_box(&i)));
            }
        })
    });

    let qc: QuickCache<u64, u64> = QuickCache::new(CAP as usize);
    for i in 0..CAP {
        qc.insert(i, i * 2);
    }
    group.bench_function("quick_cache", |b| {
        b.iter(|| {
            for i in 0..OPS {
                black_box(qc.get(black_box(&i)));
            }
        })
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Group 2: put_evicting
// ---------------------------------------------------------------------------
// Sequential puts of always-new keys. The cache must evict on every put
// once it is full.

fn put_evicting<P: Policy<u64, Unit<u64>>>(group: &mut Group<'_>, name: &str) {
    group.bench_function(name, |b| {
        let cache: Cache<u64, Unit<u64>, P> = Cache::new(CAP);
        let mut key = 0u64;
        b.iter(|| {
            for _ in 0..OPS {
                cache.put(black_box(key), black_box(Unit(key)));
                key = key.wrapping_add(1);
            }
        })
    });
}

fn bench_put_evicting(c: &mut Criterion) {
    let mut group = c.benchmark_group("put_evicting");
    group.throughput(Throughput::Elements(OPS));

    put_evicting::<Lru>(&mut group, "lru");
    put_evicting::<Lfu>(&mut group, "lfu");

    group.bench_function("moka", |b| {
        let cache: MokaCache<u64, u64> = MokaCache::new(CAP);
        let mut key = 0u64;
        b.iter(|| {
            for _ in 0..OPS {
                cache.insert(black_box(key), black_box(key));
                key = key.wrapping_add(1);
            }
        })
    });

    group.bench_function("quick_cache", |b| {
        let cache: QuickCache<u64, u64> = QuickCache::new(CAP as usize);
        let mut key = 0u64;
        b.iter(|| {
            for _ in 0..OPS {
                cache.insert(black_box(key), black_box(key));
                key = key.wrapping_add(1);
            }
        })
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Group 3: mixed_80r_20w
// ---------------------------------------------------------------------------
// 80 % reads, 20 % writes, working set = 2× capacity (produces eviction).
// Keys cycle with a prime step to vary the access pattern.

const WORKING_SET: u64 = CAP * 2;
const STEP: u64 = 7_919; // prime

fn mixed<P: Policy<u64, Unit<u64>>>(group: &mut Group<'_>, name: &str) {
    group.bench_function(name, |b| {
        let cache = filled::<P>();
        let mut cursor = 0u64;
        b.iter(|| {
            for i in 0..OPS {
                let k = cursor % WORKING_SET;
                if i % 5 == 0 {
                    cache.put(black_box(k), black_box(Unit(k)));
                } else {
                    black_box(cache.get(black_box(&k)));
                }
                cursor = cursor.wrapping_add(STEP);
            }
        })
    });
}

fn bench_mixed_80r_20w(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_80r_20w");
    group.throughput(Throughput::Elements(OPS));

    mixed::<Lru>(&mut group, "lru");
    mixed::<Lfu>(&mut group, "lfu");

    group.bench_function("moka", |b| {
        let cache: MokaCache<u64, u64> = MokaCache::new(CAP);
        for i in 0..CAP {
            cache.insert(i, i);
        }
        let mut cursor = 0u64;
        b.iter(|| {
            for i in 0..OPS {
                let k = cursor % WORKING_SET;
                if i % 5 == 0 {
                    cache.insert(black_box(k), black_box(k));
                } else {
                    black_box(cache.get(black_box(&k)));
                }
                cursor = cursor.wrapping_add(STEP);
            }
        })
    });

    group.bench_function("quick_cache", |b| {
        let cache: QuickCache<u64, u64> = QuickCache::new(CAP as usize);
        for i in 0..CAP {
            cache.insert(i, i);
        }
        let mut cursor = 0u64;
        b.iter(|| {
            for i in 0..OPS {
                let k = cursor % WORKING_SET;
                if i % 5 == 0 {
                    cache.insert(black_box(k), black_box(k));
                } else {
                    black_box(cache.get(black_box(&k)));
                }
                cursor = cursor.wrapping_add(STEP);
            }
        })
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Group 4: concurrent_8t_50r_50w: 8 threads, 50 % reads, 50 % writes
// ---------------------------------------------------------------------------
// Every caller serializes on the single cache lock, so this measures lock
// hand-off cost rather than parallel speed-up.

const THREADS: usize = 8;
const OPS_PER_THREAD: u64 = 2_000;

/// Runs `op(key, is_write)` from `THREADS` threads released together and
/// returns the slowest thread's wall time per iteration.
fn contended<F>(iters: u64, op: Arc<F>) -> Duration
where
    F: Fn(u64, bool) + Send + Sync + 'static,
{
    let mut total = Duration::ZERO;
    for _ in 0..iters {
        let barrier = Arc::new(Barrier::new(THREADS + 1));
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let op = Arc::clone(&op);
                let bar = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    bar.wait();
                    let start = Instant::now();
                    let base = t as u64 * OPS_PER_THREAD;
                    for j in 0..OPS_PER_THREAD {
                        let k = (base.wrapping_add(j * 7_919)) % WORKING_SET;
                        op(k, j % 2 == 0);
                    }
                    start.elapsed()
                })
            })
            .collect();
        barrier.wait();
        let elapsed = handles.into_iter().map(|h| h.join().unwrap()).max().unwrap();
        total += elapsed;
    }
    total
}

fn concurrent<P: Policy<u64, Unit<u64>> + 'static>(group: &mut Group<'_>, name: &str) {
    let cache = Arc::new(filled::<P>());
    let op = Arc::new(move |k: u64, write: bool| {
        if write {
            cache.put(black_box(k), black_box(Unit(k)));
        } else {
            black_box(cache.get(black_box(&k)));
        }
    });
    group.bench_function(name, |b| {
        b.iter_custom(|iters| contended(iters, Arc::clone(&op)))
    });
}

fn bench_concurrent_mixed(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_8t_50r_50w");
    group.throughput(Throughput::Elements(THREADS as u64 * OPS_PER_THREAD));

    concurrent::<Lru>(&mut group, "lru");
    concurrent::<Lfu>(&mut group, "lfu");

    let moka: MokaCache<u64, u64> = MokaCache::new(CAP);
    for i in 0..CAP {
        moka.insert(i, i);
    }
    let op = Arc::new(move |k: u64, write: bool| {
        if write {
            moka.insert(black_box(k), black_box(k));
        } else {
            black_box(moka.get(black_box(&k)));
        }
    });
    group.bench_function("moka", |b| {
        b.iter_custom(|iters| contended(iters, Arc::clone(&op)))
    });

    let qc: QuickCache<u64, u64> = QuickCache::new(CAP as usize);
    for i in 0..CAP {
        qc.insert(i, i);
    }
    let qc = Arc::new(qc);
    let op = Arc::new(move |k: u64, write: bool| {
        if write {
            qc.insert(black_box(k), black_box(k));
        } else {
            black_box(qc.get(black_box(&k)));
        }
    });
    group.bench_function("quick_cache", |b| {
        b.iter_custom(|iters| contended(iters, Arc::clone(&op)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_get_hit,
    bench_put_evicting,
    bench_mixed_80r_20w,
    bench_concurrent_mixed,
);
criterion_main!(benches);
