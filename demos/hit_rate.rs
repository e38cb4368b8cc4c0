//! Hit-rate comparison: LRU and LFU vs Moka vs QuickCache.
//!
//! Replays one Zipf(s=1.0) access trace against every cache.  Misses insert
//! the key, hits are counted from the first access.
//!
//! Run with:
//!     cargo run --example hit_rate --release

use moka::sync::Cache as MokaCache;
use quick_cache::sync::Cache as QuickCache;
use sized_cache::policy::lfu::LfuPolicy;
use sized_cache::policy::lru::LruPolicy;
use sized_cache::policy::Policy;
use sized_cache::{Cache, Unit};
use std::time::{Duration, Instant};

/// Cache capacity (number of unique entries each cache may hold).
const CAP: usize = 10_000;
/// Key universe size.  CAP is 10 % of POOL → moderately hard workload.
const POOL: usize = 100_000;
/// Number of accesses in the trace.
const TRACE: usize = 500_000;

// ---------------------------------------------------------------------------
// Zipf(s=1.0) sampler
//
// P(X <= k) ~ ln(k) / ln(N), so k = N^u with u ~ Uniform[0,1].
// ---------------------------------------------------------------------------

struct Xorshift64(u64);

impl Xorshift64 {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    /// Returns a uniform float in (0, 1].
    fn uniform(&mut self) -> f64 {
        let bits = self.next() >> 11;
        (bits + 1) as f64 / (1u64 << 53) as f64
    }

    /// Zipf(s=1) sample in [0, pool).
    fn zipf(&mut self, pool: usize) -> usize {
        let k = (pool as f64).powf(self.uniform()) as usize;
        k.saturating_sub(1).min(pool - 1)
    }
}

fn generate_trace(seed: u64, pool: usize, len: usize) -> Vec<usize> {
    let mut rng = Xorshift64(seed);
    (0..len).map(|_| rng.zipf(pool)).collect()
}

// ---------------------------------------------------------------------------
// Per-cache runners
// ---------------------------------------------------------------------------

fn run_sized<P: Policy<usize, Unit<usize>>>(trace: &[usize]) -> (usize, Duration) {
    let cache: Cache<usize, Unit<usize>, P> = Cache::new(CAP as u64);
    let start = Instant::now();
    for &key in trace {
        if cache.get(&key).is_none() {
            cache.put(key, Unit(key));
        }
    }
    let elapsed = start.elapsed();
    (cache.stats().hits as usize, elapsed)
}

fn run_moka(trace: &[usize]) -> (usize, Duration) {
    let cache: MokaCache<usize, usize> = MokaCache::new(CAP as u64);
    let start = Instant::now();
    let mut hits = 0usize;
    for &key in trace {
        if cache.get(&key).is_some() {
            hits += 1;
        } else {
            cache.insert(key, key);
        }
    }
    (hits, start.elapsed())
}

fn run_quick_cache(trace: &[usize]) -> (usize, Duration) {
    let cache: QuickCache<usize, usize> = QuickCache::new(CAP);
    let start = Instant::now();
    let mut hits = 0usize;
    for &key in trace {
        if cache.get(&key).is_some() {
            hits += 1;
        } else {
            cache.insert(key, key);
        }
    }
    (hits, start.elapsed())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    println!("Hit rate on a Zipf(s = 1.0) trace");
    println!();
    println!("  Key universe : {POOL:>10} unique keys");
    println!(
        "  Capacity     : {CAP:>10} entries  ({:.0}% of universe)",
        CAP as f64 / POOL as f64 * 100.0
    );
    println!("  Trace length : {TRACE:>10} accesses");
    println!();
    let trace = generate_trace(0xDEAD_BEEF_1234_5678, POOL, TRACE);

    let col_cache = 14usize;
    let col_hits = 10usize;
    let col_rate = 10usize;
    let col_time = 12usize;

    println!(
        "{:<col_cache$} {:>col_hits$} {:>col_rate$} {:>col_time$}",
        "Cache", "Hits", "Hit Rate", "Time (ms)"
    );
    println!("{}", "-".repeat(col_cache + col_hits + col_rate + col_time + 3));

    let print_row = |name: &str, hits: usize, elapsed: Duration| {
        println!(
            "{:<col_cache$} {:>col_hits$} {:>9.2}% {:>col_time$.1}",
            name,
            hits,
            hits as f64 / TRACE as f64 * 100.0,
            elapsed.as_millis(),
        );
    };

    let (hits, elapsed) = run_sized::<LruPolicy<usize, Unit<usize>>>(&trace);
    print_row("LRU", hits, elapsed);

    let (hits, elapsed) = run_sized::<LfuPolicy<usize, Unit<usize>>>(&trace);
    print_row("LFU", hits, elapsed);

    let (hits, elapsed) = run_moka(&trace);
    print_row("Moka", hits, elapsed);

    let (hits, elapsed) = run_quick_cache(&trace);
    print_row("QuickCache", hits, elapsed);

    println!();
    println!("Moka implements W-TinyLFU; QuickCache uses S3-FIFO.");
}
