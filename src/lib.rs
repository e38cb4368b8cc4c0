//! Bounded in-memory caches with pluggable replacement policies.
//!
//! Two policies are provided: [`LruCache`] evicts the least-recently-used
//! value and [`LfuCache`] the least-frequently-used one.  Capacity is counted
//! in whatever unit the stored values report through [`Value::size`], so the
//! same cache types bound either entry counts or bytes.
//!
//! Every cache guards its state with one lock.  An optional
//! [`EvictionListener`](listener::EvictionListener) is called with that lock
//! held, exactly once for each value that leaves the cache.

mod builder;
mod cache;
mod metrics;
pub mod error;
pub mod listener;
pub mod policy;
pub mod value;

pub use builder::CacheBuilder;
pub use cache::{Cache, LfuCache, LruCache};
pub use metrics::stats::Metrics;
pub use value::{Unit, Value};
