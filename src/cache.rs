use std::borrow::Borrow;
use std::hash::Hash;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::builder::CacheBuilder;
use crate::error::InvariantError;
use crate::listener::EvictionListener;
use crate::metrics::stats::{Metrics, StatsCounter};
use crate::policy::lfu::LfuPolicy;
use crate::policy::lru::LruPolicy;
use crate::policy::{Evicted, Policy};
use crate::value::{checked_size, Value};

/// A cache that evicts the least-recently-used value first.
pub type LruCache<K, V> = Cache<K, V, LruPolicy<K, V>>;

/// A cache that evicts the least-frequently-used value first.
pub type LfuCache<K, V> = Cache<K, V, LfuPolicy<K, V>>;

// ---------------------------------------------------------------------------
// Cache handle
// ---------------------------------------------------------------------------

/// A bounded, thread-safe in-memory cache.
///
/// Every operation takes a single per-instance lock, so concurrent callers
/// observe some sequential order of operations.  The replacement policy `P`
/// decides which values are evicted when a `put` would exceed capacity.
///
/// A default-constructed cache, like one built with capacity 0, is
/// permanently empty: `put` stores nothing and `get` always misses.
///
/// # Example
/// ```
/// use sized_cache::LruCache;
///
/// let cache: LruCache<String, String> = LruCache::new(8);
/// cache.put("hello".to_string(), "world".to_string());
/// assert_eq!(cache.get("hello").as_deref().map(String::as_str), Some("world"));
/// assert_eq!(cache.size(), 5);
/// ```
pub struct Cache<K, V, P> {
    policy: Mutex<P>,
    capacity: u64,
    /// Optional eviction listener.  `None` if the user didn't register one.
    listener: Option<Box<dyn EvictionListener<K, V>>>,
    metrics: StatsCounter,
}

impl<K, V, P> Cache<K, V, P>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Send + Sync + 'static,
    P: Policy<K, V>,
{
    /// Creates an empty cache bounded by `capacity` units, without a listener.
    pub fn new(capacity: u64) -> Self {
        Self::with_listener(capacity, None)
    }

    pub(crate) fn with_listener(
        capacity: u64,
        listener: Option<Box<dyn EvictionListener<K, V>>>,
    ) -> Self {
        Cache {
            policy: Mutex::new(P::with_capacity(capacity)),
            capacity,
            listener,
            metrics: StatsCounter::new(),
        }
    }

    /// Returns a [`CacheBuilder`] for constructing a new cache.
    pub fn builder(capacity: u64) -> CacheBuilder<K, V> {
        CacheBuilder::new(capacity)
    }

    // -----------------------------------------------------------------------
    // Core operations
    // -----------------------------------------------------------------------

    /// Stores `value` under `key`, evicting other values as needed.
    ///
    /// If `key` is already resident its old value is reported to the listener
    /// as [`Replaced`](crate::listener::EvictionCause::Replaced).  A value
    /// larger than the whole capacity is silently ignored.
    ///
    /// # Panics
    ///
    /// Panics if `value.size()` is negative.  The check happens before the
    /// lock is taken, so the cache is left untouched.
    pub fn put(&self, key: K, value: V)
    where
        V: Value,
    {
        if self.capacity == 0 {
            return;
        }
        let size = checked_size(&value);
        if size > self.capacity {
            tracing::debug!(
                size,
                capacity = self.capacity,
                "rejecting value larger than cache capacity"
            );
            self.metrics.record_rejection();
            return;
        }

        let mut policy = self.policy.lock();
        let evicted = policy.insert(key, Arc::new(value), size);
        // Listener runs under the lock.
        self.dispatch(evicted);
    }

    /// Returns the value for `key`, recording the access with the policy.
    pub fn get<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let found = if self.capacity == 0 {
            None
        } else {
            self.policy.lock().get(key)
        };
        match found {
            Some(_) => self.metrics.record_hit(),
            None => self.metrics.record_miss(),
        }
        found
    }

    /// Removes the value for `key` and returns it, if present.
    ///
    /// The removal is reported to the listener as
    /// [`Explicit`](crate::listener::EvictionCause::Explicit).
    pub fn remove<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.capacity == 0 {
            return None;
        }
        let mut policy = self.policy.lock();
        let evicted = policy.remove(key)?;
        let value = Arc::clone(&evicted.value);
        self.notify(evicted);
        Some(value)
    }

    /// Evicts every value, leaving the cache empty.  Capacity is unchanged.
    pub fn reset(&self) {
        if self.capacity == 0 {
            return;
        }
        let mut policy = self.policy.lock();
        let evicted = policy.clear();
        if !evicted.is_empty() {
            tracing::debug!(count = evicted.len(), "cache reset");
        }
        self.dispatch(evicted);
    }

    /// Total size of the resident values, in the cache's units.
    pub fn size(&self) -> u64 {
        if self.capacity == 0 {
            return 0;
        }
        self.policy.lock().size()
    }

    /// The fixed maximum for [`size`](Cache::size).
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        if self.capacity == 0 {
            return 0;
        }
        self.policy.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if `key` is resident.  Does not count as an access.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.capacity != 0 && self.policy.lock().contains(key)
    }

    pub fn stats(&self) -> Metrics {
        self.metrics.snapshot()
    }

    /// Verifies the policy's internal structure.  Intended for tests.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.policy.lock().check_invariants()
    }

    // -----------------------------------------------------------------------
    // Eviction dispatch
    // -----------------------------------------------------------------------

    /// Notifies every record.  A panicking listener does not stop delivery
    /// of the rest; the first panic resumes once all have been reported.
    fn dispatch(&self, evicted: Vec<Evicted<K, V>>) {
        let mut first_panic = None;
        for record in evicted {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| self.notify(record))) {
                first_panic.get_or_insert(payload);
            }
        }
        if let Some(payload) = first_panic {
            resume_unwind(payload);
        }
    }

    fn notify(&self, record: Evicted<K, V>) {
        if record.cause.was_evicted() {
            self.metrics.record_eviction(1);
        }
        if let Some(listener) = &self.listener {
            listener.on_evict(&record.key, record.value, record.cause);
        }
    }
}

impl<K, V, P> Default for Cache<K, V, P>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Send + Sync + 'static,
    P: Policy<K, V>,
{
    fn default() -> Self {
        Self::new(0)
    }
}
