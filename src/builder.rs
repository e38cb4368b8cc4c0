use std::hash::Hash;
use std::sync::Arc;

use crate::cache::{Cache, LfuCache, LruCache};
use crate::listener::{EvictionCause, EvictionListener, FnListener};
use crate::policy::lfu::LfuPolicy;
use crate::policy::lru::LruPolicy;
use crate::policy::Policy;

/// Builder for configuring and constructing a [`Cache`].
///
/// # Example
/// ```
/// use sized_cache::{CacheBuilder, LfuCache, Unit};
///
/// let cache: LfuCache<String, Unit<u32>> = CacheBuilder::new(200).build_lfu();
/// cache.put("x".to_string(), Unit(1));
/// assert!(cache.get("x").is_some());
/// assert_eq!(cache.capacity(), 200);
/// ```
pub struct CacheBuilder<K, V> {
    capacity: u64,
    listener: Option<Box<dyn EvictionListener<K, V>>>,
}

impl<K: 'static, V: 'static> CacheBuilder<K, V> {
    /// Starts a builder for a cache bounded by `capacity` units.
    ///
    /// A capacity of 0 produces a cache that never stores anything.
    pub fn new(capacity: u64) -> Self {
        CacheBuilder {
            capacity,
            listener: None,
        }
    }

    /// Register an eviction listener closure.
    ///
    /// The closure is called **synchronously, with the cache lock held**, once
    /// for every value that leaves the cache: capacity evictions, replaced
    /// values, explicit removals and resets.  Do **not** call cache methods
    /// from within the closure.
    ///
    /// # Example
    /// ```
    /// use sized_cache::CacheBuilder;
    ///
    /// let cache = CacheBuilder::<String, String>::new(10)
    ///     .eviction_listener(|key: &String, _val, cause| {
    ///         println!("evicted key={key} cause={cause:?}");
    ///     })
    ///     .build_lru();
    /// # cache.put("k".to_string(), "v".to_string());
    /// ```
    pub fn eviction_listener<F>(mut self, f: F) -> Self
    where
        F: Fn(&K, Arc<V>, EvictionCause) + Send + Sync + 'static,
    {
        self.listener = Some(Box::new(FnListener(f)));
        self
    }

    /// Register an eviction listener via the [`EvictionListener`] trait.
    pub fn eviction_listener_impl<L: EvictionListener<K, V>>(mut self, l: L) -> Self {
        self.listener = Some(Box::new(l));
        self
    }
}

impl<K, V> CacheBuilder<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Builds a cache with an arbitrary replacement policy.
    pub fn build<P: Policy<K, V>>(self) -> Cache<K, V, P> {
        Cache::with_listener(self.capacity, self.listener)
    }

    /// Builds a least-recently-used cache.
    pub fn build_lru(self) -> LruCache<K, V> {
        self.build::<LruPolicy<K, V>>()
    }

    /// Builds a least-frequently-used cache.
    pub fn build_lfu(self) -> LfuCache<K, V> {
        self.build::<LfuPolicy<K, V>>()
    }
}
