//! Eviction listener: a callback invoked whenever a value leaves the cache.
//!
//! # Example
//! ```
//! use sized_cache::CacheBuilder;
//! use sized_cache::listener::EvictionCause;
//! use std::sync::{Arc, Mutex};
//!
//! let log: Arc<Mutex<Vec<(String, EvictionCause)>>> = Arc::new(Mutex::new(Vec::new()));
//! let log2 = Arc::clone(&log);
//!
//! let cache = CacheBuilder::<String, String>::new(6)
//!     .eviction_listener(move |key: &String, _val, cause| {
//!         log2.lock().unwrap().push((key.clone(), cause));
//!     })
//!     .build_lru();
//!
//! cache.put("a".to_string(), "123".to_string());
//! cache.put("b".to_string(), "456".to_string());
//! cache.put("c".to_string(), "789".to_string()); // capacity eviction of "a"
//! cache.remove("b"); // explicit removal
//!
//! let log = log.lock().unwrap();
//! assert_eq!(log[0], ("a".to_string(), EvictionCause::Capacity));
//! assert_eq!(log[1], ("b".to_string(), EvictionCause::Explicit));
//! ```

use std::sync::Arc;

// ---------------------------------------------------------------------------
// EvictionCause
// ---------------------------------------------------------------------------

/// The reason a value was removed from the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EvictionCause {
    /// Removed to make room for an incoming value.
    Capacity,
    /// The old value of a key that was overwritten by `put`.
    Replaced,
    /// Removed explicitly via [`Cache::remove`] or [`Cache::reset`].
    ///
    /// [`Cache::remove`]: crate::Cache::remove
    /// [`Cache::reset`]: crate::Cache::reset
    Explicit,
}

impl EvictionCause {
    /// Returns `true` if the eviction was driven by capacity pressure.
    pub fn was_evicted(&self) -> bool {
        matches!(self, EvictionCause::Capacity)
    }
}

// ---------------------------------------------------------------------------
// EvictionListener trait
// ---------------------------------------------------------------------------

/// A callback invoked exactly once for each value that leaves the cache.
///
/// The callback receives:
/// - a reference to the key,
/// - the evicted value (`Arc<V>`),
/// - the reason for removal.
///
/// **The listener runs synchronously while the cache lock is held.**  Calling
/// any method of the same cache from inside the listener deadlocks, and slow
/// listeners stall every other caller.  If the listener panics while one
/// operation evicts several values, the remaining values are still
/// delivered before the panic propagates to the caller.
pub trait EvictionListener<K, V>: Send + Sync + 'static {
    fn on_evict(&self, key: &K, value: Arc<V>, cause: EvictionCause);
}

/// An [`EvictionListener`] backed by a closure.
///
/// Created via [`CacheBuilder::eviction_listener`](crate::CacheBuilder::eviction_listener).
pub struct FnListener<F>(pub F);

impl<K, V, F> EvictionListener<K, V> for FnListener<F>
where
    F: Fn(&K, Arc<V>, EvictionCause) + Send + Sync + 'static,
{
    fn on_evict(&self, key: &K, value: Arc<V>, cause: EvictionCause) {
        (self.0)(key, value, cause)
    }
}
