pub mod lfu;
pub mod lru;

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;

use crate::error::InvariantError;
use crate::listener::EvictionCause;

/// A value that left the policy, to be reported to the eviction listener.
pub struct Evicted<K, V> {
    pub key: K,
    pub value: Arc<V>,
    pub cause: EvictionCause,
}

impl<K, V> Evicted<K, V> {
    pub(crate) fn new(key: K, value: Arc<V>, cause: EvictionCause) -> Self {
        Evicted { key, value, cause }
    }
}

/// Core replacement strategy: owns the resident values, their sizes and the
/// ordering used to pick eviction victims.
///
/// All methods are called with the cache lock held.  Implementors only need
/// to be `Send`; the cache wraps the policy in a `Mutex`.
///
/// Sizes passed in have already been validated as non-negative and no larger
/// than [`capacity`](Policy::capacity).  A zero-capacity policy ignores
/// `insert` and stays empty.
pub trait Policy<K, V>: Send {
    /// Creates an empty policy bounded by `capacity` units.
    ///
    /// A capacity of 0 must not allocate.
    fn with_capacity(capacity: u64) -> Self
    where
        Self: Sized;

    /// Stores `value` under `key`, replacing any resident value.
    ///
    /// Returns every value that left the cache, in the order it left: the
    /// replaced value (if any) and each capacity victim.
    fn insert(&mut self, key: K, value: Arc<V>, size: u64) -> Vec<Evicted<K, V>>;

    /// Returns the resident value for `key`, recording the access.
    fn get<Q>(&mut self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized;

    /// Returns `true` if `key` is resident, without recording an access.
    fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized;

    /// Removes `key`, returning the evicted record.
    fn remove<Q>(&mut self, key: &Q) -> Option<Evicted<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized;

    /// Removes every resident value.
    fn clear(&mut self) -> Vec<Evicted<K, V>>;

    /// Number of resident entries.
    fn len(&self) -> usize;

    /// Total size currently resident.
    fn size(&self) -> u64;

    /// Maximum total size allowed.
    fn capacity(&self) -> u64;

    /// Verifies that the index and the ordering structure agree.
    fn check_invariants(&self) -> Result<(), InvariantError>;
}
