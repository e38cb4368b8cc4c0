//! Value size contract: assigns a cost to each cached value.
//!
//! The cache enforces `Σ size(value) ≤ capacity`.  The unit of size is up to
//! the caller: a cache bounded by entry count stores values of size 1, a
//! cache bounded by memory stores values that report their byte length.
//!
//! # Example
//! ```
//! use sized_cache::{LruCache, Unit};
//!
//! // Byte-bounded: `String` reports its length.
//! let bytes: LruCache<String, String> = LruCache::new(16);
//! bytes.put("x".to_string(), "abc".to_string());
//! assert_eq!(bytes.size(), 3);
//!
//! // Count-bounded: every `Unit` costs 1.
//! let count: LruCache<String, Unit<u64>> = LruCache::new(3);
//! count.put("x".to_string(), Unit(42));
//! assert_eq!(count.size(), 1);
//! ```

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// The nominal size of a cached value.
///
/// The returned size **must be ≥ 0**.  A negative size makes the capacity
/// bound unenforceable, so the cache panics when it observes one.
pub trait Value {
    fn size(&self) -> i64;
}

/// Validates a reported size, panicking on a contract violation.
#[inline]
pub(crate) fn checked_size<V: Value + ?Sized>(value: &V) -> u64 {
    let size = value.size();
    match u64::try_from(size) {
        Ok(size) => size,
        Err(_) => panic!("cache value reported negative size {size}"),
    }
}

// ---------------------------------------------------------------------------
// Built-in implementations
// ---------------------------------------------------------------------------

impl Value for String {
    #[inline]
    fn size(&self) -> i64 {
        self.len() as i64
    }
}

impl Value for Vec<u8> {
    #[inline]
    fn size(&self) -> i64 {
        self.len() as i64
    }
}

impl Value for Box<[u8]> {
    #[inline]
    fn size(&self) -> i64 {
        self.len() as i64
    }
}

/// A placeholder for caches whose keys are the data.  Costs 1 unit.
impl Value for () {
    #[inline]
    fn size(&self) -> i64 {
        1
    }
}

impl<T: Value + ?Sized> Value for Arc<T> {
    #[inline]
    fn size(&self) -> i64 {
        (**self).size()
    }
}

impl<T: Value + ?Sized> Value for Box<T> {
    #[inline]
    fn size(&self) -> i64 {
        (**self).size()
    }
}

/// Wraps an arbitrary payload as a single entry of size 1.
///
/// Use this to bound a cache by entry count rather than by weight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Unit<T>(pub T);

impl<T> Unit<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Value for Unit<T> {
    #[inline]
    fn size(&self) -> i64 {
        1
    }
}

impl<T> Deref for Unit<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Unit<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}
