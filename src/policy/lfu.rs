use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;

use ahash::AHashMap;

use super::{Evicted, Policy};
use crate::error::{ensure, InvariantError};
use crate::listener::EvictionCause;

/// A resident entry, stored directly in the heap array.
struct HeapEntry<K, V> {
    key: K,
    value: Arc<V>,
    size: u64,
    /// Number of recorded uses; starts at 1 on first insertion.
    uses: u64,
}

/// Frequency-ordered policy backed by an indexed binary min-heap.
///
/// `heap[0]` is the least-frequently-used entry.  `index` maps every
/// resident key to its current slot in `heap` and is updated on every swap,
/// so lookups are O(1) and reordering is O(log n).
///
/// A fresh entry (`uses == 1`) sifts up past every ancestor with more uses,
/// which makes it an early eviction candidate until it accrues hits, while
/// entries already above it are never disturbed.  Among entries that share
/// the minimum use count the victim is whichever sits at the root; no
/// ordering by age is implied.
///
/// The heap is 0-based (parent `(pos - 1) / 2`, children `2 * pos + 1` and
/// `2 * pos + 2`).  Victim order among tied entries therefore follows this
/// layout and generally differs from heaps that use 1-based `pos / 2`
/// arithmetic over the same array.
pub struct LfuPolicy<K, V> {
    heap: Vec<HeapEntry<K, V>>,
    /// Maps a key to its slot in `heap`.
    index: AHashMap<K, usize>,
    size: u64,
    capacity: u64,
}

impl<K: Hash + Eq + Clone + Send, V: Send + Sync> LfuPolicy<K, V> {
    /// Creates a new `LfuPolicy` bounded by `capacity` units.
    pub fn new(capacity: u64) -> Self {
        LfuPolicy {
            heap: Vec::new(),
            index: AHashMap::default(),
            size: 0,
            capacity,
        }
    }

    /// Returns the recorded use count of `key`, if resident.
    pub fn uses<Q>(&self, key: &Q) -> Option<u64>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(key).map(|&pos| self.heap[pos].uses)
    }

    /// Returns the key that would be evicted next.
    pub fn peek_victim(&self) -> Option<&K> {
        self.heap.first().map(|e| &e.key)
    }

    /// Records `pos` as the index entry for whatever now occupies it.
    #[inline]
    fn set_slot(&mut self, pos: usize) {
        if let Some(slot) = self.index.get_mut(&self.heap[pos].key) {
            *slot = pos;
        }
    }

    #[inline]
    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.set_slot(a);
        self.set_slot(b);
    }

    /// Moves the entry at `pos` toward the root while its parent has strictly
    /// more uses.  Returns the entry's final slot.
    fn sift_up(&mut self, mut pos: usize) -> usize {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.heap[parent].uses <= self.heap[pos].uses {
                break;
            }
            self.swap(parent, pos);
            pos = parent;
        }
        pos
    }

    /// Moves the entry at `pos` toward the leaves while its smaller child
    /// has strictly fewer uses.
    fn sift_down(&mut self, mut pos: usize) {
        loop {
            let left = 2 * pos + 1;
            if left >= self.heap.len() {
                return;
            }
            let right = left + 1;
            let child =
                if right < self.heap.len() && self.heap[right].uses < self.heap[left].uses {
                    right
                } else {
                    left
                };
            if self.heap[pos].uses <= self.heap[child].uses {
                return;
            }
            self.swap(pos, child);
            pos = child;
        }
    }

    /// Appends a new entry and restores heap order above it.
    fn push(&mut self, key: K, value: Arc<V>, size: u64, uses: u64) {
        let pos = self.heap.len();
        self.index.insert(key.clone(), pos);
        self.heap.push(HeapEntry {
            key,
            value,
            size,
            uses,
        });
        self.sift_up(pos);
        self.size += size;
    }

    /// Detaches the entry at `pos`, filling the hole with the last entry.
    fn take(&mut self, pos: usize) -> HeapEntry<K, V> {
        let entry = self.heap.swap_remove(pos);
        self.index.remove(&entry.key);
        self.size -= entry.size;
        if pos < self.heap.len() {
            self.set_slot(pos);
            if self.sift_up(pos) == pos {
                self.sift_down(pos);
            }
        }
        entry
    }

    /// Evicts the least-frequently-used entry.
    fn evict_root(&mut self, cause: EvictionCause) -> Evicted<K, V> {
        if self.heap.is_empty() {
            panic!("eviction attempted on an empty frequency heap");
        }
        let entry = self.take(0);
        tracing::trace!(
            size = entry.size,
            uses = entry.uses,
            ?cause,
            "evicting least-frequently-used entry"
        );
        Evicted::new(entry.key, entry.value, cause)
    }

    fn make_room(&mut self, size: u64, evicted: &mut Vec<Evicted<K, V>>) {
        while self.size + size > self.capacity {
            evicted.push(self.evict_root(EvictionCause::Capacity));
        }
    }
}

impl<K: Hash + Eq + Clone + Send, V: Send + Sync> Policy<K, V> for LfuPolicy<K, V> {
    fn with_capacity(capacity: u64) -> Self {
        Self::new(capacity)
    }

    fn insert(&mut self, key: K, value: Arc<V>, size: u64) -> Vec<Evicted<K, V>> {
        debug_assert!(size <= self.capacity, "oversized value reached the policy");
        let mut evicted = Vec::new();
        if self.capacity == 0 {
            return evicted;
        }

        if let Some(&pos) = self.index.get(&key) {
            // A replacement is not a use: the counter stays as it is.
            let old_size = self.heap[pos].size;
            if self.size - old_size + size <= self.capacity {
                let entry = &mut self.heap[pos];
                let old = std::mem::replace(&mut entry.value, value);
                entry.size = size;
                self.size = self.size - old_size + size;
                evicted.push(Evicted::new(key, old, EvictionCause::Replaced));
                return evicted;
            }

            // The larger value does not fit alongside the others.  Detach the
            // entry so it cannot be chosen as a victim, make room, then put it
            // back with the use count it had earned.
            let old = self.take(pos);
            let uses = old.uses;
            evicted.push(Evicted::new(old.key, old.value, EvictionCause::Replaced));
            self.make_room(size, &mut evicted);
            self.push(key, value, size, uses);
            return evicted;
        }

        self.make_room(size, &mut evicted);
        self.push(key, value, size, 1);
        evicted
    }

    fn get<Q>(&mut self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let pos = *self.index.get(key)?;
        let entry = &mut self.heap[pos];
        entry.uses = entry.uses.saturating_add(1);
        let value = Arc::clone(&entry.value);
        self.sift_down(pos);
        Some(value)
    }

    fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    fn remove<Q>(&mut self, key: &Q) -> Option<Evicted<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let pos = *self.index.get(key)?;
        let entry = self.take(pos);
        Some(Evicted::new(entry.key, entry.value, EvictionCause::Explicit))
    }

    fn clear(&mut self) -> Vec<Evicted<K, V>> {
        let mut evicted = Vec::with_capacity(self.heap.len());
        while !self.heap.is_empty() {
            evicted.push(self.evict_root(EvictionCause::Explicit));
        }
        evicted
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn capacity(&self) -> u64 {
        self.capacity
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        ensure!(
            self.size <= self.capacity,
            "resident size {} exceeds capacity {}",
            self.size,
            self.capacity
        );
        ensure!(
            self.heap.len() == self.index.len(),
            "heap holds {} entries, index {}",
            self.heap.len(),
            self.index.len()
        );
        let mut total = 0u64;
        for (pos, entry) in self.heap.iter().enumerate() {
            ensure!(
                self.index.get(&entry.key) == Some(&pos),
                "index disagrees with heap slot {pos}"
            );
            ensure!(entry.uses >= 1, "slot {pos} has zero uses");
            if pos > 0 {
                let parent = (pos - 1) / 2;
                ensure!(
                    self.heap[parent].uses <= entry.uses,
                    "heap order broken between slots {parent} and {pos}"
                );
            }
            total += entry.size;
        }
        ensure!(total == self.size, "heap sizes sum to {total}, accounted {}", self.size);
        Ok(())
    }
}
