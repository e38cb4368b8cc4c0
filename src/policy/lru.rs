use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;

use ahash::AHashMap;

use super::{Evicted, Policy};
use crate::error::{ensure, InvariantError};
use crate::listener::EvictionCause;

/// Index of the ring sentinel in the `nodes` arena.
const SENTINEL: usize = 0;
const NULL: usize = usize::MAX;

struct LruNode<K, V> {
    /// `None` for the sentinel and for free slots.
    key: Option<K>,
    value: Option<Arc<V>>,
    size: u64,
    /// Index toward the sentinel's `next` (more recently used).
    prev: usize,
    /// Index toward the sentinel's `prev` (less recently used).
    next: usize,
}

impl<K, V> LruNode<K, V> {
    fn sentinel() -> Self {
        LruNode {
            key: None,
            value: None,
            size: 0,
            prev: SENTINEL,
            next: SENTINEL,
        }
    }
}

/// Recency-ordered policy backed by an index-arena circular list.
///
/// Slot 0 is a sentinel; `nodes[SENTINEL].next` is the most-recently-used
/// entry and `nodes[SENTINEL].prev` the least-recently-used one.  Freed slots
/// are recycled through `free_list`, so unlink and relink are O(1).
pub struct LruPolicy<K, V> {
    /// Empty for a zero-capacity policy, otherwise slot 0 is the sentinel.
    nodes: Vec<LruNode<K, V>>,
    /// Maps a key to its index in `nodes`.
    map: AHashMap<K, usize>,
    /// Indices of freed (reusable) slots.
    free_list: Vec<usize>,
    size: u64,
    capacity: u64,
}

impl<K: Hash + Eq + Clone + Send, V: Send + Sync> LruPolicy<K, V> {
    /// Creates a new `LruPolicy` bounded by `capacity` units.
    pub fn new(capacity: u64) -> Self {
        let nodes = if capacity == 0 {
            Vec::new()
        } else {
            vec![LruNode::sentinel()]
        };
        LruPolicy {
            nodes,
            map: AHashMap::default(),
            free_list: Vec::new(),
            size: 0,
            capacity,
        }
    }

    /// Links `idx` immediately after the sentinel (marks it most-recently-used).
    fn link_front(&mut self, idx: usize) {
        let old_first = self.nodes[SENTINEL].next;
        self.nodes[idx].prev = SENTINEL;
        self.nodes[idx].next = old_first;
        self.nodes[SENTINEL].next = idx;
        self.nodes[old_first].prev = idx;
    }

    /// Detaches `idx` from its current position in the ring.
    fn unlink(&mut self, idx: usize) {
        let prev = self.nodes[idx].prev;
        let next = self.nodes[idx].next;
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
        self.nodes[idx].prev = NULL;
        self.nodes[idx].next = NULL;
    }

    /// Allocates a detached node, reusing a free slot when available.
    fn alloc_node(&mut self, key: K, value: Arc<V>, size: u64) -> usize {
        let node = LruNode {
            key: Some(key),
            value: Some(value),
            size,
            prev: NULL,
            next: NULL,
        };
        if let Some(idx) = self.free_list.pop() {
            self.nodes[idx] = node;
            idx
        } else {
            self.nodes.push(node);
            self.nodes.len() - 1
        }
    }

    /// Frees the detached node at `idx` and hands back its contents.
    fn release(&mut self, idx: usize, cause: EvictionCause) -> Evicted<K, V> {
        let node = &mut self.nodes[idx];
        let (Some(key), Some(value)) = (node.key.take(), node.value.take()) else {
            panic!("lru slot {idx} released while vacant");
        };
        self.size -= node.size;
        node.size = 0;
        self.free_list.push(idx);
        Evicted::new(key, value, cause)
    }

    /// Evicts the least-recently-used entry.
    fn evict_lru(&mut self, cause: EvictionCause) -> Evicted<K, V> {
        let idx = self.nodes[SENTINEL].prev;
        if idx == SENTINEL {
            panic!("eviction attempted on an empty recency ring");
        }
        self.unlink(idx);
        if let Some(key) = &self.nodes[idx].key {
            self.map.remove(key);
        }
        tracing::trace!(
            size = self.nodes[idx].size,
            ?cause,
            "evicting least-recently-used entry"
        );
        self.release(idx, cause)
    }

    /// Keys from most- to least-recently used.
    pub fn keys_by_recency(&self) -> Vec<&K> {
        let mut keys = Vec::with_capacity(self.map.len());
        if self.nodes.is_empty() {
            return keys;
        }
        let mut cur = self.nodes[SENTINEL].next;
        while cur != SENTINEL {
            if let Some(key) = &self.nodes[cur].key {
                keys.push(key);
            }
            cur = self.nodes[cur].next;
        }
        keys
    }
}

impl<K: Hash + Eq + Clone + Send, V: Send + Sync> Policy<K, V> for LruPolicy<K, V> {
    fn with_capacity(capacity: u64) -> Self {
        Self::new(capacity)
    }

    fn insert(&mut self, key: K, value: Arc<V>, size: u64) -> Vec<Evicted<K, V>> {
        debug_assert!(size <= self.capacity, "oversized value reached the policy");
        let mut evicted = Vec::new();
        if self.nodes.is_empty() {
            // Zero capacity: no sentinel, nothing is ever stored.
            return evicted;
        }

        let idx = if let Some(&idx) = self.map.get(&key) {
            // Replacement: detach and account the old value as evicted, but
            // keep the slot and its index entry.
            self.unlink(idx);
            let node = &mut self.nodes[idx];
            self.size -= node.size;
            node.size = size;
            if let Some(old) = node.value.replace(value) {
                evicted.push(Evicted::new(key, old, EvictionCause::Replaced));
            }
            idx
        } else {
            let idx = self.alloc_node(key.clone(), value, size);
            self.map.insert(key, idx);
            idx
        };

        while self.size + size > self.capacity {
            evicted.push(self.evict_lru(EvictionCause::Capacity));
        }

        self.link_front(idx);
        self.size += size;
        evicted
    }

    fn get<Q>(&mut self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        if self.nodes[SENTINEL].next != idx {
            self.unlink(idx);
            self.link_front(idx);
        }
        self.nodes[idx].value.clone()
    }

    fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    fn remove<Q>(&mut self, key: &Q) -> Option<Evicted<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.map.remove(key)?;
        self.unlink(idx);
        Some(self.release(idx, EvictionCause::Explicit))
    }

    fn clear(&mut self) -> Vec<Evicted<K, V>> {
        let mut evicted = Vec::with_capacity(self.map.len());
        while !self.map.is_empty() {
            evicted.push(self.evict_lru(EvictionCause::Explicit));
        }
        // Shrink the arena back to the bare sentinel.
        self.nodes.truncate(1);
        self.free_list.clear();
        evicted
    }

    fn len(&self) -> usize {
        self.map.len()
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
        if self.nodes.is_empty() {
            ensure!(self.capacity == 0, "missing sentinel with capacity {}", self.capacity);
            ensure!(self.map.is_empty(), "zero-capacity policy holds entries");
            return Ok(());
        }

        let mut count = 0usize;
        let mut total = 0u64;
        let mut prev = SENTINEL;
        let mut cur = self.nodes[SENTINEL].next;
        while cur != SENTINEL {
            ensure!(cur < self.nodes.len(), "ring link {cur} out of bounds");
            let node = &self.nodes[cur];
            ensure!(node.prev == prev, "slot {cur} has back-link {} not {prev}", node.prev);
            let Some(key) = &node.key else {
                return Err(InvariantError::new(format!("vacant slot {cur} linked in ring")));
            };
            ensure!(
                self.map.get(key) == Some(&cur),
                "index disagrees with ring position {cur}"
            );
            count += 1;
            total += node.size;
            ensure!(count <= self.map.len(), "ring longer than index");
            prev = cur;
            cur = node.next;
        }
        ensure!(self.nodes[SENTINEL].prev == prev, "sentinel back-link broken");
        ensure!(count == self.map.len(), "ring holds {count} entries, index {}", self.map.len());
        ensure!(total == self.size, "ring sizes sum to {total}, accounted {}", self.size);
        Ok(())
    }
}
