use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use tracing::{debug, trace};

use crate::error::{Result, SieveError};
use crate::slab::Slab;

/// Upper bound on the number of index buckets reserved up front.
const MAX_PREALLOCATED: usize = 1 << 16;

/// A cache based on the SIEVE eviction algorithm.
///
/// Entries are kept in insertion order. Reading an entry only sets its
/// `visited` bit; it never moves the entry. When room is needed, a hand sweeps
/// from the oldest entry toward the newest, clearing the bits it passes and
/// evicting the first entry whose bit is already clear. The hand stays where
/// it stopped, so the next eviction resumes from there.
///
/// ```
/// # use sieve::SieveCache;
/// let mut cache = SieveCache::new(2);
/// cache.insert("a", 1);
/// cache.insert("b", 2);
/// assert_eq!(cache.get("a"), Ok(&1));
///
/// // "a" was visited, so "b" goes first.
/// cache.insert("c", 3);
/// assert!(cache.contains_key("a"));
/// assert!(!cache.contains_key("b"));
/// ```
pub struct SieveCache<K: Eq + Hash + Clone, V> {
    map: HashMap<K, usize>,
    entries: Slab<K, V>,
    hand: Option<usize>,
    capacity: usize,
}

impl<K: Eq + Hash + Clone, V> SieveCache<K, V> {
    /// Create a new cache with the given capacity.
    ///
    /// A cache created with a capacity of zero refuses every insertion. Use
    /// [`try_new`](Self::try_new) to reject such a capacity instead.
    pub fn new(capacity: usize) -> Self {
        let reserved = capacity.min(MAX_PREALLOCATED);
        Self {
            map: HashMap::with_capacity(reserved),
            entries: Slab::with_capacity(reserved),
            hand: None,
            capacity,
        }
    }

    /// Create a new cache, failing with [`SieveError::InvalidCapacity`] when
    /// `capacity` is zero.
    pub fn try_new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(SieveError::InvalidCapacity);
        }
        Ok(Self::new(capacity))
    }

    /// Return the capacity of the cache.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Return the number of cached values.
    #[inline]
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.map.len(), self.entries.len());
        self.entries.len()
    }

    /// Return `true` when no values are currently cached.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return `true` if there is a value in the cache mapped to by `key`.
    ///
    /// Unlike [`get`](Self::get), this does not mark the entry as visited.
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        self.map.contains_key(key)
    }

    /// Get an immutable reference to the value mapped to by `key`, marking
    /// the entry as visited.
    pub fn get<Q>(&mut self, key: &Q) -> Result<&V>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        let slot = *self.map.get(key).ok_or(SieveError::KeyNotFound)?;
        let node = &mut self.entries[slot];
        node.visited = true;
        Ok(&node.value)
    }

    /// Get a mutable reference to the value mapped to by `key`, marking the
    /// entry as visited.
    ///
    /// This is the way to change a cached value, since [`insert`](Self::insert)
    /// never overwrites an existing entry.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Result<&mut V>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        let slot = *self.map.get(key).ok_or(SieveError::KeyNotFound)?;
        let node = &mut self.entries[slot];
        node.visited = true;
        Ok(&mut node.value)
    }

    /// Map `key` to `value` in the cache, evicting an entry first if the
    /// cache is full.
    ///
    /// If `key` is already cached, its value is left untouched and the entry
    /// is marked as visited, exactly as a [`get`](Self::get) would.
    ///
    /// Returns `true` when a new entry was stored, and `false` when the key
    /// was already present or the cache has a capacity of zero.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if self.get(&key).is_ok() {
            return false;
        }
        if self.len() >= self.capacity {
            // Cannot fail: a full cache with a non-zero capacity is not empty.
            let _ = self.evict();
        }
        let slot = self.entries.push_front(key.clone(), value);
        self.map.insert(key, slot);
        debug_assert!(self.len() <= self.capacity);
        true
    }

    /// Remove the cache entry mapped to by `key` and return its value.
    ///
    /// If the hand rests on the removed entry, it moves to the entry's newer
    /// neighbour, where the next eviction scan would have gone anyway.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<V>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        let slot = self.map.remove(key).ok_or(SieveError::KeyNotFound)?;
        if self.hand == Some(slot) {
            self.hand = self.entries[slot].prev();
            debug!(slot, hand = ?self.hand, "removed entry under the hand");
        }
        Ok(self.entries.remove(slot).value)
    }

    /// Evict one entry and return its key.
    ///
    /// The scan starts at the hand, or at the oldest entry when the hand is
    /// unset. Visited entries get their bit cleared and are skipped, wrapping
    /// around to the oldest entry after the newest one. The first unvisited
    /// entry is evicted and the hand is left on its newer neighbour.
    pub fn evict(&mut self) -> Result<K> {
        let tail = self.entries.tail().ok_or(SieveError::EmptyCache)?;
        let mut slot = self.hand.unwrap_or(tail);
        let mut demoted = 0usize;
        while self.entries[slot].visited {
            let node = &mut self.entries[slot];
            node.visited = false;
            demoted += 1;
            slot = node.prev().unwrap_or(tail);
        }
        self.hand = self.entries[slot].prev();
        let victim = self.entries.remove(slot);
        self.map.remove(&victim.key);
        trace!(slot, demoted, hand = ?self.hand, "evicted entry");
        Ok(victim.key)
    }

    /// Change the capacity of the cache.
    ///
    /// Growing never evicts. Shrinking evicts as many entries as the cache
    /// holds beyond `new_capacity`, and returns their keys in eviction order.
    pub fn resize(&mut self, new_capacity: usize) -> Vec<K> {
        if new_capacity >= self.capacity {
            debug!(from = self.capacity, to = new_capacity, "cache grown");
            self.capacity = new_capacity;
            return Vec::new();
        }
        let excess = self.len().saturating_sub(new_capacity);
        let mut evicted = Vec::with_capacity(excess);
        for _ in 0..excess {
            if let Ok(key) = self.evict() {
                evicted.push(key);
            }
        }
        debug!(
            from = self.capacity,
            to = new_capacity,
            evicted = evicted.len(),
            "cache shrunk"
        );
        self.capacity = new_capacity;
        evicted
    }

    /// Return all cached keys, in no particular order.
    pub fn keys(&self) -> Vec<K> {
        self.map.keys().cloned().collect()
    }

    /// Return all cached values, in no particular order.
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.map
            .values()
            .map(|&slot| self.entries[slot].value.clone())
            .collect()
    }

    /// Return all cached key-value pairs, in no particular order.
    pub fn items(&self) -> Vec<(K, V)>
    where
        V: Clone,
    {
        self.map
            .iter()
            .map(|(key, &slot)| (key.clone(), self.entries[slot].value.clone()))
            .collect()
    }

    /// Remove every entry and reset the hand. The capacity is kept.
    pub fn clear(&mut self) {
        debug!(len = self.len(), "cache cleared");
        self.map.clear();
        self.entries.clear();
        self.hand = None;
    }
}

/// Renders the values and their visited bits from newest to oldest entry,
/// e.g. `[C: false, B: true, A: false]`.
impl<K: Eq + Hash + Clone, V: fmt::Display> fmt::Display for SieveCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, node) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", node.value, node.visited)?;
        }
        f.write_str("]")
    }
}

impl<K: Eq + Hash + Clone, V> fmt::Debug for SieveCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SieveCache")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("hand", &self.hand)
            .finish()
    }
}
