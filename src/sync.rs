use crate::{Result, SieveCache};
use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A thread-safe wrapper around `SieveCache`.
///
/// Every operation takes the same lock, so each one is atomic with respect to
/// the others. Use [`with_lock`](Self::with_lock) to run several operations
/// as one atomic step.
#[derive(Clone)]
pub struct SyncSieveCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Send + Sync,
{
    inner: Arc<Mutex<SieveCache<K, V>>>,
}

impl<K, V> SyncSieveCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Send + Sync,
{
    /// Create a new thread-safe cache with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self::from(SieveCache::new(capacity))
    }

    /// Create a new thread-safe cache, rejecting a zero capacity.
    pub fn try_new(capacity: usize) -> Result<Self> {
        SieveCache::try_new(capacity).map(Self::from)
    }

    // Operations never leave the cache half-updated, so a poisoned lock still
    // guards a consistent cache.
    fn locked(&self) -> MutexGuard<'_, SieveCache<K, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the capacity of the cache.
    pub fn capacity(&self) -> usize {
        self.locked().capacity()
    }

    /// Return the number of cached values.
    pub fn len(&self) -> usize {
        self.locked().len()
    }

    /// Return `true` when no values are currently cached.
    pub fn is_empty(&self) -> bool {
        self.locked().is_empty()
    }

    /// Return `true` if there is a value in the cache mapped to by `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        self.locked().contains_key(key)
    }

    /// Get a clone of the value in the cache mapped to by `key`, marking the
    /// entry as visited.
    ///
    /// Note: Unlike the unwrapped SieveCache, this returns a clone of the value
    /// rather than a reference, since the mutex guard would be dropped.
    pub fn get<Q>(&self, key: &Q) -> Result<V>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
        V: Clone,
    {
        self.locked().get(key).cloned()
    }

    /// Run `f` on the value mapped to by `key`, marking the entry as visited.
    ///
    /// `f` runs while the lock is held and must not call back into this cache.
    pub fn get_mut<Q, F, T>(&self, key: &Q, f: F) -> Result<T>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
        F: FnOnce(&mut V) -> T,
    {
        self.locked().get_mut(key).map(f)
    }

    /// Map `key` to `value` in the cache, possibly evicting an old entry.
    ///
    /// See [`SieveCache::insert`] for the handling of keys that are already
    /// cached.
    pub fn insert(&self, key: K, value: V) -> bool {
        self.locked().insert(key, value)
    }

    /// Remove the cache entry mapped to by `key` and return its value.
    pub fn remove<Q>(&self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.locked().remove(key)
    }

    /// Evict one entry that was not recently accessed and return its key.
    pub fn evict(&self) -> Result<K> {
        self.locked().evict()
    }

    /// Change the capacity, returning the keys evicted to fit it.
    pub fn resize(&self, new_capacity: usize) -> Vec<K> {
        self.locked().resize(new_capacity)
    }

    /// Return a snapshot of all cached keys, in no particular order.
    pub fn keys(&self) -> Vec<K> {
        self.locked().keys()
    }

    /// Return a snapshot of all cached values, in no particular order.
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.locked().values()
    }

    /// Return a snapshot of all cached key-value pairs, in no particular order.
    pub fn items(&self) -> Vec<(K, V)>
    where
        V: Clone,
    {
        self.locked().items()
    }

    /// Remove every entry. The capacity is kept.
    pub fn clear(&self) {
        self.locked().clear()
    }

    /// Get exclusive access to the underlying cache.
    ///
    /// This can be useful for performing multiple operations atomically.
    pub fn with_lock<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut SieveCache<K, V>) -> T,
    {
        let mut guard = self.locked();
        f(&mut guard)
    }
}

impl<K, V> From<SieveCache<K, V>> for SyncSieveCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Send + Sync,
{
    fn from(cache: SieveCache<K, V>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SieveError;
    use std::thread;

    #[test]
    fn test_sync_cache() {
        let cache = SyncSieveCache::new(100);

        // Insert a value
        assert!(cache.insert("key1".to_string(), "value1".to_string()));

        // Read back the value
        assert_eq!(cache.get("key1"), Ok("value1".to_string()));

        // Check contains_key
        assert!(cache.contains_key("key1"));

        // Check capacity and length
        assert_eq!(cache.capacity(), 100);
        assert_eq!(cache.len(), 1);

        // Remove a value
        assert_eq!(cache.remove("key1"), Ok("value1".to_string()));
        assert_eq!(cache.remove("key1"), Err(SieveError::KeyNotFound));
        assert!(cache.is_empty());
        assert_eq!(cache.evict(), Err(SieveError::EmptyCache));
    }

    #[test]
    fn test_try_new() {
        assert!(SyncSieveCache::<u32, u32>::try_new(0).is_err());
        assert_eq!(
            SyncSieveCache::<u32, u32>::try_new(3).map(|c| c.capacity()),
            Ok(3)
        );
    }

    #[test]
    fn test_multithreaded_access() {
        let cache = SyncSieveCache::new(100);
        let cache_clone = cache.clone();

        // Add some initial data
        cache.insert("shared".to_string(), "initial".to_string());

        // Spawn a thread that touches the cache
        let thread = thread::spawn(move || {
            // Already cached: counts as a read, the value stays.
            cache_clone.insert("shared".to_string(), "updated".to_string());
            cache_clone.insert("thread_only".to_string(), "thread_value".to_string());
        });

        // Main thread operations
        cache.insert("main_only".to_string(), "main_value".to_string());

        // Wait for thread to complete
        thread.join().unwrap();

        // Verify results
        assert_eq!(cache.get("shared"), Ok("initial".to_string()));
        assert_eq!(cache.get("thread_only"), Ok("thread_value".to_string()));
        assert_eq!(cache.get("main_only"), Ok("main_value".to_string()));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_get_mut() {
        let cache = SyncSieveCache::new(10);
        cache.insert("counter", 1u32);
        let bumped = cache.get_mut("counter", |v| {
            *v += 1;
            *v
        });
        assert_eq!(bumped, Ok(2));
        assert_eq!(cache.get("counter"), Ok(2));
        assert_eq!(
            cache.get_mut("missing", |v| *v),
            Err(SieveError::KeyNotFound)
        );
    }

    #[test]
    fn test_resize_and_snapshots() {
        let cache = SyncSieveCache::new(3);
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("c", 3);
        cache.get("a").unwrap();

        assert_eq!(cache.resize(2), vec!["b"]);
        let mut items = cache.items();
        items.sort();
        assert_eq!(items, vec![("a", 1), ("c", 3)]);
        let mut values = cache.values();
        values.sort();
        assert_eq!(values, vec![1, 3]);
        assert_eq!(cache.keys().len(), 2);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 2);
    }

    #[test]
    fn test_with_lock() {
        let cache = SyncSieveCache::new(100);

        // Perform multiple operations atomically
        cache.with_lock(|inner_cache| {
            inner_cache.insert("key1".to_string(), "value1".to_string());
            inner_cache.insert("key2".to_string(), "value2".to_string());
            inner_cache.insert("key3".to_string(), "value3".to_string());
        });

        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_survives_poisoned_lock() {
        let cache = SyncSieveCache::new(4);
        cache.insert("a", 1);

        let poisoner = cache.clone();
        let _ = thread::spawn(move || {
            poisoner.with_lock(|_| panic!("poison the lock"));
        })
        .join();

        assert_eq!(cache.get("a"), Ok(1));
        assert!(cache.insert("b", 2));
    }
}
