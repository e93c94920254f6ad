//! Bounded memoization for pure parse and compose results.

use std::collections::{BTreeMap, VecDeque};

///
/// CacheStats
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub size: usize,
}

///
/// BoundedCache
///
/// Fixed-capacity map keyed by the exact input. The oldest entry is
/// evicted first. A capacity of zero stores nothing.
///

#[derive(Debug)]
pub struct BoundedCache<K, V> {
    capacity: usize,
    entries: BTreeMap<K, V>,
    order: VecDeque<K>,
    hits: usize,
    misses: usize,
}

impl<K: Clone + Ord, V: Clone> BoundedCache<K, V> {
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: BTreeMap::new(),
            order: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, key: &K) -> Option<V> {
        let found = self.entries.get(key).cloned();
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }

        found
    }

    pub fn insert(&mut self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.insert(key.clone(), value).is_some() {
            return;
        }

        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    /// Cached value for `key`, computing and storing it on a miss.
    pub fn get_or_try_insert<E>(
        &mut self,
        key: &K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<(V, bool), E> {
        if let Some(value) = self.get(key) {
            return Ok((value, true));
        }
        let value = compute()?;
        self.insert(key.clone(), value.clone());

        Ok((value, false))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.hits = 0;
        self.misses = 0;
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            size: self.entries.len(),
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hits_and_misses_are_counted() {
        let mut cache = BoundedCache::new(4);
        cache.insert("a".to_string(), 1);

        assert_eq!(cache.get(&"a".to_string()), Some(1));
        assert_eq!(cache.get(&"b".to_string()), None);
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                size: 1
            }
        );
    }

    #[test]
    fn oldest_entry_is_evicted_at_capacity() {
        let mut cache = BoundedCache::new(2);
        cache.insert(1, "one");
        cache.insert(2, "two");
        cache.insert(1, "uno");
        cache.insert(3, "three");

        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&2), Some("two"));
        assert_eq!(cache.get(&3), Some("three"));
        assert_eq!(cache.stats().size, 2);
    }

    #[test]
    fn zero_capacity_disables_storage() {
        let mut cache = BoundedCache::new(0);
        let (value, cached) = cache
            .get_or_try_insert(&1, || Ok::<_, ()>("computed"))
            .expect("compute should succeed");

        assert_eq!(value, "computed");
        assert!(!cached);
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn failed_computation_is_not_cached() {
        let mut cache: BoundedCache<u8, u8> = BoundedCache::new(2);

        assert!(cache.get_or_try_insert(&1, || Err("boom")).is_err());
        let (value, cached) = cache
            .get_or_try_insert(&1, || Ok::<_, &str>(7))
            .expect("second compute should succeed");

        assert_eq!((value, cached), (7, false));
        assert_eq!(cache.get_or_try_insert(&1, || Err("unused")), Ok((7, true)));
    }

    #[test]
    fn clear_resets_entries_and_counters() {
        let mut cache = BoundedCache::new(2);
        cache.insert(1, 1);
        let _ = cache.get(&1);
        cache.clear();

        assert_eq!(cache.stats(), CacheStats::default());
    }
}
