//! Bounded memory of recently processed Telegram file ids.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

/// Remembers the most recent `capacity` attachment ids so a redelivered
/// update does not re-process the same file. Best effort: evicted or
/// forgotten ids are processed again.
pub struct ProcessedCache {
    inner: Mutex<LruCache<String, ()>>,
}

impl ProcessedCache {
    /// A zero capacity is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, ()>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record `id`. Returns `true` when it was not already present.
    pub fn check_and_mark(&self, id: &str) -> bool {
        let mut cache = self.lock();
        if cache.get(id).is_some() {
            return false;
        }
        cache.put(id.to_string(), ());
        true
    }

    /// Drop `id` so a later delivery is processed again.
    pub fn forget(&self, id: &str) {
        self.lock().pop(id);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_and_mark_only_first_time() {
        let cache = ProcessedCache::new(4);
        assert!(cache.check_and_mark("a"));
        assert!(!cache.check_and_mark("a"));
        assert!(cache.check_and_mark("b"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_forget_allows_retry() {
        let cache = ProcessedCache::new(4);
        assert!(cache.check_and_mark("a"));
        cache.forget("a");
        assert!(!cache.contains("a"));
        assert!(cache.check_and_mark("a"));
    }

    #[test]
    fn test_least_recently_seen_is_evicted() {
        let cache = ProcessedCache::new(2);
        cache.check_and_mark("a");
        cache.check_and_mark("b");
        // touching "a" makes "b" the eviction candidate
        assert!(!cache.check_and_mark("a"));
        cache.check_and_mark("c");

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let cache = ProcessedCache::new(0);
        assert_eq!(cache.capacity(), 1);
        assert!(cache.check_and_mark("a"));
        assert!(cache.check_and_mark("b"));
        assert!(!cache.contains("a"));
    }
}
