use lru::LruCache;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};

use super::ContentRequirements;

/// Thread-safe LRU cache of content requirements keyed by query hash
///
/// Uses Arc<Mutex<>> pattern for safe concurrent access across threads.
/// A capacity of zero is treated as one.
#[derive(Clone)]
pub struct RequirementsCache {
    cache: Arc<Mutex<LruCache<String, ContentRequirements>>>,
}

impl RequirementsCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, ContentRequirements>> {
        // A panic while holding the lock cannot leave the LRU half-updated
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: &str) -> Option<ContentRequirements> {
        self.lock().get(key).cloned()
    }

    /// If the cache is at capacity, the least recently used entry is evicted
    pub fn put(&self, key: String, value: ContentRequirements) {
        self.lock().put(key, value);
    }

    /// Stable key for a query. Case and surrounding whitespace are ignored.
    pub fn generate_key(&self, query: &str) -> String {
        let mut hasher = DefaultHasher::new();
        query.trim().to_lowercase().as_bytes().hash(&mut hasher);
        format!("{:x}", hasher.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::thread;

    fn requirements(weight: f32) -> ContentRequirements {
        ContentRequirements {
            weights: BTreeMap::from([("results".to_string(), weight)]),
            include_references: false,
            include_authors: false,
        }
    }

    #[test]
    fn test_cache_hit_after_put() {
        let cache = RequirementsCache::new(10);
        let key = cache.generate_key("what are the results");
        cache.put(key.clone(), requirements(0.9));
        assert_eq!(cache.get(&key), Some(requirements(0.9)));
    }

    #[test]
    fn test_cache_miss() {
        let cache = RequirementsCache::new(10);
        assert_eq!(cache.get("nonexistent_key"), None);
    }

    #[test]
    fn test_zero_capacity_still_caches() {
        let cache = RequirementsCache::new(0);
        cache.put("k".to_string(), requirements(0.1));
        assert!(cache.get("k").is_some());
    }

    #[test]
    fn test_lru_ordering() {
        let cache = RequirementsCache::new(2);
        cache.put("q1".to_string(), requirements(0.1));
        cache.put("q2".to_string(), requirements(0.2));

        // Touch q1 so q2 becomes least recently used
        let _ = cache.get("q1");
        cache.put("q3".to_string(), requirements(0.3));

        assert!(cache.get("q1").is_some());
        assert_eq!(cache.get("q2"), None);
        assert!(cache.get("q3").is_some());
    }

    #[test]
    fn test_key_normalizes_case_and_whitespace() {
        let cache = RequirementsCache::new(10);
        assert_eq!(
            cache.generate_key("  Summarize This Paper "),
            cache.generate_key("summarize this paper")
        );
        assert_ne!(cache.generate_key("query A"), cache.generate_key("query B"));
    }

    #[test]
    fn test_concurrent_access() {
        let cache = RequirementsCache::new(100);
        let handles: Vec<_> = (0..10)
            .map(|i| {
                let cache = cache.clone();
                thread::spawn(move || {
                    let key = cache.generate_key(&format!("query_{i}"));
                    cache.put(key.clone(), requirements(i as f32 / 10.0));
                    assert!(cache.get(&key).is_some());
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
