//! Result cache: TTL freshness, LRU ordering, joint entry-count and byte
//! budgets, and an optional persistent secondary store.
//!
//! Two bounds apply together: a fixed maximum entry count and the
//! `max_size_mb` byte budget from [`CacheOptions`]. Whichever is exceeded
//! first triggers eviction of the least recently used entry. The `Lfu` and
//! `Fifo` strategies are accepted but behave as `Lru`.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::content::ExtractedContent;
use crate::options::CacheOptions;

/// Fixed entry-count cap, applied jointly with the byte budget.
const MAX_ENTRIES: usize = 100;

/// A cached extraction with its insertion time.
struct CacheEntry {
    content: ExtractedContent,
    timestamp: Instant,
    size_bytes: usize,
}

/// In-memory extraction cache keyed by `hash(url, options)`.
pub struct ExtractionCache {
    options: CacheOptions,
    entries: HashMap<String, CacheEntry>,
    /// Least recently used first.
    order: VecDeque<String>,
    total_bytes: usize,
    /// Unbounded secondary store, consulted on primary miss.
    persistent: HashMap<String, ExtractedContent>,
}

impl ExtractionCache {
    pub fn new(options: CacheOptions) -> Self {
        Self { options, entries: HashMap::new(), order: VecDeque::new(), total_bytes: 0, persistent: HashMap::new() }
    }

    /// Fresh cached content for a key, updating recency. A stale entry is a
    /// miss; on a primary miss the persistent store is consulted.
    pub fn get(&mut self, key: &str) -> Option<ExtractedContent> {
        if !self.options.enabled {
            return None;
        }

        let ttl = Duration::from_millis(self.options.ttl_ms);
        let fresh = match self.entries.get(key) {
            Some(entry) => entry.timestamp.elapsed() < ttl,
            None => false,
        };

        if fresh {
            self.touch(key);
            return self.entries.get(key).map(|e| e.content.clone());
        }

        if self.entries.contains_key(key) {
            self.remove(key);
        }

        if self.options.persistent {
            return self.persistent.get(key).cloned();
        }
        None
    }

    /// Insert content under a key, evicting LRU entries until both bounds
    /// hold.
    pub fn insert(&mut self, key: String, content: ExtractedContent) {
        if !self.options.enabled {
            return;
        }

        if self.entries.contains_key(&key) {
            self.remove(&key);
        }

        let size_bytes = serde_json::to_string(&content).map(|s| s.len()).unwrap_or(0);
        if self.options.persistent {
            self.persistent.insert(key.clone(), content.clone());
        }

        self.total_bytes += size_bytes;
        self.entries.insert(key.clone(), CacheEntry { content, timestamp: Instant::now(), size_bytes });
        self.order.push_back(key);

        let byte_budget = self.options.max_size_mb * 1024 * 1024;
        while self.entries.len() > MAX_ENTRIES || (self.total_bytes > byte_budget && self.entries.len() > 1) {
            let Some(victim) = self.order.front().cloned() else { break };
            tracing::debug!(key = %victim, "evicting cache entry");
            self.remove(&victim);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry, including the persistent store.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.total_bytes = 0;
        self.persistent.clear();
    }

    fn touch(&mut self, key: &str) {
        if let Some(position) = self.order.iter().position(|k| k == key) {
            self.order.remove(position);
            self.order.push_back(key.to_string());
        }
    }

    fn remove(&mut self, key: &str) {
        if let Some(entry) = self.entries.remove(key) {
            self.total_bytes = self.total_bytes.saturating_sub(entry.size_bytes);
        }
        if let Some(position) = self.order.iter().position(|k| k == key) {
            self.order.remove(position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Metadata;

    fn content(title: &str) -> ExtractedContent {
        ExtractedContent::new(title.to_string(), Vec::new(), Metadata::default())
    }

    #[test]
    fn test_hit_within_ttl() {
        let mut cache = ExtractionCache::new(CacheOptions::default());
        cache.insert("k".to_string(), content("cached"));

        let hit = cache.get("k").unwrap();
        assert_eq!(hit.title, "cached");
    }

    #[test]
    fn test_stale_entry_is_a_miss() {
        let mut cache = ExtractionCache::new(CacheOptions { ttl_ms: 0, ..Default::default() });
        cache.insert("k".to_string(), content("cached"));
        assert!(cache.get("k").is_none(), "age >= ttl must be treated as a miss");
    }

    #[test]
    fn test_disabled_cache_stores_nothing() {
        let mut cache = ExtractionCache::new(CacheOptions { enabled: false, ..Default::default() });
        cache.insert("k".to_string(), content("cached"));
        assert!(cache.get("k").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_entry_count_bound_evicts_lru() {
        let mut cache = ExtractionCache::new(CacheOptions::default());
        for i in 0..(MAX_ENTRIES + 10) {
            cache.insert(format!("k{}", i), content(&format!("c{}", i)));
        }

        assert_eq!(cache.len(), MAX_ENTRIES);
        assert!(cache.get("k0").is_none(), "oldest entries are evicted first");
        assert!(cache.get(&format!("k{}", MAX_ENTRIES + 9)).is_some());
    }

    #[test]
    fn test_recently_used_entry_survives_eviction() {
        let mut cache = ExtractionCache::new(CacheOptions::default());
        for i in 0..MAX_ENTRIES {
            cache.insert(format!("k{}", i), content(&format!("c{}", i)));
        }

        assert!(cache.get("k0").is_some());
        cache.insert("fresh".to_string(), content("fresh"));

        assert!(cache.get("k0").is_some(), "touched entry must not be the eviction victim");
        assert!(cache.get("k1").is_none());
    }

    #[test]
    fn test_byte_budget_evicts() {
        let mut cache = ExtractionCache::new(CacheOptions { max_size_mb: 0, ..Default::default() });
        cache.insert("a".to_string(), content("first"));
        cache.insert("b".to_string(), content("second"));

        // A zero-MB budget still keeps the newest entry; the bound evicts
        // down to one rather than rejecting writes outright.
        assert_eq!(cache.len(), 1);
        assert!(cache.get("b").is_some());
    }

    #[test]
    fn test_persistent_store_survives_ttl_expiry() {
        let mut cache = ExtractionCache::new(CacheOptions { ttl_ms: 0, persistent: true, ..Default::default() });
        cache.insert("k".to_string(), content("durable"));

        let hit = cache.get("k").unwrap();
        assert_eq!(hit.title, "durable");
    }
}
