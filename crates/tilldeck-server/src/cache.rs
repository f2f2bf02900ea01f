use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

#[derive(Clone)]
pub struct CachedBody {
    pub body: Vec<u8>,
    pub etag: String,
    created_at: Instant,
}

impl CachedBody {
    #[must_use]
    pub fn new(body: Vec<u8>, etag: String) -> Self {
        Self {
            body,
            etag,
            created_at: Instant::now(),
        }
    }
}

/// Bounded response cache keyed by normalized query string. Eviction is
/// strict insertion order: when the cache is full, the oldest INSERTED entry
/// is dropped, regardless of how recently it was read. Reads never refresh
/// an entry's position, and re-inserting an existing key keeps its original
/// slot. Entries expire after the TTL, checked on read.
pub struct ResponseCache {
    capacity: usize,
    ttl: Duration,
    entries: HashMap<String, CachedBody>,
    order: VecDeque<String>,
}

impl ResponseCache {
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity,
            ttl,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn get(&mut self, key: &str) -> Option<CachedBody> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.created_at.elapsed() > self.ttl,
            None => return None,
        };
        if expired {
            self.entries.remove(key);
            self.order.retain(|k| k != key);
            return None;
        }
        self.entries.get(key).cloned()
    }

    pub fn insert(&mut self, key: String, value: CachedBody) {
        if self.entries.contains_key(&key) {
            self.entries.insert(key, value);
            return;
        }
        while self.entries.len() >= self.capacity {
            match self.order.pop_front() {
                Some(victim) => {
                    self.entries.remove(&victim);
                }
                None => break,
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, value);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(tag: &str) -> CachedBody {
        CachedBody::new(tag.as_bytes().to_vec(), format!("\"{tag}\""))
    }

    #[test]
    fn evicts_the_oldest_inserted_entry_not_the_least_recently_used() {
        let mut cache = ResponseCache::new(3, Duration::from_secs(60));
        cache.insert("a".to_string(), body("a"));
        cache.insert("b".to_string(), body("b"));
        cache.insert("c".to_string(), body("c"));

        // Touching the oldest entry must not protect it.
        assert!(cache.get("a").is_some());
        cache.insert("d".to_string(), body("d"));

        assert!(cache.get("a").is_none(), "oldest insert evicted");
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
        assert!(cache.get("d").is_some());
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn reinserting_a_key_keeps_its_original_slot() {
        let mut cache = ResponseCache::new(2, Duration::from_secs(60));
        cache.insert("a".to_string(), body("a1"));
        cache.insert("b".to_string(), body("b"));
        cache.insert("a".to_string(), body("a2"));
        cache.insert("c".to_string(), body("c"));

        // "a" kept its original (oldest) position, so it was the victim.
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn entries_expire_after_the_ttl() {
        let mut cache = ResponseCache::new(4, Duration::from_millis(0));
        cache.insert("a".to_string(), body("a"));
        std::thread::sleep(Duration::from_millis(2));
        assert!(cache.get("a").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn capacity_is_a_hard_bound() {
        let mut cache = ResponseCache::new(50, Duration::from_secs(60));
        for i in 0..200 {
            cache.insert(format!("key-{i}"), body("x"));
        }
        assert_eq!(cache.len(), 50);
        assert!(cache.get("key-149").is_none());
        assert!(cache.get("key-199").is_some());
    }
}
