//! LRU cache for AI operation results.
//!
//! Values are JSON-serialized strings, so cacheable return types are
//! constrained to JSON-safe shapes (strings and plain structs) — which is
//! everything the providers return.

use std::collections::HashMap;

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Default maximum number of cached responses.
pub const DEFAULT_CACHE_SIZE: usize = 100;

/// LRU map from operation+input keys to serialized results.
pub struct ResponseCache {
    max_size: usize,
    entries: HashMap<String, String>,
    /// Recency order; front is least recently used.
    order: Vec<String>,
}

impl ResponseCache {
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size: max_size.max(1),
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Deterministic key for an (operation, input) pair.
    ///
    /// `serde_json` keeps object keys sorted, so stringification is
    /// canonical regardless of how the input map was built.
    pub fn generate_key(operation: &str, input: &Value) -> String {
        let digest = Sha256::digest(input.to_string().as_bytes());
        format!("{operation}:{}", hex::encode(digest))
    }

    /// Look up a key; a hit promotes it to most recently used.
    pub fn get(&mut self, key: &str) -> Option<String> {
        if !self.entries.contains_key(key) {
            return None;
        }
        self.touch(key);
        self.entries.get(key).cloned()
    }

    /// Insert or overwrite; evicts the least recently used entry past
    /// capacity.
    pub fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
        self.touch(key);

        while self.entries.len() > self.max_size {
            if self.order.is_empty() {
                break;
            }
            let oldest = self.order.remove(0);
            self.entries.remove(&oldest);
        }
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Move a key to the most-recently-used position.
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        self.order.push(key.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_miss_and_hit() {
        let mut cache = ResponseCache::new(10);
        assert_eq!(cache.get("k"), None);
        cache.set("k", "v".to_string());
        assert_eq!(cache.get("k"), Some("v".to_string()));
    }

    #[test]
    fn test_eviction_drops_least_recently_used() {
        let mut cache = ResponseCache::new(3);
        cache.set("a", "1".to_string());
        cache.set("b", "2".to_string());
        cache.set("c", "3".to_string());
        cache.set("d", "4".to_string());

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("d"), Some("4".to_string()));
    }

    #[test]
    fn test_get_protects_entry_from_eviction() {
        let mut cache = ResponseCache::new(3);
        cache.set("a", "1".to_string());
        cache.set("b", "2".to_string());
        cache.set("c", "3".to_string());

        // Touch "a" so "b" becomes the eviction candidate
        cache.get("a");
        cache.set("d", "4".to_string());

        assert_eq!(cache.get("a"), Some("1".to_string()));
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn test_overwrite_does_not_grow() {
        let mut cache = ResponseCache::new(2);
        cache.set("a", "1".to_string());
        cache.set("a", "2".to_string());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a"), Some("2".to_string()));
    }

    #[test]
    fn test_clear() {
        let mut cache = ResponseCache::new(2);
        cache.set("a", "1".to_string());
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_generate_key_is_deterministic() {
        let a = ResponseCache::generate_key("summarize", &json!({"text": "hi", "n": 1}));
        let b = ResponseCache::generate_key("summarize", &json!({"n": 1, "text": "hi"}));
        assert_eq!(a, b);
    }

    #[test]
    fn test_generate_key_discriminates() {
        let a = ResponseCache::generate_key("summarize", &json!("hello"));
        let b = ResponseCache::generate_key("rewrite", &json!("hello"));
        let c = ResponseCache::generate_key("summarize", &json!("other"));
        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}
