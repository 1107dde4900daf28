//! Insert-only in-memory cache for values derived deterministically from their key
//!
//! There is no eviction and no TTL. Inserting an existing key replaces the
//! value (last writer wins), which is harmless because every writer derives
//! the same value from the same key.
//!
//! # Example
//!
//! ```rust
//! use lastmile_core::cache::MemoCache;
//!
//! let cache: MemoCache<String, String> = MemoCache::new();
//! cache.insert("https://maps.app.goo.gl/abc".into(), "https://www.google.com/maps/@1.0,2.0".into());
//! assert!(cache.get("https://maps.app.goo.gl/abc").is_some());
//! ```

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock};

/// Shared insert-only cache
#[derive(Debug)]
pub struct MemoCache<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

impl<K, V> Default for MemoCache<K, V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached value
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Insert a value, replacing any previous one for the same key
    pub fn insert(&self, key: K, value: V) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value);
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// True if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_get_missing() {
        let cache: MemoCache<String, u32> = MemoCache::new();
        assert!(cache.get("absent").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_and_get() {
        let cache = MemoCache::new();
        cache.insert("a".to_string(), 1);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_same_key_is_idempotent() {
        let cache = Arc::new(MemoCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.insert("short".to_string(), "long".to_string()))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("short").as_deref(), Some("long"));
    }
}
