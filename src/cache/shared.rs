//! Shared Cache Handle
//!
//! Cloneable handle over a [`TtlCache`] so several query sessions can share
//! one store. Sessions that should not share simply get their own handle.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::cache::{CacheEntry, CacheStats, TtlCache};

/// Thread-safe TTL cache shared by dependency injection.
///
/// Reads that may evict take the write lock, as expiration is lazy.
#[derive(Debug)]
pub struct SharedCache<V> {
    inner: Arc<RwLock<TtlCache<V>>>,
}

impl<V> Clone for SharedCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Clone> SharedCache<V> {
    pub fn new(default_ttl: Duration) -> Self {
        Self::from_store(TtlCache::new(default_ttl))
    }

    pub fn from_store(store: TtlCache<V>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    pub async fn set(&self, key: impl Into<String>, value: V) {
        self.inner.write().await.set(key, value);
    }

    pub async fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.inner.write().await.set_with_ttl(key, value, ttl);
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        self.inner.write().await.get(key)
    }

    pub async fn get_entry(&self, key: &str) -> Option<CacheEntry<V>> {
        self.inner.write().await.get_entry(key)
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.inner.write().await.delete(key)
    }

    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }

    pub async fn size(&self) -> usize {
        self.inner.read().await.size()
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.read().await.stats()
    }

    /// True when both handles point at the same store.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
