//! Cache Statistics Module
//!
//! Counts lookups against the TTL cache so callers can judge how often pages
//! are served without a remote round trip.

use serde::Serialize;

// == Cache Stats ==
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups that returned a live value
    pub hits: u64,
    /// Lookups that found nothing or an expired value
    pub misses: u64,
    /// Expired entries dropped during a lookup
    pub expirations: u64,
    /// Entries currently held, expired-but-unread ones included
    pub total_entries: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// An expired read counts both as an expiration and a miss.
    pub(crate) fn record_expiration(&mut self) {
        self.expirations += 1;
        self.misses += 1;
    }
}
