//! Cache Module
//!
//! Provides in-memory caching with per-entry TTL and lazy expiration.

mod entry;
mod shared;
mod stats;
mod store;


use std::time::Duration;

// Re-export public types
pub use entry::CacheEntry;
pub use shared::SharedCache;
pub use stats::CacheStats;
pub use store::TtlCache;

// == Public Constants ==
/// TTL used when a cache is built without one
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
