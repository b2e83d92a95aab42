//! Mission Query - paginated, filtered and cached mission listings
//!
//! Client-side data access for browsing volunteer missions: a TTL cache, a
//! paginated query engine with retries and background refresh, and a filtered
//! mission query on top of a pluggable mission source.

pub mod cache;
pub mod config;
pub mod error;
pub mod filters;
pub mod models;
pub mod query;
pub mod source;
pub mod tasks;
pub mod telemetry;

pub use cache::SharedCache;
pub use config::QueryConfig;
pub use error::{ErrorKind, QueryError, Result};
pub use filters::{FilterSet, FilterValue};
pub use models::{Mission, PageRequest, QueryResult};
pub use query::{
    Freshness, MissionQuery, PageFetcher, PaginatedQuery, PrefetchOutcome, QueryOptions,
    QuerySnapshot, QueryStatus, RetryPolicy,
};
pub use source::{InMemoryMissionSource, MissionSource, RestMissionSource};
pub use tasks::spawn_stale_check_task;
pub use telemetry::init_tracing;
