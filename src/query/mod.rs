//! Query Module
//!
//! Paginated query sessions over the shared cache, and the filtered mission
//! query built on top of them.

mod fetcher;
mod missions;
mod paginated;
mod pagination;
mod retry;
mod snapshot;


pub use fetcher::PageFetcher;
pub use missions::{MissionQuery, MISSIONS_QUERY};
pub use paginated::{page_key, PaginatedQuery, Prefetch, PrefetchOutcome, QueryOptions};
pub use pagination::{PaginationState, DEFAULT_PAGE_SIZE};
pub use retry::RetryPolicy;
pub use snapshot::{Freshness, QuerySnapshot, QueryStatus};
