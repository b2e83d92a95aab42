//! Page fetching seam between the query engine and remote data

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{PageRequest, QueryResult};

/// Fetches one page of a logical query.
///
/// Implementations should be idempotent reads: the engine may issue the same
/// page more than once (retries, background refetch, prefetch).
#[async_trait]
pub trait PageFetcher<T>: Send + Sync {
    async fn fetch_page(&self, page: PageRequest) -> Result<QueryResult<T>>;
}
