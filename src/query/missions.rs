//! Filtered Mission Query
//!
//! Binds a [`FilterSet`] to a [`MissionSource`] and drives a
//! [`PaginatedQuery`] over the result. Each filter combination gets its own
//! cache key prefix, so switching back to an earlier combination is served
//! from cache while its entries live.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::info;

use crate::cache::SharedCache;
use crate::error::Result;
use crate::filters::{compose, FilterSet, MissionRequest};
use crate::models::{Mission, PageRequest, QueryResult};
use crate::query::{PageFetcher, PaginatedQuery, Prefetch, QueryOptions, QuerySnapshot};
use crate::source::MissionSource;

/// Prefix of every mission listing cache key.
pub const MISSIONS_QUERY: &str = "missions";

/// Fetches pages of one fixed filter combination.
struct FilteredFetcher {
    source: Arc<dyn MissionSource>,
    filters: FilterSet,
}

#[async_trait]
impl PageFetcher<Mission> for FilteredFetcher {
    async fn fetch_page(&self, page: PageRequest) -> Result<QueryResult<Mission>> {
        let request = MissionRequest::from_filters(&self.filters, page)?;
        self.source.list_missions(&request).await
    }
}

// == Mission Query ==
pub struct MissionQuery {
    source: Arc<dyn MissionSource>,
    filters: FilterSet,
    cache_key: String,
    query: PaginatedQuery<Mission>,
}

impl MissionQuery {
    /// Starts a session for `filters`. Invalid filters are rejected before
    /// anything is fetched.
    pub fn new(
        source: Arc<dyn MissionSource>,
        cache: SharedCache<QueryResult<Mission>>,
        filters: FilterSet,
        options: QueryOptions,
    ) -> Result<Self> {
        compose(&filters)?;
        let cache_key = filters.cache_key(MISSIONS_QUERY)?;
        let fetcher = Arc::new(FilteredFetcher {
            source: Arc::clone(&source),
            filters: filters.clone(),
        });
        let query = PaginatedQuery::new(cache_key.clone(), fetcher, cache, options);

        Ok(Self {
            source,
            filters,
            cache_key,
            query,
        })
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Key prefix of the current filter combination.
    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    /// Underlying engine, for callers that need its full API.
    pub fn engine(&self) -> &PaginatedQuery<Mission> {
        &self.query
    }

    // == Filters ==
    /// Switches to a new filter combination and goes back to page 1.
    ///
    /// Returns `Ok(false)` when the filters are unchanged. Invalid filters
    /// leave the session untouched.
    pub async fn set_filters(&mut self, filters: FilterSet) -> Result<bool> {
        if filters == self.filters {
            return Ok(false);
        }
        compose(&filters)?;
        let cache_key = filters.cache_key(MISSIONS_QUERY)?;

        info!(
            from = %self.cache_key,
            to = %cache_key,
            "mission filters changed, back to page 1"
        );

        let fetcher = Arc::new(FilteredFetcher {
            source: Arc::clone(&self.source),
            filters: filters.clone(),
        });
        self.query.replace_query(cache_key.clone(), fetcher).await;
        self.filters = filters;
        self.cache_key = cache_key;
        Ok(true)
    }

    // == Delegates ==
    pub async fn go_to_page(&self, page: u32) -> bool {
        self.query.go_to_page(page).await
    }

    pub async fn go_to_next_page(&self) -> bool {
        self.query.go_to_next_page().await
    }

    pub async fn go_to_previous_page(&self) -> bool {
        self.query.go_to_previous_page().await
    }

    pub async fn prefetch_next_page(&self) -> Prefetch {
        self.query.prefetch_next_page().await
    }

    pub async fn refresh_if_stale(&self) -> bool {
        self.query.refresh_if_stale().await
    }

    pub async fn refetch(&self) -> bool {
        self.query.refetch().await
    }

    pub async fn set_enabled(&self, enabled: bool) {
        self.query.set_enabled(enabled).await
    }

    pub fn snapshot(&self) -> QuerySnapshot<Mission> {
        self.query.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<QuerySnapshot<Mission>> {
        self.query.subscribe()
    }

    pub async fn settled(&self) -> QuerySnapshot<Mission> {
        self.query.settled().await
    }
}
