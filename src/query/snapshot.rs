//! Query Snapshot Module
//!
//! Consumer-facing view of a query session: where it is, what it holds, and
//! whether that data is fresh, stale or failed.

use tokio::time::Instant;

use crate::error::QueryError;
use crate::models::QueryResult;
use crate::query::PaginationState;

// == Query Status ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Disabled, nothing in flight
    Idle,
    /// First fetch for the current page
    Loading,
    /// Data for the current page is shown
    Ready,
    /// Data for the current page is shown while a refetch runs
    RefetchingInBackground,
    /// Last fetch for the current page failed
    Error,
}

impl QueryStatus {
    /// True while a request for the current page is in flight.
    pub fn is_fetching(&self) -> bool {
        matches!(
            self,
            QueryStatus::Loading | QueryStatus::RefetchingInBackground
        )
    }
}

// == Freshness ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// No data at all
    Empty,
    /// Data for the current page, settled
    Fresh,
    /// Data shown while newer data is pending, from another page, or kept
    /// after a failed fetch
    Stale,
    /// The last fetch failed and there is nothing to show
    Failed,
}

// == Query Snapshot ==
#[derive(Debug, Clone)]
pub struct QuerySnapshot<T> {
    pub pagination: PaginationState,
    pub status: QueryStatus,
    /// Last good result; may belong to a previous page while loading
    pub data: Option<QueryResult<T>>,
    pub error: Option<QueryError>,
    /// When `data` was fetched
    pub fetched_at: Option<Instant>,
    pub enabled: bool,
    pub(crate) placeholder: bool,
    pub(crate) generation: u64,
}

impl<T> QuerySnapshot<T> {
    pub(crate) fn new(page_size: u32, enabled: bool) -> Self {
        Self {
            pagination: PaginationState::new(page_size),
            status: if enabled {
                QueryStatus::Loading
            } else {
                QueryStatus::Idle
            },
            data: None,
            error: None,
            fetched_at: None,
            enabled,
            placeholder: false,
            generation: 0,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.pagination.current_page()
    }

    pub fn total_pages(&self) -> u32 {
        self.pagination.total_pages()
    }

    pub fn has_next_page(&self) -> bool {
        self.pagination.has_next_page()
    }

    pub fn has_previous_page(&self) -> bool {
        self.pagination.has_previous_page()
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn is_fetching(&self) -> bool {
        self.status.is_fetching()
    }

    /// True when `data` was fetched for another page or query and is only
    /// shown until the current one arrives.
    pub fn is_placeholder(&self) -> bool {
        self.placeholder && self.data.is_some()
    }

    /// Items currently shown, empty when there is no data.
    pub fn items(&self) -> &[T] {
        self.data.as_ref().map(|d| d.items.as_slice()).unwrap_or(&[])
    }

    // == Freshness ==
    pub fn freshness(&self) -> Freshness {
        match (self.status, self.data.is_some()) {
            (QueryStatus::Error, false) => Freshness::Failed,
            (_, false) => Freshness::Empty,
            (QueryStatus::Ready, true) if !self.placeholder => Freshness::Fresh,
            _ => Freshness::Stale,
        }
    }
}
