//! Paginated Query Engine
//!
//! Turns a [`PageFetcher`] into a navigable, cached query session.
//!
//! Every request for the current page carries a generation number. Responses
//! whose generation is no longer current are still cached but never applied,
//! so the session always reflects the most recent request.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::cache::SharedCache;
use crate::error::Result;
use crate::models::{PageRequest, QueryResult};
use crate::query::{
    PageFetcher, PaginationState, QuerySnapshot, QueryStatus, RetryPolicy, DEFAULT_PAGE_SIZE,
};

// == Query Options ==
#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub page_size: u32,
    /// Disabled sessions stay idle until enabled
    pub enabled: bool,
    /// How long fetched data is shown before a background refetch
    pub stale_time: Duration,
    /// Lifetime of the cache entries this session writes
    pub cache_ttl: Duration,
    pub retry: RetryPolicy,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            enabled: true,
            stale_time: Duration::from_secs(5 * 60),
            cache_ttl: Duration::from_secs(10 * 60),
            retry: RetryPolicy::default(),
        }
    }
}

/// Cache key of one page: `"{prefix}:page:{n}:limit:{size}"`.
pub fn page_key(prefix: &str, page: PageRequest) -> String {
    format!("{}:page:{}:limit:{}", prefix, page.page, page.page_size)
}

// == Prefetch ==
/// What a best-effort prefetch ended up doing. Never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefetchOutcome {
    /// Next page fetched and cached
    Primed,
    /// Next page already cached and fresh, nothing fetched
    AlreadyCached,
    /// Current page is the last one
    NoNextPage,
    /// Fetch failed; the failure was dropped
    Discarded,
    /// Session is disabled, nothing fetched
    Disabled,
}

/// Handle on a prefetch. Dropping it lets the prefetch finish detached.
#[derive(Debug)]
pub struct Prefetch {
    state: PrefetchState,
}

#[derive(Debug)]
enum PrefetchState {
    Done(PrefetchOutcome),
    Pending(JoinHandle<PrefetchOutcome>),
}

impl Prefetch {
    fn done(outcome: PrefetchOutcome) -> Self {
        Self {
            state: PrefetchState::Done(outcome),
        }
    }

    fn pending(handle: JoinHandle<PrefetchOutcome>) -> Self {
        Self {
            state: PrefetchState::Pending(handle),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(&self.state, PrefetchState::Pending(handle) if !handle.is_finished())
    }

    /// Waits for the prefetch to finish.
    pub async fn outcome(self) -> PrefetchOutcome {
        match self.state {
            PrefetchState::Done(outcome) => outcome,
            PrefetchState::Pending(handle) => handle.await.unwrap_or(PrefetchOutcome::Discarded),
        }
    }
}

// == Session ==
struct Session<T> {
    key_prefix: String,
    fetcher: Arc<dyn PageFetcher<T>>,
    snapshot: QuerySnapshot<T>,
}

struct Inner<T> {
    cache: SharedCache<QueryResult<T>>,
    options: QueryOptions,
    session: Mutex<Session<T>>,
    updates: watch::Sender<QuerySnapshot<T>>,
}

// == Paginated Query ==
/// One query session. Clones share the same session.
pub struct PaginatedQuery<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for PaginatedQuery<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> PaginatedQuery<T>
where
    T: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a session on page 1. When enabled, loading starts right away,
    /// so this must be called from within a Tokio runtime.
    pub fn new(
        key_prefix: impl Into<String>,
        fetcher: Arc<dyn PageFetcher<T>>,
        cache: SharedCache<QueryResult<T>>,
        options: QueryOptions,
    ) -> Self {
        let snapshot = QuerySnapshot::new(options.page_size, options.enabled);
        let (updates, _) = watch::channel(snapshot.clone());
        let enabled = options.enabled;

        let query = Self {
            inner: Arc::new(Inner {
                cache,
                options,
                session: Mutex::new(Session {
                    key_prefix: key_prefix.into(),
                    fetcher,
                    snapshot,
                }),
                updates,
            }),
        };

        if enabled {
            let initial = query.clone();
            tokio::spawn(async move {
                let mut session = initial.inner.session.lock().await;
                // Navigation may already have started a load
                if session.snapshot.enabled && session.snapshot.generation == 0 {
                    initial.load(&mut session).await;
                }
            });
        }

        query
    }

    // == Accessors ==
    pub fn options(&self) -> &QueryOptions {
        &self.inner.options
    }

    pub fn cache(&self) -> &SharedCache<QueryResult<T>> {
        &self.inner.cache
    }

    /// Current state of the session.
    pub fn snapshot(&self) -> QuerySnapshot<T> {
        self.inner.updates.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<QuerySnapshot<T>> {
        self.inner.updates.subscribe()
    }

    /// Cache key of the page currently shown.
    pub async fn current_page_key(&self) -> String {
        let session = self.inner.session.lock().await;
        page_key(
            &session.key_prefix,
            session.snapshot.pagination.page_request(),
        )
    }

    /// Waits until no request for the current page is in flight.
    pub async fn settled(&self) -> QuerySnapshot<T> {
        let mut updates = self.inner.updates.subscribe();
        let settled = updates
            .wait_for(|snapshot| !snapshot.is_fetching())
            .await
            .map(|snapshot| snapshot.clone());
        settled.unwrap_or_else(|_| self.snapshot())
    }

    // == Navigation ==
    /// Moves to `page`. Returns false, changing nothing, when `page` is out of
    /// `[1, total_pages]`. Asking for the current page only runs the stale check.
    pub async fn go_to_page(&self, page: u32) -> bool {
        self.navigate(|_| page).await
    }

    pub async fn go_to_next_page(&self) -> bool {
        self.navigate(|pagination| pagination.current_page().saturating_add(1))
            .await
    }

    pub async fn go_to_previous_page(&self) -> bool {
        self.navigate(|pagination| pagination.current_page().saturating_sub(1))
            .await
    }

    async fn navigate(&self, target: impl FnOnce(&PaginationState) -> u32) -> bool {
        let mut session = self.inner.session.lock().await;
        let page = target(&session.snapshot.pagination);

        if page == session.snapshot.pagination.current_page() {
            self.refresh_stale_locked(&mut session);
            return false;
        }
        if !session.snapshot.pagination.go_to(page) {
            debug!(
                page,
                total_pages = session.snapshot.pagination.total_pages(),
                "page out of range, ignoring"
            );
            return false;
        }

        if session.snapshot.enabled {
            self.load(&mut session).await;
        } else {
            self.publish(&session);
        }
        true
    }

    // == Refresh ==
    /// Starts a background refetch if the data shown is older than the stale
    /// time. Returns whether a refetch was started.
    pub async fn refresh_if_stale(&self) -> bool {
        let mut session = self.inner.session.lock().await;
        self.refresh_stale_locked(&mut session)
    }

    /// Refetches the current page regardless of age, e.g. after an error.
    pub async fn refetch(&self) -> bool {
        let mut session = self.inner.session.lock().await;
        if !session.snapshot.enabled {
            return false;
        }
        self.start_refetch(&mut session);
        true
    }

    // == Enable / Disable ==
    pub async fn set_enabled(&self, enabled: bool) {
        let mut session = self.inner.session.lock().await;
        if session.snapshot.enabled == enabled {
            return;
        }
        session.snapshot.enabled = enabled;

        if enabled {
            self.load(&mut session).await;
        } else {
            // In-flight responses become stale
            session.snapshot.generation += 1;
            session.snapshot.status = QueryStatus::Idle;
            self.publish(&session);
        }
    }

    // == Replace Query ==
    /// Points the session at a different logical query and goes back to
    /// page 1. Cached pages of the previous query are left untouched.
    pub async fn replace_query(
        &self,
        key_prefix: impl Into<String>,
        fetcher: Arc<dyn PageFetcher<T>>,
    ) {
        let mut session = self.inner.session.lock().await;
        session.key_prefix = key_prefix.into();
        session.fetcher = fetcher;
        session.snapshot.pagination.reset();
        session.snapshot.placeholder = true;

        if session.snapshot.enabled {
            self.load(&mut session).await;
        } else {
            session.snapshot.generation += 1;
            self.publish(&session);
        }
    }

    // == Prefetch ==
    /// Primes the cache with the page after the current one. Does not touch
    /// the session state; failures are dropped. Disabled sessions fetch nothing.
    pub async fn prefetch_next_page(&self) -> Prefetch {
        let (key, page, fetcher) = {
            let session = self.inner.session.lock().await;
            if !session.snapshot.enabled {
                return Prefetch::done(PrefetchOutcome::Disabled);
            }
            if !session.snapshot.pagination.has_next_page() {
                return Prefetch::done(PrefetchOutcome::NoNextPage);
            }
            let page = session.snapshot.pagination.page_request().next();
            (
                page_key(&session.key_prefix, page),
                page,
                Arc::clone(&session.fetcher),
            )
        };

        if let Some(entry) = self.inner.cache.get_entry(&key).await {
            if entry.age() <= self.inner.options.stale_time {
                return Prefetch::done(PrefetchOutcome::AlreadyCached);
            }
        }

        let cache = self.inner.cache.clone();
        let ttl = self.inner.options.cache_ttl;
        Prefetch::pending(tokio::spawn(async move {
            match fetcher.fetch_page(page).await {
                Ok(data) => {
                    debug!(key = %key, "prefetched page");
                    cache.set_with_ttl(key, data, ttl).await;
                    PrefetchOutcome::Primed
                }
                Err(err) => {
                    debug!(key = %key, error = %err, "prefetch failed, discarding");
                    PrefetchOutcome::Discarded
                }
            }
        }))
    }

    // == Internals ==
    /// Shows the current page from cache when possible, fetching otherwise.
    async fn load(&self, session: &mut Session<T>) {
        loop {
            session.snapshot.generation += 1;
            let generation = session.snapshot.generation;
            let page = session.snapshot.pagination.page_request();
            let key = page_key(&session.key_prefix, page);

            let Some(entry) = self.inner.cache.get_entry(&key).await else {
                debug!(key = %key, "cache miss, fetching page");

                let snapshot = &mut session.snapshot;
                snapshot.status = QueryStatus::Loading;
                snapshot.placeholder = snapshot.data.is_some();
                snapshot.error = None;
                self.publish(session);

                self.spawn_fetch(generation, key, page, Arc::clone(&session.fetcher));
                return;
            };

            let snapshot = &mut session.snapshot;
            if snapshot.pagination.set_total_items(entry.value.total_count) {
                // Cached total says this page is gone, look up the last one
                debug!(
                    key = %key,
                    page = snapshot.current_page(),
                    "cached total shrank, moving to last page"
                );
                continue;
            }

            let stale = entry.age() > self.inner.options.stale_time;
            debug!(key = %key, stale, "serving page from cache");

            snapshot.data = Some(entry.value);
            snapshot.fetched_at = Some(entry.stored_at);
            snapshot.placeholder = false;
            snapshot.error = None;
            snapshot.status = if stale {
                QueryStatus::RefetchingInBackground
            } else {
                QueryStatus::Ready
            };
            self.publish(session);

            if stale {
                self.spawn_fetch(generation, key, page, Arc::clone(&session.fetcher));
            }
            return;
        }
    }

    fn refresh_stale_locked(&self, session: &mut Session<T>) -> bool {
        let snapshot = &session.snapshot;
        if !snapshot.enabled || snapshot.status != QueryStatus::Ready {
            return false;
        }
        let Some(fetched_at) = snapshot.fetched_at else {
            return false;
        };
        if fetched_at.elapsed() <= self.inner.options.stale_time {
            return false;
        }

        self.start_refetch(session);
        true
    }

    fn start_refetch(&self, session: &mut Session<T>) {
        session.snapshot.generation += 1;
        let generation = session.snapshot.generation;
        let page = session.snapshot.pagination.page_request();
        let key = page_key(&session.key_prefix, page);

        let snapshot = &mut session.snapshot;
        snapshot.status = if snapshot.data.is_some() && !snapshot.placeholder {
            QueryStatus::RefetchingInBackground
        } else {
            QueryStatus::Loading
        };
        snapshot.error = None;
        self.publish(session);

        debug!(key = %key, "refetching page");
        self.spawn_fetch(generation, key, page, Arc::clone(&session.fetcher));
    }

    fn spawn_fetch(
        &self,
        generation: u64,
        key: String,
        page: PageRequest,
        fetcher: Arc<dyn PageFetcher<T>>,
    ) {
        let query = self.clone();
        tokio::spawn(async move {
            let retry = query.inner.options.retry;
            let result = retry
                .run(|_| {
                    let fetcher = Arc::clone(&fetcher);
                    async move { fetcher.fetch_page(page).await }
                })
                .await;
            query.complete(generation, key, result).await;
        });
    }

    /// Caches a successful result and applies it if it is still current.
    async fn complete(&self, generation: u64, key: String, result: Result<QueryResult<T>>) {
        if let Ok(data) = &result {
            self.inner
                .cache
                .set_with_ttl(key.clone(), data.clone(), self.inner.options.cache_ttl)
                .await;
        }

        let mut session = self.inner.session.lock().await;
        if session.snapshot.generation != generation {
            debug!(key = %key, "discarding superseded response");
            return;
        }

        let snapshot = &mut session.snapshot;
        match result {
            Ok(data) => {
                debug!(
                    key = %key,
                    items = data.items.len(),
                    total = data.total_count,
                    "page ready"
                );
                if snapshot.pagination.set_total_items(data.total_count) {
                    // The requested page no longer exists; fetch the new last page
                    debug!(
                        key = %key,
                        page = snapshot.current_page(),
                        "total shrank, moving to last page"
                    );
                    snapshot.placeholder = snapshot.data.is_some();
                    self.start_refetch(&mut session);
                    return;
                }
                snapshot.data = Some(data);
                snapshot.fetched_at = Some(Instant::now());
                snapshot.placeholder = false;
                snapshot.error = None;
                snapshot.status = QueryStatus::Ready;
            }
            Err(err) => {
                warn!(key = %key, error = %err, "page fetch failed");
                snapshot.error = Some(err);
                snapshot.status = QueryStatus::Error;
            }
        }
        self.publish(&session);
    }

    fn publish(&self, session: &Session<T>) {
        self.inner.updates.send_replace(session.snapshot.clone());
    }
}
