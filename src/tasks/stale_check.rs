//! Stale Check Task
//!
//! Background task that periodically asks a query session to refresh data
//! older than its stale time.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::query::PaginatedQuery;

/// Spawns a task that calls [`PaginatedQuery::refresh_if_stale`] every
/// `interval`.
///
/// The task runs until aborted through the returned handle. Ticks on a
/// disabled, loading or fresh session do nothing.
///
/// # Example
/// ```ignore
/// let handle = spawn_stale_check_task(missions.engine().clone(), config.stale_check_interval());
/// // Later, when the session goes away:
/// handle.abort();
/// ```
pub fn spawn_stale_check_task<T>(query: PaginatedQuery<T>, interval: Duration) -> JoinHandle<()>
where
    T: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs(), "starting stale check task");

        loop {
            tokio::time::sleep(interval).await;

            if query.refresh_if_stale().await {
                info!("stale check: background refetch started");
            } else {
                debug!("stale check: nothing to refresh");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SharedCache;
    use crate::filters::FilterSet;
    use crate::models::Mission;
    use crate::query::{MissionQuery, QueryOptions, QueryStatus};
    use crate::source::InMemoryMissionSource;
    use chrono::Utc;
    use std::sync::Arc;

    fn options() -> QueryOptions {
        QueryOptions {
            stale_time: Duration::from_secs(60),
            ..QueryOptions::default()
        }
    }

    async fn settled_query(source: Arc<InMemoryMissionSource>) -> MissionQuery {
        let query = MissionQuery::new(
            source,
            SharedCache::new(Duration::from_secs(600)),
            FilterSet::new(),
            options(),
        )
        .unwrap();
        query.settled().await;
        query
    }

    fn source() -> Arc<InMemoryMissionSource> {
        Arc::new(InMemoryMissionSource::new(vec![Mission::new(
            "m1",
            "Distribution alimentaire",
            Utc::now(),
        )]))
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_check_refetches_old_data() {
        let source = source();
        let query = settled_query(source.clone()).await;

        let handle = spawn_stale_check_task(query.engine().clone(), Duration::from_secs(30));

        // Ticks at 30s and 60s find fresh data, the 90s tick refetches
        tokio::time::sleep(Duration::from_secs(95)).await;

        assert_eq!(source.call_count(), 2);
        assert_eq!(query.snapshot().status, QueryStatus::Ready);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_check_leaves_fresh_data() {
        let source = source();
        let query = settled_query(source.clone()).await;

        let handle = spawn_stale_check_task(query.engine().clone(), Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(55)).await;

        assert_eq!(source.call_count(), 1);
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_check_can_be_aborted() {
        let query = settled_query(source()).await;

        let handle = spawn_stale_check_task(query.engine().clone(), Duration::from_secs(1));
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
