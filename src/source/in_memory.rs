//! In-memory mission source
//!
//! Evaluates requests against a local list, newest first. Failures can be
//! queued up front to exercise retry and error paths.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::error::{QueryError, Result};
use crate::filters::MissionRequest;
use crate::models::{Mission, QueryResult};
use crate::source::MissionSource;

#[derive(Debug, Default)]
pub struct InMemoryMissionSource {
    missions: RwLock<Vec<Mission>>,
    failures: Mutex<VecDeque<QueryError>>,
    calls: AtomicUsize,
}

impl InMemoryMissionSource {
    pub fn new(missions: Vec<Mission>) -> Self {
        Self {
            missions: RwLock::new(missions),
            ..Self::default()
        }
    }

    pub async fn insert(&self, mission: Mission) {
        self.missions.write().await.push(mission);
    }

    /// Makes the next call fail with `err`. Queued failures are consumed in order.
    pub async fn push_failure(&self, err: QueryError) {
        self.failures.lock().await.push_back(err);
    }

    /// Number of `list_missions` calls so far, failed ones included.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MissionSource for InMemoryMissionSource {
    async fn list_missions(&self, request: &MissionRequest) -> Result<QueryResult<Mission>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self.failures.lock().await.pop_front() {
            debug!(error = %err, "in-memory source failing on request");
            return Err(err);
        }

        let missions = self.missions.read().await;
        let mut matching: Vec<&Mission> = missions.iter().filter(|m| request.matches(m)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        let total_count = matching.len() as u64;
        let offset = usize::try_from(request.offset).unwrap_or(usize::MAX);
        let items = matching
            .into_iter()
            .skip(offset)
            .take(request.limit as usize)
            .cloned()
            .collect();

        Ok(QueryResult::new(items, total_count))
    }
}
