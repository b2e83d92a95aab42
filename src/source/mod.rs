//! Mission Sources
//!
//! Where mission pages come from. The query layer only sees the
//! [`MissionSource`] trait; the REST adapter talks to the hosted listing
//! endpoint and the in-memory source evaluates requests locally.

mod in_memory;
mod rest;

use async_trait::async_trait;

use crate::error::Result;
use crate::filters::MissionRequest;
use crate::models::{Mission, QueryResult};

pub use in_memory::InMemoryMissionSource;
pub use rest::RestMissionSource;

/// Lists one page of missions matching a request, with the total match count.
#[async_trait]
pub trait MissionSource: Send + Sync {
    async fn list_missions(&self, request: &MissionRequest) -> Result<QueryResult<Mission>>;
}
