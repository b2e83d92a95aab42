//! Configuration Module
//!
//! Loads query, cache and listing endpoint settings from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::query::{QueryOptions, RetryPolicy, DEFAULT_PAGE_SIZE};

/// Query layer configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryConfig {
    /// Missions per page
    pub page_size: u32,
    /// Seconds before displayed data counts as stale
    pub stale_time_secs: u64,
    /// Lifetime in seconds of cached pages
    pub cache_ttl_secs: u64,
    /// Total fetch attempts, the first one included
    pub retry_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    /// Background stale check interval in seconds
    pub stale_check_interval_secs: u64,
    /// Base URL of the hosted listing endpoint
    pub missions_api_url: String,
    pub missions_api_key: Option<String>,
    pub missions_table: String,
    /// HTTP client timeout in seconds
    pub http_timeout_secs: u64,
}

impl QueryConfig {
    /// Creates a new QueryConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `QUERY_PAGE_SIZE` - Missions per page (default: 10)
    /// - `QUERY_STALE_TIME_SECS` - Staleness duration (default: 300)
    /// - `CACHE_DEFAULT_TTL_SECS` - Cached page lifetime (default: 600)
    /// - `QUERY_RETRY_ATTEMPTS` - Fetch attempts (default: 3)
    /// - `QUERY_RETRY_BASE_DELAY_MS` - First backoff delay (default: 1000)
    /// - `QUERY_RETRY_MAX_DELAY_MS` - Backoff cap (default: 30000)
    /// - `STALE_CHECK_INTERVAL_SECS` - Background stale check (default: 30)
    /// - `MISSIONS_API_URL` - Listing endpoint (default: http://localhost:54321)
    /// - `MISSIONS_API_KEY` - Optional API key
    /// - `MISSIONS_TABLE` - Listing table (default: missions)
    /// - `HTTP_TIMEOUT_SECS` - HTTP client timeout (default: 10)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            page_size: parse_var("QUERY_PAGE_SIZE").unwrap_or(defaults.page_size),
            stale_time_secs: parse_var("QUERY_STALE_TIME_SECS").unwrap_or(defaults.stale_time_secs),
            cache_ttl_secs: parse_var("CACHE_DEFAULT_TTL_SECS").unwrap_or(defaults.cache_ttl_secs),
            retry_attempts: parse_var("QUERY_RETRY_ATTEMPTS").unwrap_or(defaults.retry_attempts),
            retry_base_delay_ms: parse_var("QUERY_RETRY_BASE_DELAY_MS")
                .unwrap_or(defaults.retry_base_delay_ms),
            retry_max_delay_ms: parse_var("QUERY_RETRY_MAX_DELAY_MS")
                .unwrap_or(defaults.retry_max_delay_ms),
            stale_check_interval_secs: parse_var("STALE_CHECK_INTERVAL_SECS")
                .unwrap_or(defaults.stale_check_interval_secs),
            missions_api_url: env::var("MISSIONS_API_URL").unwrap_or(defaults.missions_api_url),
            missions_api_key: env::var("MISSIONS_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            missions_table: env::var("MISSIONS_TABLE").unwrap_or(defaults.missions_table),
            http_timeout_secs: parse_var("HTTP_TIMEOUT_SECS").unwrap_or(defaults.http_timeout_secs),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_attempts.max(1),
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
        }
    }

    /// Engine options for a session that starts enabled.
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            page_size: self.page_size,
            enabled: true,
            stale_time: Duration::from_secs(self.stale_time_secs),
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            retry: self.retry_policy(),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn stale_check_interval(&self) -> Duration {
        Duration::from_secs(self.stale_check_interval_secs)
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            stale_time_secs: 300,
            cache_ttl_secs: 600,
            retry_attempts: 3,
            retry_base_delay_ms: 1000,
            retry_max_delay_ms: 30_000,
            stale_check_interval_secs: 30,
            missions_api_url: "http://localhost:54321".to_string(),
            missions_api_key: None,
            missions_table: "missions".to_string(),
            http_timeout_secs: 10,
        }
    }
}
