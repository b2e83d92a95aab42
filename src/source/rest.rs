//! REST mission source
//!
//! Lists missions from the hosted PostgREST endpoint. Predicates become
//! PostgREST filter parameters; the total match count comes back in the
//! `Content-Range` header.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_RANGE};
use tracing::debug;

use crate::config::QueryConfig;
use crate::error::{QueryError, Result};
use crate::filters::{geo, MissionRequest, Predicate};
use crate::models::{Mission, QueryResult};
use crate::source::MissionSource;

/// Newest missions first.
const ORDER: &str = "created_at.desc";

/// Mission source backed by the hosted PostgREST listing endpoint.
///
/// A `near` filter is sent as a lat/lng bounding box and the exact radius is
/// checked on the returned rows. The reported `total_count` is the
/// bounding-box count, so radius pages may come back short and the page
/// count may be too high.
#[derive(Debug, Clone)]
pub struct RestMissionSource {
    client: reqwest::Client,
    base_url: String,
    table: String,
    api_key: Option<String>,
}

impl RestMissionSource {
    pub fn new(
        base_url: impl Into<String>,
        table: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            table: table.into(),
            api_key,
        })
    }

    pub fn from_config(config: &QueryConfig) -> Result<Self> {
        Self::new(
            config.missions_api_url.clone(),
            config.missions_table.clone(),
            config.missions_api_key.clone(),
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    /// `{base_url}/rest/v1/{table}`
    pub fn endpoint(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }
}

#[async_trait]
impl MissionSource for RestMissionSource {
    async fn list_missions(&self, request: &MissionRequest) -> Result<QueryResult<Mission>> {
        let params = query_params(request);
        debug!(endpoint = %self.endpoint(), ?params, "listing missions");

        let mut builder = self
            .client
            .get(self.endpoint())
            .query(&params)
            .header("Prefer", "count=exact");
        if let Some(key) = &self.api_key {
            builder = builder.header("apikey", key).bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QueryError::from_status(status.as_u16(), body));
        }

        let total = parse_total(response.headers());
        let body = response.bytes().await?;
        let mut items: Vec<Mission> = serde_json::from_slice(&body)?;
        let total_count = total.unwrap_or(request.offset + items.len() as u64);

        // The backend only filtered on the bounding box
        if let Some((lat, lng, radius_km)) = request.radius() {
            items.retain(|m| {
                m.coordinates()
                    .is_some_and(|point| geo::haversine_km((lat, lng), point) <= radius_km)
            });
        }

        Ok(QueryResult::new(items, total_count))
    }
}

// == Query Rendering ==
/// PostgREST query parameters for a request, filters first, then paging.
fn query_params(request: &MissionRequest) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];

    for predicate in &request.predicates {
        match predicate {
            Predicate::AnyOf(inner) => {
                let alternatives: Vec<String> = inner
                    .iter()
                    .flat_map(conditions)
                    .map(|(field, op, value)| format!("{field}.{op}.{}", quote(&value)))
                    .collect();
                if !alternatives.is_empty() {
                    params.push(("or".to_string(), format!("({})", alternatives.join(","))));
                }
            }
            other => params.extend(
                conditions(other)
                    .into_iter()
                    .map(|(field, op, value)| (field, format!("{op}.{value}"))),
            ),
        }
    }

    params.push(("order".to_string(), ORDER.to_string()));
    params.push(("offset".to_string(), request.offset.to_string()));
    params.push(("limit".to_string(), request.limit.to_string()));
    params
}

/// `(column, operator, value)` triples for one predicate.
fn conditions(predicate: &Predicate) -> Vec<(String, &'static str, String)> {
    match predicate {
        Predicate::ContainsIgnoreCase { field, value } => {
            vec![(field.clone(), "ilike", format!("*{}*", escape_like(value)))]
        }
        Predicate::Equals { field, value } => vec![(field.clone(), "eq", value.clone())],
        Predicate::OnOrAfter { field, date } => vec![(field.clone(), "gte", date.to_string())],
        Predicate::OnOrBefore { field, date } => vec![(field.clone(), "lte", date.to_string())],
        Predicate::AtLeast { field, value } => vec![(field.clone(), "gte", value.to_string())],
        Predicate::AtMost { field, value } => vec![(field.clone(), "lte", value.to_string())],
        Predicate::WithinRadius {
            lat,
            lng,
            radius_km,
        } => {
            let (min_lat, max_lat, min_lng, max_lng) = geo::bounding_box(*lat, *lng, *radius_km);
            vec![
                ("latitude".to_string(), "gte", min_lat.to_string()),
                ("latitude".to_string(), "lte", max_lat.to_string()),
                ("longitude".to_string(), "gte", min_lng.to_string()),
                ("longitude".to_string(), "lte", max_lng.to_string()),
            ]
        }
        Predicate::AnyOf(inner) => inner.iter().flat_map(conditions).collect(),
    }
}

/// Backslash-escapes LIKE wildcards and PostgREST's `*` so user text
/// matches literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_' | '*') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Double-quotes a value inside `or=(...)`, where `,.:()` are syntax.
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '\\' | '"') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Total from `Content-Range: 0-9/95`; `None` when absent or `*`.
fn parse_total(headers: &HeaderMap) -> Option<u64> {
    let range = headers.get(CONTENT_RANGE)?.to_str().ok()?;
    let (_, total) = range.rsplit_once('/')?;
    total.trim().parse().ok()
}
