//! Integration Tests for the REST Mission Source
//!
//! Runs `RestMissionSource` against a fake PostgREST listing endpoint served
//! by axum on an ephemeral port.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::{TimeZone, Utc};
use mission_query::{
    filters::MissionRequest, FilterSet, Mission, MissionSource, PageRequest, QueryError,
    RestMissionSource,
};

// == Fake Endpoint ==

#[derive(Clone, Default)]
struct Recorded {
    params: Arc<Mutex<Vec<Vec<(String, String)>>>>,
    headers: Arc<Mutex<Vec<HeaderMap>>>,
}

impl Recorded {
    fn last_params(&self) -> Vec<(String, String)> {
        self.params.lock().unwrap().last().cloned().unwrap_or_default()
    }

    fn last_headers(&self) -> HeaderMap {
        self.headers.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

fn missions() -> Vec<Mission> {
    let created_at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();

    let mut lyon = Mission::new("m1", "Maraude du soir", created_at);
    lyon.location = "Lyon".to_string();
    lyon.latitude = Some(45.764);
    lyon.longitude = Some(4.8357);

    let mut paris = Mission::new("m2", "Collecte de vêtements", created_at);
    paris.location = "Paris".to_string();
    paris.latitude = Some(48.8566);
    paris.longitude = Some(2.3522);

    vec![lyon, paris]
}

async fn list_missions(
    State(recorded): State<Recorded>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    recorded.params.lock().unwrap().push(params);
    recorded.headers.lock().unwrap().push(headers);

    (
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CONTENT_RANGE, "0-1/42"),
        ],
        serde_json::to_string(&missions()).unwrap(),
    )
}

async fn without_count() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        serde_json::to_string(&missions()).unwrap(),
    )
}

async fn unavailable() -> impl IntoResponse {
    (StatusCode::SERVICE_UNAVAILABLE, "maintenance")
}

async fn bad_request() -> impl IntoResponse {
    (StatusCode::BAD_REQUEST, r#"{"message":"failed to parse filter"}"#)
}

async fn garbled() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], "[{\"id\": ")
}

async fn spawn_server(recorded: Recorded) -> String {
    let app = Router::new()
        .route("/rest/v1/missions", get(list_missions))
        .route("/rest/v1/uncounted", get(without_count))
        .route("/rest/v1/down", get(unavailable))
        .route("/rest/v1/bad", get(bad_request))
        .route("/rest/v1/garbled", get(garbled))
        .with_state(recorded);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

fn source(base_url: &str, table: &str, api_key: Option<&str>) -> RestMissionSource {
    RestMissionSource::new(
        base_url,
        table,
        api_key.map(str::to_string),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn request(filters: FilterSet, page: u32) -> MissionRequest {
    MissionRequest::from_filters(&filters, PageRequest::new(page, 10)).unwrap()
}

fn has(params: &[(String, String)], key: &str, value: &str) -> bool {
    params.iter().any(|(k, v)| k == key && v == value)
}

// == Listing ==

#[tokio::test]
async fn test_lists_missions_with_total_count() {
    let recorded = Recorded::default();
    let base_url = spawn_server(recorded.clone()).await;

    let result = source(&base_url, "missions", None)
        .list_missions(&request(FilterSet::new(), 1))
        .await
        .unwrap();

    assert_eq!(result.total_count, 42);
    assert_eq!(result.items, missions());
}

#[tokio::test]
async fn test_filters_rendered_as_postgrest_params() {
    let recorded = Recorded::default();
    let base_url = spawn_server(recorded.clone()).await;

    source(&base_url, "missions", None)
        .list_missions(&request(
            FilterSet::new()
                .with_location("Lyon")
                .with_search("maraude")
                .with_engagement_level("ponctuel"),
            2,
        ))
        .await
        .unwrap();

    let params = recorded.last_params();
    assert!(has(&params, "select", "*"));
    assert!(has(&params, "location", "ilike.*Lyon*"));
    assert!(has(&params, "engagement_level", "eq.ponctuel"));
    assert!(has(
        &params,
        "or",
        r#"(title.ilike."*maraude*",description.ilike."*maraude*")"#
    ));
    assert!(has(&params, "order", "created_at.desc"));
    assert!(has(&params, "offset", "10"));
    assert!(has(&params, "limit", "10"));
}

#[tokio::test]
async fn test_sends_count_and_auth_headers() {
    let recorded = Recorded::default();
    let base_url = spawn_server(recorded.clone()).await;

    source(&base_url, "missions", Some("anon-key"))
        .list_missions(&request(FilterSet::new(), 1))
        .await
        .unwrap();

    let headers = recorded.last_headers();
    assert_eq!(headers.get("prefer").unwrap(), "count=exact");
    assert_eq!(headers.get("apikey").unwrap(), "anon-key");
    assert_eq!(headers.get("authorization").unwrap(), "Bearer anon-key");
}

#[tokio::test]
async fn test_no_auth_headers_without_key() {
    let recorded = Recorded::default();
    let base_url = spawn_server(recorded.clone()).await;

    source(&base_url, "missions", None)
        .list_missions(&request(FilterSet::new(), 1))
        .await
        .unwrap();

    let headers = recorded.last_headers();
    assert!(headers.get("apikey").is_none());
    assert!(headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_radius_post_filters_rows() {
    let recorded = Recorded::default();
    let base_url = spawn_server(recorded.clone()).await;

    let result = source(&base_url, "missions", None)
        .list_missions(&request(FilterSet::new().near(45.75, 4.85, 10.0), 1))
        .await
        .unwrap();

    assert_eq!(result.items.len(), 1);
    assert_eq!(result.items[0].id, "m1");
    // Total is the backend's bounding-box count, not the post-filtered rows
    assert_eq!(result.total_count, 42);

    let params = recorded.last_params();
    assert_eq!(params.iter().filter(|(k, _)| k == "latitude").count(), 2);
    assert_eq!(params.iter().filter(|(k, _)| k == "longitude").count(), 2);
}

#[tokio::test]
async fn test_missing_content_range_falls_back_to_rows() {
    let base_url = spawn_server(Recorded::default()).await;

    let result = source(&base_url, "uncounted", None)
        .list_missions(&request(FilterSet::new(), 3))
        .await
        .unwrap();

    assert_eq!(result.total_count, 22);
}

// == Failures ==

#[tokio::test]
async fn test_unavailable_is_transient() {
    let base_url = spawn_server(Recorded::default()).await;

    let err = source(&base_url, "down", None)
        .list_missions(&request(FilterSet::new(), 1))
        .await
        .unwrap_err();

    assert_eq!(err, QueryError::Unavailable(503));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_bad_request_is_rejected() {
    let base_url = spawn_server(Recorded::default()).await;

    let err = source(&base_url, "bad", None)
        .list_missions(&request(FilterSet::new(), 1))
        .await
        .unwrap_err();

    match &err {
        QueryError::Rejected { status, message } => {
            assert_eq!(*status, 400);
            assert!(message.contains("failed to parse filter"));
        }
        other => panic!("expected Rejected, got {:?}", other),
    }
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_unknown_table_is_not_found() {
    let base_url = spawn_server(Recorded::default()).await;

    let err = source(&base_url, "nope", None)
        .list_missions(&request(FilterSet::new(), 1))
        .await
        .unwrap_err();

    assert!(matches!(err, QueryError::NotFound(_)));
}

#[tokio::test]
async fn test_garbled_body_is_decode_error() {
    let base_url = spawn_server(Recorded::default()).await;

    let err = source(&base_url, "garbled", None)
        .list_missions(&request(FilterSet::new(), 1))
        .await
        .unwrap_err();

    assert!(matches!(err, QueryError::Decode(_)));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_connection_refused_is_transient() {
    // Bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = source(&format!("http://{}", addr), "missions", None)
        .list_missions(&request(FilterSet::new(), 1))
        .await
        .unwrap_err();

    assert!(matches!(err, QueryError::Network(_)), "got {:?}", err);
    assert!(err.is_transient());
}
