//! In-process generation API used by the integration tests

#![allow(dead_code)]

use axum::{
    Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::sleep;

pub const API_KEY: &str = "test-key";

#[derive(Clone, Default)]
struct MockState {
    hits: Arc<AtomicUsize>,
}

pub struct MockApi {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
}

impl MockApi {
    /// Requests served so far, across all routes
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Template for a route, with the fetcher placeholders left in place
    pub fn template(&self, route: &str) -> String {
        format!("{}/{}?api_key={{api_key}}", self.base_url, route)
    }
}

/// Bind to a random port and serve the mock API in the background
pub async fn start_mock_api() -> MockApi {
    let state = MockState::default();
    let hits = Arc::clone(&state.hits);

    let app = Router::new()
        .route("/api/{date}/renewables/windgen.csv", get(wind))
        .route("/api/{date}/renewables/solargen.json", get(solar))
        .route("/slow/{date}", get(slow))
        .route("/throttle/{limit}/{date}", get(throttle))
        .route("/first-day-denied/{date}", get(first_day_denied))
        .route("/json/{date}", get(json_payload))
        .route("/plain/{date}", get(plain))
        .route("/untyped/{date}", get(untyped))
        .route("/broken/{date}", get(broken_json))
        .route("/error/{date}", get(server_error))
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], 0));
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    let bound_addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Wait a bit for server to start
    sleep(Duration::from_millis(50)).await;

    MockApi {
        base_url: format!("http://{bound_addr}"),
        hits,
    }
}

fn record(state: &MockState, query: &HashMap<String, String>) -> Option<Response> {
    state.hits.fetch_add(1, Ordering::SeqCst);
    match query.get("api_key").map(String::as_str) {
        Some(API_KEY) => None,
        _ => Some((StatusCode::FORBIDDEN, "invalid api key").into_response()),
    }
}

fn csv_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], body).into_response()
}

fn json_response(body: serde_json::Value) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body.to_string()).into_response()
}

/// Daily wind CSV in the upstream layout, one row per day
pub fn wind_csv(date: &str) -> String {
    let (variable, value) = match date {
        "2023-01-01" => (729, 38.0098121304),
        _ => (846, 31.2335398111),
    };
    format!("naive_timestamp, variable, value, last_modified_utc\n{date},{variable},{value},{date}")
}

/// Daily solar JSON in the upstream layout, one record per day
pub fn solar_json(date: &str) -> serde_json::Value {
    let millis = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp_millis())
        .unwrap_or_default();
    json!([{
        "Naive_Timestamp ": millis,
        " Variable": 729,
        "value": 38.0098121304,
        "Last Modified utc": millis
    }])
}

async fn wind(
    State(state): State<MockState>,
    Path(date): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(denied) = record(&state, &query) {
        return denied;
    }
    csv_response(wind_csv(&date))
}

async fn solar(
    State(state): State<MockState>,
    Path(date): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(denied) = record(&state, &query) {
        return denied;
    }
    json_response(solar_json(&date))
}

/// Earlier days answer later: day N of January waits (10 - N) * 30ms
async fn slow(
    State(state): State<MockState>,
    Path(date): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(denied) = record(&state, &query) {
        return denied;
    }
    let day: u64 = date.rsplit('-').next().and_then(|d| d.parse().ok()).unwrap_or(0);
    sleep(Duration::from_millis(10u64.saturating_sub(day) * 30)).await;
    csv_response(format!("day\n{date}"))
}

/// 429 for the first `limit` requests on this server, then a CSV body
async fn throttle(
    State(state): State<MockState>,
    Path((limit, date)): Path<(usize, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let seen = state.hits.load(Ordering::SeqCst);
    if let Some(denied) = record(&state, &query) {
        return denied;
    }
    if seen < limit {
        return (StatusCode::TOO_MANY_REQUESTS, "slow down").into_response();
    }
    csv_response(format!("day\n{date}"))
}

/// The first of the month is refused after 50ms; every other day is always 429
async fn first_day_denied(
    State(state): State<MockState>,
    Path(date): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(denied) = record(&state, &query) {
        return denied;
    }
    if date.ends_with("-01") {
        sleep(Duration::from_millis(50)).await;
        return (StatusCode::FORBIDDEN, "not for this day").into_response();
    }
    (StatusCode::TOO_MANY_REQUESTS, "slow down").into_response()
}

async fn json_payload(
    State(state): State<MockState>,
    Path(date): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(denied) = record(&state, &query) {
        return denied;
    }
    json_response(json!({ "date": date }))
}

async fn plain(
    State(state): State<MockState>,
    Path(_date): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(denied) = record(&state, &query) {
        return denied;
    }
    ([(header::CONTENT_TYPE, "text/plain")], "hello").into_response()
}

async fn untyped(
    State(state): State<MockState>,
    Path(_date): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(denied) = record(&state, &query) {
        return denied;
    }
    // Vec<u8> bodies carry application/octet-stream; strip it
    let mut response = b"raw".to_vec().into_response();
    response.headers_mut().remove(header::CONTENT_TYPE);
    response
}

async fn broken_json(
    State(state): State<MockState>,
    Path(_date): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(denied) = record(&state, &query) {
        return denied;
    }
    ([(header::CONTENT_TYPE, "application/json")], "{not json").into_response()
}

async fn server_error(
    State(state): State<MockState>,
    Path(_date): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(denied) = record(&state, &query) {
        return denied;
    }
    (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response()
}
