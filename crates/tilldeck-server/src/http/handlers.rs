// SPDX-License-Identifier: Apache-2.0

use crate::params::{parse_sales_filter, parse_sample_limit};
use crate::{AppState, CachedBody, StoreError};
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use flate2::{write::GzEncoder, Compression};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::Ordering;
use std::time::Instant;
use tilldeck_model::{
    fallback_list, SummaryStats, FALLBACK_CATEGORIES, FALLBACK_GENDERS, FALLBACK_PAYMENT_METHODS,
    FALLBACK_REGIONS, FALLBACK_TAGS,
};
use tilldeck_query::{
    distinct_tags, distinct_values, query_sales, sample_recent, summary_stats, Facet,
};
use tracing::{info, warn};

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

pub(crate) fn make_request_id(state: &AppState) -> String {
    let id = state.request_id_seed.fetch_add(1, Ordering::Relaxed);
    format!("req-{id:016x}")
}

pub(crate) fn propagated_request_id(headers: &HeaderMap, state: &AppState) -> String {
    if let Some(raw) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    make_request_id(state)
}

pub(crate) fn with_request_id(mut response: Response, request_id: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// Stable cache key for a request: query parameters sorted by key then value.
pub(crate) fn normalize_query(params: &HashMap<String, String>) -> String {
    let mut kv: Vec<(&String, &String)> = params.iter().collect();
    kv.sort_by(|a, b| a.0.cmp(b.0).then_with(|| a.1.cmp(b.1)));
    kv.into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

pub(crate) fn if_none_match(headers: &HeaderMap) -> Option<String> {
    headers
        .get("if-none-match")
        .and_then(|v| v.to_str().ok())
        .map(std::string::ToString::to_string)
}

pub(crate) fn put_cache_headers(headers: &mut HeaderMap, ttl_secs: u64, etag: &str) {
    if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={ttl_secs}")) {
        headers.insert("cache-control", value);
    }
    if let Ok(value) = HeaderValue::from_str(etag) {
        headers.insert("etag", value);
    }
}

fn error_response(status: StatusCode, error: &str, message: String) -> Response {
    (
        status,
        Json(json!({"success": false, "error": error, "message": message})),
    )
        .into_response()
}

/// Store failures on the page endpoint have no safe default; they surface as
/// a 500 with internals only in dev mode.
fn store_failure_response(state: &AppState, err: &StoreError) -> Response {
    let message = if state.api.dev_mode {
        err.to_string()
    } else {
        "Something went wrong".to_string()
    };
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error",
        message,
    )
}

fn accepted_encoding(headers: &HeaderMap) -> Option<&'static str> {
    let accept = headers
        .get("accept-encoding")
        .and_then(|v| v.to_str().ok())?;
    if accept.contains("gzip") {
        Some("gzip")
    } else {
        None
    }
}

fn maybe_compress(
    state: &AppState,
    headers: &HeaderMap,
    bytes: Vec<u8>,
) -> (Vec<u8>, Option<&'static str>) {
    if !state.api.enable_response_compression || bytes.len() < state.api.compression_min_bytes {
        return (bytes, None);
    }
    if accepted_encoding(headers) != Some("gzip") {
        return (bytes, None);
    }
    let mut encoder = GzEncoder::new(
        Vec::with_capacity((bytes.len() / 2).max(256)),
        Compression::fast(),
    );
    if encoder.write_all(&bytes).is_err() {
        return (bytes, None);
    }
    match encoder.finish() {
        Ok(compressed) => (compressed, Some("gzip")),
        Err(_) => (bytes, None),
    }
}

/// Shared tail for cacheable JSON endpoints: conditional 304, optional gzip,
/// content-type and cache headers.
fn json_bytes_response(
    state: &AppState,
    headers: &HeaderMap,
    body: Vec<u8>,
    etag: &str,
) -> Response {
    let ttl_secs = state.api.response_cache_ttl.as_secs();
    if if_none_match(headers).as_deref() == Some(etag) {
        let mut response = StatusCode::NOT_MODIFIED.into_response();
        put_cache_headers(response.headers_mut(), ttl_secs, etag);
        return response;
    }
    let (payload, encoding) = maybe_compress(state, headers, body);
    let mut response = Response::new(Body::from(payload));
    response.headers_mut().insert(
        "content-type",
        HeaderValue::from_static("application/json"),
    );
    if let Some(encoding) = encoding {
        response
            .headers_mut()
            .insert("content-encoding", HeaderValue::from_static(encoding));
    }
    put_cache_headers(response.headers_mut(), ttl_secs, etag);
    response
}

fn facet_or_fallback(
    request_id: &str,
    facet: &str,
    result: Result<Vec<String>, StoreError>,
    fallback: &[&str],
) -> Vec<String> {
    match result {
        Ok(values) => values,
        Err(e) => {
            warn!(
                request_id = %request_id,
                facet = facet,
                error = %e,
                "facet resolver failed; serving builtin defaults"
            );
            fallback_list(fallback)
        }
    }
}

pub(crate) async fn sales_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let filter = parse_sales_filter(&params);
    let cache_key = format!("/sales?{}", normalize_query(&params));

    let cached = { state.response_cache.lock().await.get(&cache_key) };
    if let Some(hit) = cached {
        let response = json_bytes_response(&state, &headers, hit.body, &hit.etag);
        let status = response.status();
        state
            .metrics
            .observe_request("/sales", status, started.elapsed())
            .await;
        return with_request_id(response, &request_id);
    }

    info!(
        request_id = %request_id,
        route = "/sales",
        page = filter.page,
        limit = filter.limit,
        sort = filter.sort.as_str(),
        "sales query start"
    );
    let query_filter = filter.clone();
    match state
        .store
        .with_conn(move |conn| query_sales(conn, &query_filter))
        .await
    {
        Ok(page) => {
            let payload = json!({
                "success": true,
                "data": page.data,
                "totalItems": page.total_items,
                "totalPages": page.total_pages,
                "currentPage": page.current_page,
                "filters": filter,
            });
            let body = match serde_json::to_vec(&payload) {
                Ok(v) => v,
                Err(e) => {
                    let response = error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal Server Error",
                        if state.api.dev_mode {
                            e.to_string()
                        } else {
                            "Something went wrong".to_string()
                        },
                    );
                    state
                        .metrics
                        .observe_request(
                            "/sales",
                            StatusCode::INTERNAL_SERVER_ERROR,
                            started.elapsed(),
                        )
                        .await;
                    return with_request_id(response, &request_id);
                }
            };
            let etag = format!("\"{}\"", sha256_hex(&body));
            state
                .response_cache
                .lock()
                .await
                .insert(cache_key, CachedBody::new(body.clone(), etag.clone()));
            let response = json_bytes_response(&state, &headers, body, &etag);
            let status = response.status();
            state
                .metrics
                .observe_request("/sales", status, started.elapsed())
                .await;
            with_request_id(response, &request_id)
        }
        Err(e) => {
            warn!(request_id = %request_id, route = "/sales", error = %e, "sales query failed");
            let response = store_failure_response(&state, &e);
            state
                .metrics
                .observe_request(
                    "/sales",
                    StatusCode::INTERNAL_SERVER_ERROR,
                    started.elapsed(),
                )
                .await;
            with_request_id(response, &request_id)
        }
    }
}

pub(crate) async fn filters_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let cache_key = "/sales/filters".to_string();

    let cached = { state.response_cache.lock().await.get(&cache_key) };
    if let Some(hit) = cached {
        let response = json_bytes_response(&state, &headers, hit.body, &hit.etag);
        let status = response.status();
        state
            .metrics
            .observe_request("/sales/filters", status, started.elapsed())
            .await;
        return with_request_id(response, &request_id);
    }

    // Five independent read-only queries; nothing orders them, so let them
    // settle concurrently and substitute per-facet defaults afterwards.
    let (regions, genders, categories, payment_methods, tags) = tokio::join!(
        state
            .store
            .with_conn(|conn| distinct_values(conn, Facet::Region)),
        state
            .store
            .with_conn(|conn| distinct_values(conn, Facet::Gender)),
        state
            .store
            .with_conn(|conn| distinct_values(conn, Facet::Category)),
        state
            .store
            .with_conn(|conn| distinct_values(conn, Facet::PaymentMethod)),
        state.store.with_conn(distinct_tags),
    );
    let payload = json!({
        "success": true,
        "regions": facet_or_fallback(&request_id, "regions", regions, &FALLBACK_REGIONS),
        "genders": facet_or_fallback(&request_id, "genders", genders, &FALLBACK_GENDERS),
        "categories": facet_or_fallback(&request_id, "categories", categories, &FALLBACK_CATEGORIES),
        "paymentMethods": facet_or_fallback(
            &request_id,
            "paymentMethods",
            payment_methods,
            &FALLBACK_PAYMENT_METHODS
        ),
        "tags": facet_or_fallback(&request_id, "tags", tags, &FALLBACK_TAGS),
    });
    let body = serde_json::to_vec(&payload).unwrap_or_default();
    let etag = format!("\"{}\"", sha256_hex(&body));
    state
        .response_cache
        .lock()
        .await
        .insert(cache_key, CachedBody::new(body.clone(), etag.clone()));
    let response = json_bytes_response(&state, &headers, body, &etag);
    let status = response.status();
    state
        .metrics
        .observe_request("/sales/filters", status, started.elapsed())
        .await;
    with_request_id(response, &request_id)
}

pub(crate) async fn stats_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let stats = match state.store.with_conn(summary_stats).await {
        Ok(stats) => stats,
        Err(e) => {
            warn!(
                request_id = %request_id,
                route = "/sales/stats",
                error = %e,
                "summary resolver failed; serving empty stats"
            );
            SummaryStats::empty()
        }
    };
    let response = Json(json!({"success": true, "stats": stats})).into_response();
    state
        .metrics
        .observe_request("/sales/stats", StatusCode::OK, started.elapsed())
        .await;
    with_request_id(response, &request_id)
}

pub(crate) async fn sample_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let limit = parse_sample_limit(&params, &state.api);
    let rows = match state
        .store
        .with_conn(move |conn| sample_recent(conn, limit))
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            warn!(
                request_id = %request_id,
                route = "/sales/sample",
                error = %e,
                "sample query failed; serving empty sample"
            );
            Vec::new()
        }
    };
    let count = rows.len();
    let response = Json(json!({
        "success": true,
        "data": rows,
        "count": count,
        "limit": limit,
    }))
    .into_response();
    state
        .metrics
        .observe_request("/sales/sample", StatusCode::OK, started.elapsed())
        .await;
    with_request_id(response, &request_id)
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    let request_id = make_request_id(&state);
    let response = Json(json!({
        "status": "OK",
        "message": "tilldeck API is running",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp_ms": unix_millis(),
    }))
    .into_response();
    state
        .metrics
        .observe_request("/sales/health", StatusCode::OK, started.elapsed())
        .await;
    with_request_id(response, &request_id)
}

pub(crate) async fn index_handler(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    let request_id = make_request_id(&state);
    let response = Json(json!({
        "service": "tilldeck sales API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "sales": "/sales",
            "filters": "/sales/filters",
            "stats": "/sales/stats",
            "sample": "/sales/sample",
            "health": "/sales/health",
        },
    }))
    .into_response();
    state
        .metrics
        .observe_request("/", StatusCode::OK, started.elapsed())
        .await;
    with_request_id(response, &request_id)
}

pub(crate) async fn not_found_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> Response {
    let started = Instant::now();
    let request_id = make_request_id(&state);
    let response = error_response(
        StatusCode::NOT_FOUND,
        "Endpoint not found",
        format!(
            "The requested endpoint {method} {} does not exist",
            uri.path()
        ),
    );
    state
        .metrics
        .observe_request("(fallback)", StatusCode::NOT_FOUND, started.elapsed())
        .await;
    with_request_id(response, &request_id)
}

fn unix_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}
