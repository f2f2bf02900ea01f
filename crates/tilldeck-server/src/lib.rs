#![forbid(unsafe_code)]
//! REST surface for the tilldeck sales browser: an axum router over the
//! query engine, with a bounded response cache, per-route request metrics,
//! and soft-default substitution at the handler boundary for the facet and
//! summary endpoints.

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

mod cache;
mod config;
mod http;
mod params;
mod store;

pub use cache::{CachedBody, ResponseCache};
pub use config::{validate_startup_config, ApiConfig, StoreConfig, CONFIG_SCHEMA_VERSION};
pub use params::{parse_sales_filter, parse_sample_limit};
pub use store::{SalesStore, StoreError};

pub const CRATE_NAME: &str = "tilldeck-server";

#[derive(Default)]
pub(crate) struct RequestMetrics {
    counts: Mutex<HashMap<(String, u16), u64>>,
    latency_ns: Mutex<HashMap<String, Vec<u64>>>,
}

impl RequestMetrics {
    pub(crate) async fn observe_request(&self, route: &str, status: StatusCode, latency: Duration) {
        let mut counts = self.counts.lock().await;
        *counts
            .entry((route.to_string(), status.as_u16()))
            .or_insert(0) += 1;
        drop(counts);
        let mut latency_map = self.latency_ns.lock().await;
        latency_map
            .entry(route.to_string())
            .or_default()
            .push(latency.as_nanos() as u64);
    }

}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SalesStore>,
    pub api: ApiConfig,
    pub(crate) metrics: Arc<RequestMetrics>,
    pub(crate) response_cache: Arc<Mutex<ResponseCache>>,
    pub(crate) request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<SalesStore>) -> Self {
        Self::with_config(store, ApiConfig::default())
    }

    #[must_use]
    pub fn with_config(store: Arc<SalesStore>, api: ApiConfig) -> Self {
        Self {
            store,
            response_cache: Arc::new(Mutex::new(ResponseCache::new(
                api.response_cache_capacity,
                api.response_cache_ttl,
            ))),
            metrics: Arc::new(RequestMetrics::default()),
            request_id_seed: Arc::new(AtomicU64::new(1)),
            api,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(http::handlers::index_handler))
        .route("/sales", get(http::handlers::sales_handler))
        .route("/sales/filters", get(http::handlers::filters_handler))
        .route("/sales/stats", get(http::handlers::stats_handler))
        .route("/sales/sample", get(http::handlers::sample_handler))
        .route("/sales/health", get(http::handlers::health_handler))
        .fallback(http::handlers::not_found_handler)
        .with_state(state)
}
