// HTTP routes: /gauges and /counters share handlers; the metric type rides along as an Extension.

mod http;
mod metrics;
mod params;

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::dispatch::{QueryDispatcher, QueryResult};
use crate::error::ApiError;
use crate::models::MetricType;
use crate::store::MetricsStore;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) dispatcher: Arc<QueryDispatcher>,
    pub(crate) tenant_header: Arc<str>,
}

impl AppState {
    pub(crate) fn store(&self) -> &Arc<dyn MetricsStore> {
        self.dispatcher.store()
    }
}

pub fn app(store: Arc<dyn MetricsStore>, config: &AppConfig) -> Router {
    let dispatcher = Arc::new(QueryDispatcher::new(
        store,
        config.query.default_range_ms(),
        config.query.max_buckets,
    ));
    let state = AppState {
        dispatcher,
        tenant_header: Arc::from(config.server.tenant_header.as_str()),
    };
    Router::new()
        .route("/status", get(http::status_handler)) // GET /status
        .nest("/gauges", typed_routes(MetricType::Gauge))
        .nest(
            "/counters",
            typed_routes(MetricType::Counter).merge(counter_rate_routes()),
        )
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

/// Definition, tag, ingestion and query routes common to every stored type.
fn typed_routes(metric_type: MetricType) -> Router<AppState> {
    Router::new()
        .route("/", post(metrics::create_metric).get(metrics::list_metrics))
        .route("/data", post(metrics::add_data).get(metrics::find_stats))
        .route("/{id}", get(metrics::get_metric))
        .route("/{id}/tags", get(metrics::get_tags).put(metrics::update_tags))
        .route("/{id}/tags/{tags}", axum::routing::delete(metrics::delete_tags))
        .route(
            "/{id}/data",
            post(metrics::add_points).get(metrics::find_data),
        )
        .layer(Extension(metric_type))
}

fn counter_rate_routes() -> Router<AppState> {
    Router::new()
        .route("/data/rate", get(metrics::find_rate_stats))
        .route("/{id}/rate", get(metrics::find_rate))
}

/// Path segment for a stored type (used in Location headers).
pub(crate) fn collection_path(metric_type: MetricType) -> &'static str {
    match metric_type {
        MetricType::Gauge => "gauges",
        MetricType::Counter | MetricType::CounterRate => "counters",
    }
}

/// Tenant id taken from the configured tenant header.
pub(crate) struct Tenant(pub(crate) String);

impl FromRequestParts<AppState> for Tenant {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = state.tenant_header.as_ref();
        parts
            .headers
            .get(header)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| Tenant(v.to_string()))
            .ok_or_else(|| {
                ApiError::BadRequest(format!(
                    "Tenant is not specified. Use the '{header}' header."
                ))
            })
    }
}

/// 204 for an empty collection, otherwise 200 with the JSON array.
pub(crate) fn collection_response<T: Serialize>(items: Vec<T>) -> Response {
    if items.is_empty() {
        StatusCode::NO_CONTENT.into_response()
    } else {
        Json(items).into_response()
    }
}

pub(crate) fn query_result_response(result: QueryResult) -> Response {
    match result {
        QueryResult::Points(points) => collection_response(points),
        QueryResult::Buckets(buckets) => collection_response(buckets),
    }
}
