// Handlers for /gauges and /counters.

use std::collections::BTreeMap;

use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{Query as MultiQuery, QueryRejection};
use tracing::debug;

use super::params::{DataQuery, TagsQuery};
use super::{AppState, Tenant, collection_path, collection_response, query_result_response};
use crate::error::ApiError;
use crate::models::{DataPoint, MetricData, MetricDefinition, MetricId, MetricType, NewMetric};
use crate::params::Tags;

type ApiResult = Result<Response, ApiError>;

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

fn data_query(q: Result<MultiQuery<DataQuery>, QueryRejection>) -> Result<DataQuery, ApiError> {
    q.map(|MultiQuery(v)| v)
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// POST /{type}
pub(super) async fn create_metric(
    Extension(metric_type): Extension<MetricType>,
    State(state): State<AppState>,
    Tenant(tenant_id): Tenant,
    payload: Result<Json<NewMetric>, JsonRejection>,
) -> ApiResult {
    let metric = body(payload)?;
    if let Some(t) = metric.metric_type
        && t != metric_type
    {
        return Err(ApiError::BadRequest(format!(
            "Metric type does not match {}",
            metric_type
        )));
    }
    if metric.id.trim().is_empty() {
        return Err(ApiError::BadRequest("Metric id must not be empty".into()));
    }
    let definition = MetricDefinition {
        tenant_id,
        id: metric.id,
        metric_type,
        tags: metric.tags,
        data_retention: metric.data_retention,
    };
    state.store().create_metric(&definition).await?;
    let location = format!("/{}/{}", collection_path(metric_type), definition.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)]).into_response())
}

/// GET /{type}?tags=
pub(super) async fn list_metrics(
    Extension(metric_type): Extension<MetricType>,
    State(state): State<AppState>,
    Tenant(tenant_id): Tenant,
    Query(q): Query<TagsQuery>,
) -> ApiResult {
    let tags = Tags::parse(q.tags.as_deref())?;
    let metrics = state
        .store()
        .find_metrics(&tenant_id, metric_type, tags.as_ref())
        .await?;
    Ok(collection_response(metrics))
}

/// GET /{type}/{id}
pub(super) async fn get_metric(
    Extension(metric_type): Extension<MetricType>,
    State(state): State<AppState>,
    Tenant(tenant_id): Tenant,
    Path(id): Path<String>,
) -> ApiResult {
    let metric_id = MetricId::new(tenant_id, metric_type, id);
    match state.store().find_metric(&metric_id).await? {
        Some(def) => Ok(Json(def).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// GET /{type}/{id}/tags
pub(super) async fn get_tags(
    Extension(metric_type): Extension<MetricType>,
    State(state): State<AppState>,
    Tenant(tenant_id): Tenant,
    Path(id): Path<String>,
) -> ApiResult {
    let metric_id = MetricId::new(tenant_id, metric_type, id);
    match state.store().get_metric_tags(&metric_id).await? {
        Some(tags) => Ok(Json(tags).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// PUT /{type}/{id}/tags
pub(super) async fn update_tags(
    Extension(metric_type): Extension<MetricType>,
    State(state): State<AppState>,
    Tenant(tenant_id): Tenant,
    Path(id): Path<String>,
    payload: Result<Json<BTreeMap<String, String>>, JsonRejection>,
) -> ApiResult {
    let tags = body(payload)?;
    let metric_id = MetricId::new(tenant_id, metric_type, id);
    state.store().add_tags(&metric_id, &tags).await?;
    Ok(StatusCode::OK.into_response())
}

/// DELETE /{type}/{id}/tags/{tags}; only the keys of `tags` are used.
pub(super) async fn delete_tags(
    Extension(metric_type): Extension<MetricType>,
    State(state): State<AppState>,
    Tenant(tenant_id): Tenant,
    Path((id, tags)): Path<(String, String)>,
) -> ApiResult {
    let tags = Tags::parse(Some(&tags))?.unwrap_or_default();
    let keys: Vec<String> = tags.keys().map(str::to_string).collect();
    let metric_id = MetricId::new(tenant_id, metric_type, id);
    state.store().delete_tags(&metric_id, &keys).await?;
    Ok(StatusCode::OK.into_response())
}

/// POST /{type}/data: batch of `{ id, data }`.
pub(super) async fn add_data(
    Extension(metric_type): Extension<MetricType>,
    State(state): State<AppState>,
    Tenant(tenant_id): Tenant,
    payload: Result<Json<Vec<MetricData>>, JsonRejection>,
) -> ApiResult {
    let batch = body(payload)?;
    for metric in batch {
        let metric_id = MetricId::new(tenant_id.as_str(), metric_type, metric.id);
        state
            .store()
            .add_data_points(&metric_id, &metric.data)
            .await?;
    }
    Ok(StatusCode::OK.into_response())
}

/// POST /{type}/{id}/data
pub(super) async fn add_points(
    Extension(metric_type): Extension<MetricType>,
    State(state): State<AppState>,
    Tenant(tenant_id): Tenant,
    Path(id): Path<String>,
    payload: Result<Json<Vec<DataPoint>>, JsonRejection>,
) -> ApiResult {
    let points = body(payload)?;
    let metric_id = MetricId::new(tenant_id, metric_type, id);
    state.store().add_data_points(&metric_id, &points).await?;
    Ok(StatusCode::OK.into_response())
}

/// GET /{type}/{id}/data: raw points or per-bucket stats.
pub(super) async fn find_data(
    Extension(metric_type): Extension<MetricType>,
    State(state): State<AppState>,
    Tenant(tenant_id): Tenant,
    Path(id): Path<String>,
    q: Result<MultiQuery<DataQuery>, QueryRejection>,
) -> ApiResult {
    let params = data_query(q)?.query_params()?;
    let result = state
        .dispatcher
        .find_data(&tenant_id, metric_type, &id, params)
        .await?;
    Ok(query_result_response(result))
}

/// GET /{type}/data: stats across metrics selected by tags or names.
pub(super) async fn find_stats(
    Extension(metric_type): Extension<MetricType>,
    State(state): State<AppState>,
    Tenant(tenant_id): Tenant,
    q: Result<MultiQuery<DataQuery>, QueryRejection>,
) -> ApiResult {
    let params = data_query(q)?.multi_query_params()?;
    let result = state
        .dispatcher
        .find_stats(&tenant_id, metric_type, params)
        .await?;
    Ok(query_result_response(result))
}

/// GET /counters/{id}/rate: rate points or per-bucket rate stats.
pub(super) async fn find_rate(
    State(state): State<AppState>,
    Tenant(tenant_id): Tenant,
    Path(id): Path<String>,
    q: Result<MultiQuery<DataQuery>, QueryRejection>,
) -> ApiResult {
    let params = data_query(q)?.query_params()?;
    debug!(metric = %id, "counter rate query");
    let result = state
        .dispatcher
        .find_data(&tenant_id, MetricType::CounterRate, &id, params)
        .await?;
    Ok(query_result_response(result))
}

/// GET /counters/data/rate
pub(super) async fn find_rate_stats(
    State(state): State<AppState>,
    Tenant(tenant_id): Tenant,
    q: Result<MultiQuery<DataQuery>, QueryRejection>,
) -> ApiResult {
    let params = data_query(q)?.multi_query_params()?;
    let result = state
        .dispatcher
        .find_stats(&tenant_id, MetricType::CounterRate, params)
        .await?;
    Ok(query_result_response(result))
}
