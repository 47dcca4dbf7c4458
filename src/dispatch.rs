// Query dispatch: validate parameters in a fixed order, assemble one AggregationRequest and issue
// exactly one Metrics Store call for it.
//
// Validation order: time range, bucket config, bucket presence (multi-metric), selector
// (multi-metric). The first failure wins.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, instrument};

use crate::models::{DataPoint, MetricId, MetricType, NumericBucketPoint};
use crate::params::{
    BucketConfig, BucketDuration, Buckets, MetricSelector, ParamError, Percentiles, Tags,
    TimeRange,
};
use crate::store::{MetricsStore, StoreError};

/// Parameters shared by every data query, parsed but not yet cross-validated.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub buckets: Option<i64>,
    pub bucket_duration: Option<BucketDuration>,
    pub percentiles: Percentiles,
}

/// Multi-metric stats query: shared parameters plus the selection.
#[derive(Debug, Clone, Default)]
pub struct MultiQueryParams {
    pub query: QueryParams,
    pub metrics: Vec<String>,
    pub tags: Option<Tags>,
    pub stacked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Single(String),
    Multi(MetricSelector),
}

/// One logical query for the store. Built per request and consumed by `execute`.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationRequest {
    pub tenant_id: String,
    pub metric_type: MetricType,
    pub target: Target,
    pub time_range: TimeRange,
    pub buckets: Option<Buckets>,
    pub percentiles: Percentiles,
    pub stacked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryShape {
    RawPoints,
    BucketStats,
    RatePoints,
    RateStats,
    MultiStats,
}

impl AggregationRequest {
    pub fn shape(&self) -> QueryShape {
        match (&self.target, self.metric_type.is_rate(), self.buckets.is_some()) {
            (Target::Multi(_), _, _) => QueryShape::MultiStats,
            (Target::Single(_), false, false) => QueryShape::RawPoints,
            (Target::Single(_), false, true) => QueryShape::BucketStats,
            (Target::Single(_), true, false) => QueryShape::RatePoints,
            (Target::Single(_), true, true) => QueryShape::RateStats,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Points(Vec<DataPoint>),
    Buckets(Vec<NumericBucketPoint>),
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        match self {
            QueryResult::Points(p) => p.is_empty(),
            QueryResult::Buckets(b) => b.is_empty(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Param(#[from] ParamError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct QueryDispatcher {
    store: Arc<dyn MetricsStore>,
    default_range_ms: i64,
    max_buckets: usize,
}

impl QueryDispatcher {
    pub fn new(store: Arc<dyn MetricsStore>, default_range_ms: i64, max_buckets: usize) -> Self {
        Self {
            store,
            default_range_ms,
            max_buckets,
        }
    }

    pub fn store(&self) -> &Arc<dyn MetricsStore> {
        &self.store
    }

    /// Single-series request: raw or bucketed, plain or rate-derived (`CounterRate`).
    pub fn plan_single(
        &self,
        tenant_id: &str,
        metric_type: MetricType,
        name: &str,
        params: QueryParams,
        now_ms: i64,
    ) -> Result<AggregationRequest, ParamError> {
        let time_range =
            TimeRange::resolve(params.start, params.end, now_ms, self.default_range_ms)?;
        let bucket_config = BucketConfig::resolve(
            params.buckets,
            params.bucket_duration,
            &time_range,
            self.max_buckets,
        )?;
        Ok(AggregationRequest {
            tenant_id: tenant_id.to_string(),
            metric_type,
            target: Target::Single(name.to_string()),
            time_range,
            buckets: bucket_config.buckets().copied(),
            percentiles: params.percentiles,
            stacked: false,
        })
    }

    /// Multi-series stats request; bucketing is mandatory.
    pub fn plan_multi(
        &self,
        tenant_id: &str,
        metric_type: MetricType,
        params: MultiQueryParams,
        now_ms: i64,
    ) -> Result<AggregationRequest, ParamError> {
        let query = params.query;
        let time_range = TimeRange::resolve(query.start, query.end, now_ms, self.default_range_ms)?;
        let bucket_config = BucketConfig::resolve(
            query.buckets,
            query.bucket_duration,
            &time_range,
            self.max_buckets,
        )?;
        let Some(buckets) = bucket_config.buckets().copied() else {
            return Err(ParamError::new(
                "Either the buckets or bucketDuration parameter must be used",
            ));
        };
        let selector = MetricSelector::resolve(params.metrics, params.tags)?;
        Ok(AggregationRequest {
            tenant_id: tenant_id.to_string(),
            metric_type,
            target: Target::Multi(selector),
            time_range,
            buckets: Some(buckets),
            percentiles: query.percentiles,
            stacked: params.stacked,
        })
    }

    /// Issues the one store call matching the request's shape.
    #[instrument(skip(self, req), fields(tenant = %req.tenant_id, metric_type = %req.metric_type, shape = ?req.shape()))]
    pub async fn execute(&self, req: &AggregationRequest) -> Result<QueryResult, StoreError> {
        let (start, end) = (req.time_range.start(), req.time_range.end());
        let percentiles = req.percentiles.values();
        let result = match (&req.target, req.buckets.as_ref()) {
            (Target::Single(name), None) => {
                let id = MetricId::new(req.tenant_id.as_str(), req.metric_type, name.as_str());
                let points = if req.metric_type.is_rate() {
                    self.store.find_rate_points(&id, start, end).await?
                } else {
                    self.store.find_data_points(&id, start, end).await?
                };
                QueryResult::Points(points)
            }
            (Target::Single(name), Some(buckets)) => {
                let id = MetricId::new(req.tenant_id.as_str(), req.metric_type, name.as_str());
                QueryResult::Buckets(self.store.find_stats(&id, buckets, percentiles).await?)
            }
            (Target::Multi(selector), Some(buckets)) => QueryResult::Buckets(
                self.store
                    .find_numeric_stats(
                        &req.tenant_id,
                        req.metric_type,
                        selector,
                        buckets,
                        percentiles,
                        req.stacked,
                    )
                    .await?,
            ),
            (Target::Multi(_), None) => {
                return Err(StoreError::InvalidArgument(
                    "multi-metric statistics require buckets".into(),
                ));
            }
        };
        Ok(result)
    }

    /// `GET /{type}/{id}/data` and `GET /counters/{id}/rate`.
    pub async fn find_data(
        &self,
        tenant_id: &str,
        metric_type: MetricType,
        name: &str,
        params: QueryParams,
    ) -> Result<QueryResult, DispatchError> {
        let req = self
            .plan_single(tenant_id, metric_type, name, params, now_ms())
            .inspect_err(|e| debug!(error = %e, metric = name, "rejected single-metric query"))?;
        Ok(self.execute(&req).await?)
    }

    /// `GET /{type}/data` and `GET /counters/data/rate`.
    pub async fn find_stats(
        &self,
        tenant_id: &str,
        metric_type: MetricType,
        params: MultiQueryParams,
    ) -> Result<QueryResult, DispatchError> {
        let req = self
            .plan_multi(tenant_id, metric_type, params, now_ms())
            .inspect_err(|e| debug!(error = %e, "rejected multi-metric query"))?;
        Ok(self.execute(&req).await?)
    }
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
