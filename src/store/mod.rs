// Metrics Store seam: the dispatcher and handlers only see this trait.
// SqliteStore is the bundled implementation; tests substitute their own.

mod blob;
pub mod filter;
mod sqlite;
pub mod stats;

pub use sqlite::SqliteStore;

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{DataPoint, MetricDefinition, MetricId, MetricType, NumericBucketPoint};
use crate::params::{Buckets, MetricSelector, Tags};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A definition with the same identity but different attributes exists.
    #[error("A metric with name [{}] already exists", .0.name)]
    AlreadyExists(MetricId),
    /// Malformed tag filter pattern.
    #[error("{0}")]
    InvalidPattern(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("codec error: {0}")]
    Codec(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persists definitions and data points and computes rates and bucket statistics.
/// Every query returns its collection ordered ascending by time.
#[async_trait]
pub trait MetricsStore: Send + Sync {
    async fn create_metric(&self, metric: &MetricDefinition) -> StoreResult<()>;

    async fn find_metric(&self, id: &MetricId) -> StoreResult<Option<MetricDefinition>>;

    /// Definitions of one type, optionally filtered by tag patterns.
    async fn find_metrics(
        &self,
        tenant_id: &str,
        metric_type: MetricType,
        tags: Option<&Tags>,
    ) -> StoreResult<Vec<MetricDefinition>>;

    async fn get_metric_tags(&self, id: &MetricId) -> StoreResult<Option<BTreeMap<String, String>>>;

    async fn add_tags(&self, id: &MetricId, tags: &BTreeMap<String, String>) -> StoreResult<()>;

    async fn delete_tags(&self, id: &MetricId, keys: &[String]) -> StoreResult<()>;

    async fn add_data_points(&self, id: &MetricId, points: &[DataPoint]) -> StoreResult<()>;

    /// Raw points with `start <= timestamp <= end`.
    async fn find_data_points(&self, id: &MetricId, start: i64, end: i64)
    -> StoreResult<Vec<DataPoint>>;

    /// Rate-derived points of a counter over `[start, end]`.
    async fn find_rate_points(&self, id: &MetricId, start: i64, end: i64)
    -> StoreResult<Vec<DataPoint>>;

    /// Per-bucket statistics of one series; `id.metric_type` may be `CounterRate`.
    async fn find_stats(
        &self,
        id: &MetricId,
        buckets: &Buckets,
        percentiles: &[f64],
    ) -> StoreResult<Vec<NumericBucketPoint>>;

    /// Per-bucket statistics across the selected series of `metric_type`.
    async fn find_numeric_stats(
        &self,
        tenant_id: &str,
        metric_type: MetricType,
        selector: &MetricSelector,
        buckets: &Buckets,
        percentiles: &[f64],
        stacked: bool,
    ) -> StoreResult<Vec<NumericBucketPoint>>;

    /// Deletes points older than each metric's retention. Returns rows removed.
    async fn prune_expired(&self, now_ms: i64, default_retention_days: u32) -> StoreResult<u64>;

    async fn vacuum(&self) -> StoreResult<()>;
}
