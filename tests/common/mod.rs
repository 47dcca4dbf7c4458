// Shared test helpers: a recording MetricsStore and a test config.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use metrics_api::config::AppConfig;
use metrics_api::models::{DataPoint, MetricDefinition, MetricId, MetricType, NumericBucketPoint};
use metrics_api::params::{Buckets, MetricSelector, Tags};
use metrics_api::store::{MetricsStore, StoreError, StoreResult};

pub const TEST_CONFIG: &str = r#"
[server]
port = 8080
host = "127.0.0.1"

[database]
path = "data/test.db"
max_pool_size = 2

[retention]
interval_secs = 60
vacuum_interval_secs = 3600
"#;

pub fn test_app_config() -> AppConfig {
    AppConfig::load_from_str(TEST_CONFIG).unwrap()
}

/// One store call as seen by the recording store.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    DataPoints {
        id: MetricId,
        start: i64,
        end: i64,
    },
    RatePoints {
        id: MetricId,
        start: i64,
        end: i64,
    },
    Stats {
        id: MetricId,
        buckets: usize,
        percentiles: Vec<f64>,
    },
    NumericStats {
        tenant_id: String,
        metric_type: MetricType,
        selector: MetricSelector,
        buckets: usize,
        percentiles: Vec<f64>,
        stacked: bool,
    },
}

/// Answers queries with canned points (or a failure) and records each call.
#[derive(Default)]
pub struct RecordingStore {
    pub calls: Mutex<Vec<Call>>,
    pub points: Vec<DataPoint>,
    pub fail: bool,
}

impl RecordingStore {
    pub fn with_points(points: Vec<DataPoint>) -> Self {
        Self {
            points,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> StoreResult<()> {
        self.calls.lock().unwrap().push(call);
        if self.fail {
            return Err(StoreError::Codec("store unavailable".into()));
        }
        Ok(())
    }

    fn empty_buckets(buckets: &Buckets) -> Vec<NumericBucketPoint> {
        buckets
            .iter()
            .map(|b| NumericBucketPoint::empty(b.start, b.end))
            .collect()
    }
}

#[async_trait]
impl MetricsStore for RecordingStore {
    async fn create_metric(&self, _metric: &MetricDefinition) -> StoreResult<()> {
        Ok(())
    }

    async fn find_metric(&self, _id: &MetricId) -> StoreResult<Option<MetricDefinition>> {
        Ok(None)
    }

    async fn find_metrics(
        &self,
        _tenant_id: &str,
        _metric_type: MetricType,
        _tags: Option<&Tags>,
    ) -> StoreResult<Vec<MetricDefinition>> {
        Ok(vec![])
    }

    async fn get_metric_tags(
        &self,
        _id: &MetricId,
    ) -> StoreResult<Option<BTreeMap<String, String>>> {
        Ok(None)
    }

    async fn add_tags(&self, _id: &MetricId, _tags: &BTreeMap<String, String>) -> StoreResult<()> {
        Ok(())
    }

    async fn delete_tags(&self, _id: &MetricId, _keys: &[String]) -> StoreResult<()> {
        Ok(())
    }

    async fn add_data_points(&self, _id: &MetricId, _points: &[DataPoint]) -> StoreResult<()> {
        Ok(())
    }

    async fn find_data_points(
        &self,
        id: &MetricId,
        start: i64,
        end: i64,
    ) -> StoreResult<Vec<DataPoint>> {
        self.record(Call::DataPoints {
            id: id.clone(),
            start,
            end,
        })?;
        Ok(self.points.clone())
    }

    async fn find_rate_points(
        &self,
        id: &MetricId,
        start: i64,
        end: i64,
    ) -> StoreResult<Vec<DataPoint>> {
        self.record(Call::RatePoints {
            id: id.clone(),
            start,
            end,
        })?;
        Ok(self.points.clone())
    }

    async fn find_stats(
        &self,
        id: &MetricId,
        buckets: &Buckets,
        percentiles: &[f64],
    ) -> StoreResult<Vec<NumericBucketPoint>> {
        self.record(Call::Stats {
            id: id.clone(),
            buckets: buckets.count(),
            percentiles: percentiles.to_vec(),
        })?;
        Ok(Self::empty_buckets(buckets))
    }

    async fn find_numeric_stats(
        &self,
        tenant_id: &str,
        metric_type: MetricType,
        selector: &MetricSelector,
        buckets: &Buckets,
        percentiles: &[f64],
        stacked: bool,
    ) -> StoreResult<Vec<NumericBucketPoint>> {
        self.record(Call::NumericStats {
            tenant_id: tenant_id.to_string(),
            metric_type,
            selector: selector.clone(),
            buckets: buckets.count(),
            percentiles: percentiles.to_vec(),
            stacked,
        })?;
        Ok(Self::empty_buckets(buckets))
    }

    async fn prune_expired(&self, _now_ms: i64, _default_retention_days: u32) -> StoreResult<u64> {
        Ok(0)
    }

    async fn vacuum(&self) -> StoreResult<()> {
        Ok(())
    }
}
