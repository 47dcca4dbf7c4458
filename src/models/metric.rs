// Metric identity, definitions and raw data points.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of series. `CounterRate` is never stored; it names the rate-derived view of a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    Gauge,
    Counter,
    CounterRate,
}

impl MetricType {
    /// Wire/storage text (e.g. "counter").
    pub fn text(self) -> &'static str {
        match self {
            MetricType::Gauge => "gauge",
            MetricType::Counter => "counter",
            MetricType::CounterRate => "counter_rate",
        }
    }

    pub fn from_text(s: &str) -> Option<Self> {
        match s {
            "gauge" => Some(MetricType::Gauge),
            "counter" => Some(MetricType::Counter),
            "counter_rate" => Some(MetricType::CounterRate),
            _ => None,
        }
    }

    /// The stored type whose raw values feed this type.
    pub fn base(self) -> Self {
        match self {
            MetricType::CounterRate => MetricType::Counter,
            other => other,
        }
    }

    pub fn is_rate(self) -> bool {
        matches!(self, MetricType::CounterRate)
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricId {
    pub tenant_id: String,
    pub metric_type: MetricType,
    pub name: String,
}

impl MetricId {
    pub fn new(
        tenant_id: impl Into<String>,
        metric_type: MetricType,
        name: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            metric_type,
            name: name.into(),
        }
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.tenant_id, self.metric_type, self.name)
    }
}

/// One raw or rate-derived sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub timestamp: i64,
    pub value: f64,
}

impl DataPoint {
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Stored metric definition as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDefinition {
    pub tenant_id: String,
    pub id: String,
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_retention: Option<u32>,
}

impl MetricDefinition {
    pub fn metric_id(&self) -> MetricId {
        MetricId::new(self.tenant_id.clone(), self.metric_type, self.id.clone())
    }
}

/// Request body for creating a definition. `type` is optional; when present it must match the route.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMetric {
    pub id: String,
    #[serde(default, rename = "type")]
    pub metric_type: Option<MetricType>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub data_retention: Option<u32>,
}

/// Request body element for batch ingestion: `{ "id": ..., "data": [...] }`.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricData {
    pub id: String,
    #[serde(default)]
    pub data: Vec<DataPoint>,
}
