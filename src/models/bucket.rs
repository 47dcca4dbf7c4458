// Per-bucket statistics returned by the stats queries.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentile {
    pub quantile: f64,
    pub value: f64,
}

/// Statistical summary of one bucket. Value fields are absent when the bucket is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericBucketPoint {
    pub start: i64,
    pub end: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub median: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sum: Option<f64>,
    pub samples: u64,
    pub empty: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub percentiles: Vec<Percentile>,
}

impl NumericBucketPoint {
    pub fn empty(start: i64, end: i64) -> Self {
        Self {
            start,
            end,
            min: None,
            avg: None,
            median: None,
            max: None,
            sum: None,
            samples: 0,
            empty: true,
            percentiles: vec![],
        }
    }
}
