// Domain models: metric identity, definitions, data points, bucket statistics.

mod bucket;
mod metric;

pub use bucket::{NumericBucketPoint, Percentile};
pub use metric::{DataPoint, MetricData, MetricDefinition, MetricId, MetricType, NewMetric};
