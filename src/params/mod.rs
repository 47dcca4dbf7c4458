// Query parameter parsing and the validated value types built from it.
// Every parser returns a typed value or a ParamError; nothing here touches the store.

mod buckets;
mod duration;
mod percentiles;
mod selector;
mod tags;
mod time_range;

pub use buckets::{Bucket, BucketConfig, Buckets};
pub use duration::BucketDuration;
pub use percentiles::Percentiles;
pub use selector::MetricSelector;
pub use tags::Tags;
pub use time_range::TimeRange;

use thiserror::Error;

/// A client-side parameter problem. Always reported as a bad request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ParamError(pub String);

impl ParamError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Parses an optional integer parameter; absent or blank is `None`.
pub fn parse_i64(name: &str, raw: Option<&str>) -> Result<Option<i64>, ParamError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ParamError(format!("{name} must be an integer, got [{s}]"))),
    }
}

/// Parses the `stacked` flag; absent means `false`.
pub fn parse_bool(name: &str, raw: Option<&str>) -> Result<bool, ParamError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(false),
        Some(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Some(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        Some(s) => Err(ParamError(format!(
            "{name} must be true or false, got [{s}]"
        ))),
    }
}
