// Raw query strings → typed QueryParams. Every field is read as a string so malformed values
// produce our own error payload instead of an extractor rejection.

use serde::Deserialize;

use crate::dispatch::{MultiQueryParams, QueryParams};
use crate::params::{self, BucketDuration, ParamError, Percentiles, Tags};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DataQuery {
    start: Option<String>,
    end: Option<String>,
    buckets: Option<String>,
    bucket_duration: Option<String>,
    percentiles: Option<String>,
    tags: Option<String>,
    #[serde(default)]
    metrics: Vec<String>,
    stacked: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct TagsQuery {
    pub(super) tags: Option<String>,
}

impl DataQuery {
    pub(super) fn query_params(&self) -> Result<QueryParams, ParamError> {
        Ok(QueryParams {
            start: params::parse_i64("start", self.start.as_deref())?,
            end: params::parse_i64("end", self.end.as_deref())?,
            buckets: params::parse_i64("buckets", self.buckets.as_deref())?,
            bucket_duration: BucketDuration::parse(self.bucket_duration.as_deref())?,
            percentiles: Percentiles::parse(self.percentiles.as_deref())?,
        })
    }

    pub(super) fn multi_query_params(self) -> Result<MultiQueryParams, ParamError> {
        let query = self.query_params()?;
        Ok(MultiQueryParams {
            query,
            tags: Tags::parse(self.tags.as_deref())?,
            stacked: params::parse_bool("stacked", self.stacked.as_deref())?,
            metrics: self.metrics,
        })
    }
}
