// Bucketing: partition a TimeRange into contiguous, equal-width buckets.

use super::{BucketDuration, ParamError, TimeRange};

/// One bucket. `end` is exclusive except for the last bucket, which closes on the range end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub index: usize,
    pub start: i64,
    pub end: i64,
}

/// Partition of `[start, end]` into `count` buckets of `step` millis; the last one is
/// clamped to `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Buckets {
    start: i64,
    end: i64,
    step: i64,
    count: usize,
}

impl Buckets {
    /// `count` buckets of `ceil(width / count)` millis; the last one is clamped to `end`.
    /// Rejected when the last bucket would start at or after `end`.
    pub fn from_count(range: &TimeRange, count: i64) -> Result<Self, ParamError> {
        if count <= 0 {
            return Err(ParamError(format!(
                "buckets must be a positive integer, got {count}"
            )));
        }
        let width = range.width();
        let too_many = || {
            ParamError(format!(
                "Number of buckets [{count}] exceeds the time range width [{width}ms]"
            ))
        };
        if count > width {
            return Err(too_many());
        }
        let step = ceil_div(width, count);
        match (count - 1).checked_mul(step) {
            Some(last_offset) if last_offset < width => {}
            _ => return Err(too_many()),
        }
        Ok(Self {
            start: range.start(),
            end: range.end(),
            step,
            count: count as usize,
        })
    }

    /// Buckets of `step` millis; `count = ceil(width / step)` and the last bucket is clamped.
    pub fn from_step(range: &TimeRange, step: i64) -> Result<Self, ParamError> {
        if step <= 0 {
            return Err(ParamError(format!(
                "bucketDuration must be positive, got {step}ms"
            )));
        }
        let width = range.width();
        if step > width {
            return Err(ParamError(format!(
                "bucketDuration [{step}ms] exceeds the time range width [{width}ms]"
            )));
        }
        Ok(Self {
            start: range.start(),
            end: range.end(),
            step,
            count: ceil_div(width, step) as usize,
        })
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn step(&self) -> i64 {
        self.step
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn get(&self, index: usize) -> Option<Bucket> {
        if index >= self.count {
            return None;
        }
        let start = self.start + self.step * index as i64;
        let end = if index + 1 == self.count {
            self.end
        } else {
            start.saturating_add(self.step).min(self.end)
        };
        Some(Bucket { index, start, end })
    }

    pub fn iter(&self) -> impl Iterator<Item = Bucket> + '_ {
        (0..self.count).filter_map(|i| self.get(i))
    }

    /// Bucket index for a timestamp; `None` outside `[start, end]`.
    pub fn index_of(&self, ts: i64) -> Option<usize> {
        if ts < self.start || ts > self.end {
            return None;
        }
        let idx = ((ts - self.start) / self.step) as usize;
        Some(idx.min(self.count - 1))
    }
}

/// Bucketing request resolved against a TimeRange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketConfig {
    /// Neither `buckets` nor `bucketDuration` given: raw retrieval.
    Empty,
    Resolved(Buckets),
}

impl BucketConfig {
    /// `max_buckets` caps the resolved count.
    pub fn resolve(
        count: Option<i64>,
        duration: Option<BucketDuration>,
        range: &TimeRange,
        max_buckets: usize,
    ) -> Result<Self, ParamError> {
        let buckets = match (count, duration) {
            (None, None) => return Ok(BucketConfig::Empty),
            (Some(_), Some(_)) => {
                return Err(ParamError::new(
                    "Both buckets and bucketDuration parameters are used",
                ));
            }
            (Some(n), None) => Buckets::from_count(range, n)?,
            (None, Some(d)) => Buckets::from_step(range, d.as_millis())?,
        };
        if buckets.count() > max_buckets {
            return Err(ParamError(format!(
                "Number of buckets [{}] exceeds the maximum of [{max_buckets}]",
                buckets.count()
            )));
        }
        Ok(BucketConfig::Resolved(buckets))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, BucketConfig::Empty)
    }

    pub fn buckets(&self) -> Option<&Buckets> {
        match self {
            BucketConfig::Empty => None,
            BucketConfig::Resolved(b) => Some(b),
        }
    }
}

/// `ceil(a / b)` for positive operands, without the `a + b - 1` overflow.
fn ceil_div(a: i64, b: i64) -> i64 {
    a / b + i64::from(a % b != 0)
}
