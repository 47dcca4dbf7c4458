// Pure statistics: rate derivation and per-bucket summaries (min/avg/median/max/sum/percentiles).
// Storage access stays in sqlite.rs.

use crate::models::{DataPoint, NumericBucketPoint, Percentile};
use crate::params::Buckets;

/// Rates are expressed per minute.
pub const RATE_UNIT_MS: f64 = 60_000.0;

/// Rate-derived series from ascending counter points. A point is emitted at each later sample
/// whose value did not decrease; decreases (counter resets) and repeated timestamps are skipped.
pub fn rates(points: &[DataPoint]) -> Vec<DataPoint> {
    points
        .windows(2)
        .filter_map(|w| {
            let (prev, cur) = (w[0], w[1]);
            let dt = cur.timestamp - prev.timestamp;
            if dt <= 0 || cur.value < prev.value {
                return None;
            }
            Some(DataPoint::new(
                cur.timestamp,
                (cur.value - prev.value) * RATE_UNIT_MS / dt as f64,
            ))
        })
        .collect()
}

/// Groups points into buckets. Points outside the range are dropped.
pub fn group_by_bucket(points: &[DataPoint], buckets: &Buckets) -> Vec<Vec<f64>> {
    let mut out: Vec<Vec<f64>> = vec![Vec::new(); buckets.count()];
    for p in points {
        if let Some(i) = buckets.index_of(p.timestamp) {
            out[i].push(p.value);
        }
    }
    out
}

/// One NumericBucketPoint per bucket, ascending.
pub fn bucket_stats(
    points: &[DataPoint],
    buckets: &Buckets,
    percentiles: &[f64],
) -> Vec<NumericBucketPoint> {
    let grouped = group_by_bucket(points, buckets);
    buckets
        .iter()
        .zip(grouped)
        .map(|(b, mut values)| summarize(b.start, b.end, &mut values, percentiles))
        .collect()
}

/// Pools every series' values per bucket, then summarizes.
pub fn pooled_stats(
    series: &[Vec<DataPoint>],
    buckets: &Buckets,
    percentiles: &[f64],
) -> Vec<NumericBucketPoint> {
    let mut pooled: Vec<Vec<f64>> = vec![Vec::new(); buckets.count()];
    for points in series {
        for (i, values) in group_by_bucket(points, buckets).into_iter().enumerate() {
            pooled[i].extend(values);
        }
    }
    buckets
        .iter()
        .zip(pooled)
        .map(|(b, mut values)| summarize(b.start, b.end, &mut values, percentiles))
        .collect()
}

/// Summarizes each series per bucket, then sums the summaries across series.
pub fn stacked_stats(
    series: &[Vec<DataPoint>],
    buckets: &Buckets,
    percentiles: &[f64],
) -> Vec<NumericBucketPoint> {
    let per_series: Vec<Vec<NumericBucketPoint>> = series
        .iter()
        .map(|points| bucket_stats(points, buckets, percentiles))
        .collect();
    buckets
        .iter()
        .map(|b| {
            let column: Vec<&NumericBucketPoint> = per_series
                .iter()
                .map(|s| &s[b.index])
                .filter(|p| !p.empty)
                .collect();
            stack(b.start, b.end, &column, percentiles)
        })
        .collect()
}

fn stack(
    start: i64,
    end: i64,
    points: &[&NumericBucketPoint],
    percentiles: &[f64],
) -> NumericBucketPoint {
    if points.is_empty() {
        return NumericBucketPoint::empty(start, end);
    }
    let sum_of = |f: fn(&NumericBucketPoint) -> Option<f64>| -> Option<f64> {
        Some(points.iter().filter_map(|p| f(p)).sum())
    };
    let stacked_percentiles = percentiles
        .iter()
        .enumerate()
        .map(|(i, &q)| Percentile {
            quantile: q,
            value: points
                .iter()
                .filter_map(|p| p.percentiles.get(i).map(|pc| pc.value))
                .sum(),
        })
        .collect();
    NumericBucketPoint {
        start,
        end,
        min: sum_of(|p| p.min),
        avg: sum_of(|p| p.avg),
        median: sum_of(|p| p.median),
        max: sum_of(|p| p.max),
        sum: sum_of(|p| p.sum),
        samples: points.iter().map(|p| p.samples).sum(),
        empty: false,
        percentiles: stacked_percentiles,
    }
}

/// Summary of one bucket's values. Sorts `values` in place.
pub fn summarize(
    start: i64,
    end: i64,
    values: &mut [f64],
    percentiles: &[f64],
) -> NumericBucketPoint {
    if values.is_empty() {
        return NumericBucketPoint::empty(start, end);
    }
    values.sort_by(f64::total_cmp);
    let sum: f64 = values.iter().sum();
    NumericBucketPoint {
        start,
        end,
        min: values.first().copied(),
        avg: Some(sum / values.len() as f64),
        median: Some(quantile(values, 50.0)),
        max: values.last().copied(),
        sum: Some(sum),
        samples: values.len() as u64,
        empty: false,
        percentiles: percentiles
            .iter()
            .map(|&q| Percentile {
                quantile: q,
                value: quantile(values, q),
            })
            .collect(),
    }
}

/// Linear interpolation between closest ranks. `sorted` must be non-empty and ascending;
/// `q` is in percent and clamped to [0, 100].
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let rank = (q.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
