// Parameter parsing and validation: time range, buckets, durations, percentiles, tags, selector

use metrics_api::params::{
    BucketConfig, BucketDuration, Buckets, MetricSelector, Percentiles, Tags, TimeRange,
    parse_bool, parse_i64,
};

const HOUR_MS: i64 = 3_600_000;
const MAX_BUCKETS: usize = 10_000;

fn range(start: i64, end: i64) -> TimeRange {
    TimeRange::resolve(Some(start), Some(end), 0, 8 * HOUR_MS).unwrap()
}

// --- TimeRange ---

#[test]
fn time_range_accepts_start_before_end() {
    for (start, end) in [(0, 1), (1000, 5000), (1, i64::MAX)] {
        let r = TimeRange::resolve(Some(start), Some(end), 0, HOUR_MS).unwrap();
        assert_eq!(r.start(), start);
        assert_eq!(r.end(), end);
    }
}

#[test]
fn time_range_rejects_start_not_before_end() {
    for (start, end) in [(1000, 1000), (5000, 1000), (1, 0)] {
        let err = TimeRange::resolve(Some(start), Some(end), 0, HOUR_MS).unwrap_err();
        assert!(!err.to_string().is_empty());
        assert_eq!(err.to_string(), "start must be before end");
    }
}

#[test]
fn time_range_rejects_negative_bounds() {
    let err = TimeRange::resolve(Some(-1), Some(10), 0, HOUR_MS).unwrap_err();
    assert!(err.to_string().contains("start"));
    let err = TimeRange::resolve(Some(0), Some(-10), 0, HOUR_MS).unwrap_err();
    assert!(err.to_string().contains("end"));
}

#[test]
fn time_range_fills_missing_bounds() {
    let now = 100 * HOUR_MS;
    let r = TimeRange::resolve(None, None, now, 8 * HOUR_MS).unwrap();
    assert_eq!(r.end(), now);
    assert_eq!(r.start(), now - 8 * HOUR_MS);

    let r = TimeRange::resolve(None, Some(10 * HOUR_MS), now, 8 * HOUR_MS).unwrap();
    assert_eq!(r.start(), 2 * HOUR_MS);

    let r = TimeRange::resolve(Some(HOUR_MS), None, now, 8 * HOUR_MS).unwrap();
    assert_eq!(r.start(), HOUR_MS);
    assert_eq!(r.end(), now);
}

#[test]
fn time_range_default_start_is_clamped_to_zero() {
    let r = TimeRange::resolve(None, Some(1000), 0, 8 * HOUR_MS).unwrap();
    assert_eq!(r.start(), 0);
    assert_eq!(r.end(), 1000);
}

#[test]
fn time_range_start_after_defaulted_end_is_invalid() {
    let err = TimeRange::resolve(Some(2000), None, 1000, HOUR_MS).unwrap_err();
    assert_eq!(err.to_string(), "start must be before end");
}

// --- Buckets ---

#[test]
fn buckets_from_count_example() {
    let b = Buckets::from_count(&range(1000, 5000), 4).unwrap();
    let got: Vec<(i64, i64)> = b.iter().map(|b| (b.start, b.end)).collect();
    assert_eq!(
        got,
        vec![(1000, 2000), (2000, 3000), (3000, 4000), (4000, 5000)]
    );
    assert_eq!(b.step(), 1000);
}

#[test]
fn buckets_from_count_partition_is_contiguous_and_complete() {
    for (start, end) in [(0, 10), (1000, 5000), (7, 1_000_003), (0, 86_400_000)] {
        let r = range(start, end);
        for count in 1..=10i64 {
            let b = match Buckets::from_count(&r, count) {
                Ok(b) => b,
                // Only tiny ranges cannot hold `count` equal buckets.
                Err(_) if r.width() < 100 => continue,
                Err(e) => panic!("[{start}, {end}] / {count}: {e}"),
            };
            let all: Vec<_> = b.iter().collect();
            assert_eq!(all.len(), count as usize);
            assert_eq!(all[0].start, start);
            assert_eq!(all.last().unwrap().end, end);
            for (i, w) in all.windows(2).enumerate() {
                assert_eq!(w[0].end, w[1].start, "gap/overlap at bucket {i}");
                assert_eq!(w[0].end - w[0].start, b.step(), "uneven bucket {i}");
            }
            for (i, bucket) in all.iter().enumerate() {
                assert_eq!(bucket.index, i);
                assert!(bucket.start < bucket.end);
                assert!(bucket.end - bucket.start <= b.step());
            }
        }
    }
}

#[test]
fn buckets_from_count_keeps_equal_widths_and_clamps_last() {
    let b = Buckets::from_count(&range(0, 10), 3).unwrap();
    let got: Vec<(i64, i64)> = b.iter().map(|b| (b.start, b.end)).collect();
    assert_eq!(got, vec![(0, 4), (4, 8), (8, 10)]);

    let b = Buckets::from_count(&range(0, 1999), 1000).unwrap();
    assert_eq!(b.step(), 2);
    let first = b.get(0).unwrap();
    let last = b.get(999).unwrap();
    assert_eq!(first.end - first.start, 2);
    assert_eq!((last.start, last.end), (1998, 1999));
}

#[test]
fn buckets_from_count_rejects_counts_that_leave_the_last_bucket_empty() {
    // ceil(10 / 6) = 2 puts the sixth bucket at [10, 10].
    let err = Buckets::from_count(&range(0, 10), 6).unwrap_err();
    assert!(err.to_string().starts_with("Number of buckets [6] exceeds"));
    assert!(Buckets::from_count(&range(0, 10), 5).is_ok());
    assert!(Buckets::from_count(&range(0, 10), 10).is_ok());
}

#[test]
fn buckets_handle_the_widest_range() {
    let r = range(0, i64::MAX);
    let b = Buckets::from_step(&r, 1_000_000_000_000_000_000).unwrap();
    assert_eq!(b.count(), 10);
    assert_eq!(b.get(9).unwrap().end, i64::MAX);
    assert_eq!(b.index_of(i64::MAX), Some(9));

    let config = BucketConfig::resolve(
        None,
        Some(BucketDuration::from_millis(1_000_000_000_000_000_000)),
        &r,
        MAX_BUCKETS,
    )
    .unwrap();
    assert_eq!(config.buckets().unwrap().count(), 10);

    let b = Buckets::from_count(&r, 7).unwrap();
    assert_eq!(b.count(), 7);
    assert_eq!(b.iter().last().unwrap().end, i64::MAX);
}

#[test]
fn buckets_from_count_rejects_non_positive_and_too_many() {
    assert!(Buckets::from_count(&range(0, 10), 0).is_err());
    assert!(Buckets::from_count(&range(0, 10), -3).is_err());
    assert!(Buckets::from_count(&range(0, 10), 11).is_err());
}

#[test]
fn buckets_from_step_clamps_last_bucket() {
    let b = Buckets::from_step(&range(0, 10), 4).unwrap();
    let got: Vec<(i64, i64)> = b.iter().map(|b| (b.start, b.end)).collect();
    assert_eq!(got, vec![(0, 4), (4, 8), (8, 10)]);
    assert_eq!(b.count(), 3);
}

#[test]
fn buckets_from_step_exact_division() {
    let b = Buckets::from_step(&range(1000, 5000), 1000).unwrap();
    assert_eq!(b.count(), 4);
    assert_eq!(b.get(3).unwrap().end, 5000);
    assert!(b.get(4).is_none());
}

#[test]
fn buckets_from_step_rejects_step_wider_than_range() {
    let err = Buckets::from_step(&range(0, 10), 11).unwrap_err();
    assert!(err.to_string().contains("exceeds"));
    assert!(Buckets::from_step(&range(0, 10), 0).is_err());
}

#[test]
fn buckets_index_of_includes_range_end() {
    let b = Buckets::from_count(&range(1000, 5000), 4).unwrap();
    assert_eq!(b.index_of(999), None);
    assert_eq!(b.index_of(1000), Some(0));
    assert_eq!(b.index_of(1999), Some(0));
    assert_eq!(b.index_of(2000), Some(1));
    assert_eq!(b.index_of(4999), Some(3));
    assert_eq!(b.index_of(5000), Some(3));
    assert_eq!(b.index_of(5001), None);

    let clamped = Buckets::from_count(&range(0, 10), 3).unwrap();
    assert_eq!(clamped.index_of(7), Some(1));
    assert_eq!(clamped.index_of(8), Some(2));
    assert_eq!(clamped.index_of(10), Some(2));
}

// --- BucketConfig ---

#[test]
fn bucket_config_empty_when_no_params() {
    let config = BucketConfig::resolve(None, None, &range(0, 10), MAX_BUCKETS).unwrap();
    assert!(config.is_empty());
    assert!(config.buckets().is_none());
}

#[test]
fn bucket_config_rejects_both_params_even_when_each_is_valid() {
    let r = range(1000, 5000);
    let err = BucketConfig::resolve(
        Some(4),
        Some(BucketDuration::from_millis(1000)),
        &r,
        MAX_BUCKETS,
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Both buckets and bucketDuration parameters are used"
    );
    let zeroes = Some(BucketDuration::from_millis(0));
    assert!(BucketConfig::resolve(Some(0), zeroes, &r, MAX_BUCKETS).is_err());
}

#[test]
fn bucket_config_resolves_from_either_param() {
    let r = range(1000, 5000);
    let by_count = BucketConfig::resolve(Some(4), None, &r, MAX_BUCKETS).unwrap();
    let by_duration =
        BucketConfig::resolve(None, Some(BucketDuration::from_millis(1000)), &r, MAX_BUCKETS)
            .unwrap();
    assert_eq!(by_count.buckets().unwrap().count(), 4);
    assert_eq!(by_duration.buckets().unwrap().count(), 4);
    assert_eq!(
        by_count.buckets().unwrap().iter().collect::<Vec<_>>(),
        by_duration.buckets().unwrap().iter().collect::<Vec<_>>()
    );
}

#[test]
fn bucket_config_rejects_invalid_single_param() {
    let r = range(1000, 5000);
    assert!(BucketConfig::resolve(Some(-1), None, &r, MAX_BUCKETS).is_err());
    let too_wide = Some(BucketDuration::from_millis(5000));
    assert!(BucketConfig::resolve(None, too_wide, &r, MAX_BUCKETS).is_err());
}

#[test]
fn bucket_config_caps_the_bucket_count() {
    let r = range(0, 2_000_000_000_000);
    let err = BucketConfig::resolve(Some(1_000_000_000_000), None, &r, MAX_BUCKETS).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Number of buckets [1000000000000] exceeds the maximum of [10000]"
    );
    let err = BucketConfig::resolve(None, Some(BucketDuration::from_millis(1)), &r, MAX_BUCKETS)
        .unwrap_err();
    assert!(err.to_string().contains("exceeds the maximum of [10000]"));

    let at_limit = BucketConfig::resolve(Some(10_000), None, &r, MAX_BUCKETS).unwrap();
    assert_eq!(at_limit.buckets().unwrap().count(), 10_000);
}

// --- BucketDuration ---

#[test]
fn bucket_duration_parses_units() {
    let cases = [
        ("250ms", 250),
        ("10s", 10_000),
        ("5mn", 300_000),
        ("1min", 60_000),
        ("2h", 7_200_000),
        ("1d", 86_400_000),
    ];
    for (raw, ms) in cases {
        let d: BucketDuration = raw.parse().unwrap();
        assert_eq!(d.as_millis(), ms, "{raw}");
    }
}

#[test]
fn bucket_duration_rejects_malformed() {
    for raw in ["10", "s", "10w", "-5s", "1.5h", "h1"] {
        assert!(raw.parse::<BucketDuration>().is_err(), "{raw}");
    }
}

#[test]
fn bucket_duration_optional_parse() {
    assert_eq!(BucketDuration::parse(None).unwrap(), None);
    assert_eq!(BucketDuration::parse(Some("  ")).unwrap(), None);
    assert_eq!(
        BucketDuration::parse(Some("1s")).unwrap(),
        Some(BucketDuration::from_millis(1000))
    );
}

// --- Percentiles ---

#[test]
fn percentiles_missing_or_empty_yield_none() {
    assert!(Percentiles::parse(None).unwrap().is_empty());
    assert!(Percentiles::parse(Some("")).unwrap().is_empty());
    assert!(Percentiles::parse(Some(" , ")).unwrap().is_empty());
}

#[test]
fn percentiles_keep_order_and_duplicates() {
    let p = Percentiles::parse(Some("99.9, 50,50")).unwrap();
    assert_eq!(p.values(), &[99.9, 50.0, 50.0]);
}

#[test]
fn percentiles_do_not_range_check() {
    let p = Percentiles::parse(Some("0,150")).unwrap();
    assert_eq!(p.values(), &[0.0, 150.0]);
}

#[test]
fn percentiles_reject_non_numeric() {
    let err = Percentiles::parse(Some("90,abc")).unwrap_err();
    assert!(err.to_string().contains("abc"));
}

// --- Tags ---

#[test]
fn tags_parse_pairs() {
    let tags = Tags::parse(Some("env:prod, host=web-.*")).unwrap().unwrap();
    assert_eq!(tags.len(), 2);
    assert_eq!(tags.as_map().get("env").map(String::as_str), Some("prod"));
    assert_eq!(tags.as_map().get("host").map(String::as_str), Some("web-.*"));
}

#[test]
fn tags_split_on_first_separator() {
    let tags = Tags::parse(Some("url:http://example")).unwrap().unwrap();
    assert_eq!(
        tags.as_map().get("url").map(String::as_str),
        Some("http://example")
    );
}

#[test]
fn tags_absent_is_none() {
    assert!(Tags::parse(None).unwrap().is_none());
    assert!(Tags::parse(Some("")).unwrap().is_none());
}

#[test]
fn tags_reject_malformed_and_duplicates() {
    assert!(Tags::parse(Some("novalue")).is_err());
    assert!(Tags::parse(Some(":x")).is_err());
    assert!(Tags::parse(Some("k:")).is_err());
    let err = Tags::parse(Some("a:1,a:2")).unwrap_err();
    assert!(err.to_string().contains("Duplicate"));
}

// --- MetricSelector ---

fn env_prod() -> Tags {
    Tags::parse(Some("env:prod")).unwrap().unwrap()
}

#[test]
fn selector_requires_exactly_one_source() {
    let err = MetricSelector::resolve(vec![], None).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Either metrics or tags parameter must be used"
    );

    let err = MetricSelector::resolve(vec!["a".into(), "b".into()], Some(env_prod())).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cannot use both the metrics and tags parameters"
    );
}

#[test]
fn selector_resolves_names_in_order() {
    let s = MetricSelector::resolve(vec!["b".into(), "a".into()], None).unwrap();
    assert_eq!(s, MetricSelector::Names(vec!["b".into(), "a".into()]));
}

#[test]
fn selector_resolves_tags() {
    let s = MetricSelector::resolve(vec![], Some(env_prod())).unwrap();
    assert_eq!(s, MetricSelector::Tags(env_prod()));
}

#[test]
fn selector_treats_blank_names_and_empty_tags_as_absent() {
    let s = MetricSelector::resolve(vec![" ".into()], Some(env_prod())).unwrap();
    assert!(matches!(s, MetricSelector::Tags(_)));
    let s = MetricSelector::resolve(vec!["a".into()], Some(Tags::default())).unwrap();
    assert!(matches!(s, MetricSelector::Names(_)));
}

// --- scalar parsers ---

#[test]
fn parse_i64_and_bool() {
    assert_eq!(parse_i64("start", None).unwrap(), None);
    assert_eq!(parse_i64("start", Some("42")).unwrap(), Some(42));
    let err = parse_i64("start", Some("x")).unwrap_err();
    assert!(err.to_string().starts_with("start must be an integer"));

    assert!(!parse_bool("stacked", None).unwrap());
    assert!(parse_bool("stacked", Some("TRUE")).unwrap());
    assert!(!parse_bool("stacked", Some("false")).unwrap());
    assert!(parse_bool("stacked", Some("yes")).is_err());
}
