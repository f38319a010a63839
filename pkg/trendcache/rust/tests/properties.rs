// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Property tests for the store, the gap planner, the downsampler and the
//! nearest-point lookup.

use latency_trendcache::lttb::downsample;
use latency_trendcache::nearest::NearestResolver;
use latency_trendcache::{align_hosts, GapConfig, PointStore, RetentionPolicy, SeriesPoint};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

const GAPS: GapConfig = GapConfig {
    sampling_interval_ms: 60_000,
    gap_factor: 3,
    buffer_ms: 6_000,
};

proptest! {
    #[test]
    fn prop_planned_fetches_stay_inside_window(
        cached in prop::collection::btree_set(0i64..12_000_000, 0..40),
        start in 0i64..12_000_000,
        len in 1i64..3_000_000,
    ) {
        let end = start + len;
        let points: Vec<SeriesPoint> = cached.iter().map(|&t| SeriesPoint::new(t).with_avg(1.0)).collect();

        for gap in GAPS.plan(&points, start, end) {
            prop_assert!(start <= gap.start && gap.start < gap.end && gap.end <= end);
        }
    }

    #[test]
    fn prop_uncovered_span_in_window_is_fetched(
        cached in prop::collection::btree_set(0i64..12_000_000, 0..40),
        start in 0i64..12_000_000,
        len in 1i64..3_000_000,
    ) {
        let end = start + len;
        let points: Vec<SeriesPoint> = cached.iter().map(|&t| SeriesPoint::new(t).with_avg(1.0)).collect();
        let plan = GAPS.plan(&points, start, end);

        let threshold = GAPS.sampling_interval_ms * GAPS.gap_factor;
        let mut edges = vec![i64::MIN];
        edges.extend(cached.iter().copied());
        edges.push(i64::MAX);
        for pair in edges.windows(2) {
            let uncovered = pair[1].min(end) - pair[0].max(start);
            if uncovered > threshold + 2 * GAPS.buffer_ms {
                prop_assert!(!plan.is_empty());
            }
        }
    }

    #[test]
    fn prop_store_is_strictly_increasing_and_unique(
        inserts in prop::collection::vec((1i64..5_000, -1_000.0f64..1_000.0), 0..300)
    ) {
        let mut store = PointStore::default();
        for &(ts, v) in &inserts {
            store.add_point("h", SeriesPoint::new(ts).with_avg(v));
        }

        let points = store.points("h");
        prop_assert!(points.windows(2).all(|w| w[0].ts < w[1].ts));

        let distinct: BTreeSet<i64> = inserts.iter().map(|&(ts, _)| ts).collect();
        prop_assert_eq!(points.len(), distinct.len());

        // Last write wins for each timestamp.
        let mut latest = BTreeMap::new();
        for &(ts, v) in &inserts {
            latest.insert(ts, v);
        }
        for p in points {
            prop_assert_eq!(p.avg, latest.get(&p.ts).copied());
        }
    }

    #[test]
    fn prop_merge_keeps_points_outside_fetched_set(
        existing in prop::collection::btree_set(1i64..10_000, 0..100),
        fetched in prop::collection::btree_set(1i64..10_000, 0..100),
    ) {
        let mut store = PointStore::default();
        for &ts in &existing {
            store.add_point("h", SeriesPoint::new(ts).with_avg(1.0));
        }
        store.merge_history(
            "h",
            fetched.iter().map(|&ts| SeriesPoint::new(ts).with_avg(2.0)).collect(),
        );

        let stored: BTreeMap<i64, Option<f64>> =
            store.points("h").iter().map(|p| (p.ts, p.avg)).collect();
        for ts in &existing {
            prop_assert!(stored.contains_key(ts));
        }
        for ts in &fetched {
            prop_assert_eq!(stored.get(ts).copied().flatten(), Some(2.0));
        }
        prop_assert_eq!(stored.len(), existing.union(&fetched).count());
    }

    #[test]
    fn prop_eviction_never_removes_points_inside_window(
        ts in prop::collection::btree_set(1i64..1_000_000, 1..200),
        window_ms in 1i64..500_000,
        now in 0i64..1_500_000,
        max_points in prop::option::of(1usize..100),
        buffer_percent in 0u32..50,
    ) {
        let mut store = PointStore::new(RetentionPolicy { window_ms, max_points, buffer_percent });
        for &t in &ts {
            store.add_point("h", SeriesPoint::new(t).with_avg(1.0));
        }
        store.evict("h", now);

        let cutoff = now - window_ms;
        let kept: BTreeSet<i64> = store.points("h").iter().map(|p| p.ts).collect();
        for t in ts.iter().filter(|&&t| t >= cutoff) {
            prop_assert!(kept.contains(t));
        }
    }

    #[test]
    fn prop_lttb_length_and_endpoints(
        values in prop::collection::vec(-1_000.0f64..1_000.0, 3..2_000),
        threshold in 3usize..500,
    ) {
        let data: Vec<(i64, f64)> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| (i as i64 * 1_000, v))
            .collect();
        let out = downsample(&data, threshold, |p| (p.0 as f64, p.1));

        prop_assert_eq!(out.len(), data.len().min(threshold));
        prop_assert_eq!(out.first(), data.first());
        prop_assert_eq!(out.last(), data.last());
        prop_assert!(out.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn prop_nearest_within_half_interval(
        n in 1usize..500,
        interval in 1i64..120_000,
        offset in 0f64..1.0,
    ) {
        let ts: Vec<i64> = (0..n as i64).map(|i| 1_000 + i * interval).collect();
        let last = ts[n - 1];
        let target = 1_000 + ((last - 1_000) as f64 * offset) as i64;

        let resolved = NearestResolver::default().resolve_ts(&ts, target).unwrap();
        prop_assert!((resolved.ts - target).abs() * 2 <= interval);
    }

    #[test]
    fn prop_alignment_rows_match_union(
        a in prop::collection::btree_set(0i64..1_000, 0..50),
        b in prop::collection::btree_set(0i64..1_000, 0..50),
    ) {
        let mut store = PointStore::default();
        for &t in &a {
            store.add_point("a", SeriesPoint::new(t).with_avg(1.0));
        }
        for &t in &b {
            store.add_point("b", SeriesPoint::new(t).with_avg(2.0));
        }

        let rows = align_hosts(&store, &["a", "b"], 0, i64::MAX);
        let union: Vec<i64> = a.union(&b).copied().collect();
        prop_assert_eq!(rows.iter().map(|r| r.ts).collect::<Vec<_>>(), union);
        for row in &rows {
            prop_assert_eq!(row.cell("a").is_some(), a.contains(&row.ts));
            prop_assert_eq!(row.cell("b").is_some(), b.contains(&row.ts));
        }
    }
}

#[test]
fn test_alignment_two_hosts_three_rows() {
    let mut store = PointStore::default();
    store.add_point("A", SeriesPoint::new(0).with_avg(1.0));
    store.add_point("A", SeriesPoint::new(1_000).with_avg(1.0));
    store.add_point("B", SeriesPoint::new(1_000).with_avg(2.0));
    store.add_point("B", SeriesPoint::new(2_000).with_avg(2.0));

    let rows = align_hosts(&store, &["A", "B"], 0, i64::MAX);
    assert_eq!(rows.len(), 3);
    assert!(rows[0].cell("A").is_some() && rows[0].cell("B").is_none());
    assert!(rows[2].cell("A").is_none() && rows[2].cell("B").is_some());
}
