// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Largest-Triangle-Three-Buckets downsampling.
//!
//! Reference: Sveinn Steinarsson, "Downsampling Time Series for Visual
//! Representation" (2013).
//!
//! Only applied to data handed to the chart, never to the store itself.

use crate::align::RenderRow;

/// Smallest budget the algorithm can honour (first, one bucket, last).
pub const MIN_THRESHOLD: usize = 3;

/// Downsample `data` (ascending by x) to at most `threshold` items.
///
/// `xy` projects an item onto the plane. The first and last items are always
/// kept and the output preserves input order. Budgets below
/// [`MIN_THRESHOLD`] are raised to it.
pub fn downsample<T, F>(data: &[T], threshold: usize, xy: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> (f64, f64),
{
    let threshold = threshold.max(MIN_THRESHOLD);
    let n = data.len();
    if n <= threshold {
        return data.to_vec();
    }

    let buckets = threshold - 2;
    let interior = n - 2;
    // Integer bounds: bucket i covers [bound(i), bound(i + 1)), never empty
    // because interior > buckets.
    let bound = |i: usize| 1 + i * interior / buckets;

    let mut sampled = Vec::with_capacity(threshold);
    sampled.push(data[0].clone());

    let mut a = xy(&data[0]);
    for i in 0..buckets {
        let (start, end) = (bound(i), bound(i + 1));

        let (next_start, next_end) = if i + 1 < buckets {
            (end, bound(i + 2))
        } else {
            (n - 1, n)
        };
        let (sum_x, sum_y) = data[next_start..next_end]
            .iter()
            .map(&xy)
            .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
        let count = (next_end - next_start) as f64;
        let (cx, cy) = (sum_x / count, sum_y / count);

        let mut best = start;
        let mut best_area = -1.0;
        for (j, item) in data[start..end].iter().enumerate() {
            let (x, y) = xy(item);
            let area = ((a.0 - cx) * (y - a.1) - (a.0 - x) * (cy - a.1)).abs();
            if area > best_area {
                best_area = area;
                best = start + j;
            }
        }

        sampled.push(data[best].clone());
        a = xy(&data[best]);
    }

    sampled.push(data[n - 1].clone());
    sampled
}

/// Downsample aligned rows using the mean of the present `:avg` fields as the
/// y value; rows without any latency count as zero.
pub fn downsample_rows(rows: &[RenderRow], threshold: usize) -> Vec<RenderRow> {
    downsample(rows, threshold, |r| (r.ts as f64, r.mean_avg().unwrap_or(0.0)))
}
