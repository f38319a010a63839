// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Nearest-point lookup for tooltips and drag-zoom.

use crate::align::RenderRow;
use serde::Serialize;

/// Zoom selections narrower than this are treated as clicks.
pub const MIN_ZOOM_SPAN_MS: i64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolved {
    pub index: usize,
    pub ts: i64,
    pub distance_ms: i64,
    /// The chosen point is further than the snap threshold from the target.
    pub snapped: bool,
}

/// Map a pixel offset inside a plot of `width` pixels onto the axis domain.
pub fn pixel_to_ts(x: f64, width: f64, domain: (i64, i64)) -> Option<i64> {
    if width.is_nan() || width <= 0.0 || !x.is_finite() {
        return None;
    }
    let ratio = (x / width).clamp(0.0, 1.0);
    let span = (domain.1 - domain.0) as f64;
    Some(domain.0 + (ratio * span).round() as i64)
}

/// Walk `timestamps` (ascending) outward from `target` in order of distance
/// and return the first index `accept` agrees to. Ties prefer the earlier
/// point.
pub fn nearest_matching<F>(timestamps: &[i64], target: i64, accept: F) -> Option<usize>
where
    F: Fn(usize) -> bool,
{
    // Insertion point; the true nearest is here or one to the left.
    let split = timestamps.partition_point(|&t| t < target);
    let mut left = split.checked_sub(1);
    let mut right = (split < timestamps.len()).then_some(split);

    loop {
        let pick = match (left, right) {
            (None, None) => return None,
            (Some(l), None) => l,
            (None, Some(r)) => r,
            (Some(l), Some(r)) => {
                if target.abs_diff(timestamps[l]) <= target.abs_diff(timestamps[r]) {
                    l
                } else {
                    r
                }
            }
        };

        if accept(pick) {
            return Some(pick);
        }

        if Some(pick) == left {
            left = pick.checked_sub(1);
        } else {
            right = (pick + 1 < timestamps.len()).then_some(pick + 1);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NearestResolver {
    pub snap_threshold_ms: i64,
}

impl Default for NearestResolver {
    fn default() -> Self {
        Self {
            snap_threshold_ms: 1_000,
        }
    }
}

impl NearestResolver {
    pub fn new(snap_threshold_ms: i64) -> Self {
        Self { snap_threshold_ms }
    }

    /// Closest row to `target` carrying data for at least one of `hosts`.
    pub fn resolve<S: AsRef<str>>(
        &self,
        rows: &[RenderRow],
        target: i64,
        hosts: &[S],
    ) -> Option<Resolved> {
        let timestamps: Vec<i64> = rows.iter().map(|r| r.ts).collect();
        let index = nearest_matching(&timestamps, target, |i| rows[i].has_data_for(hosts))?;
        Some(self.annotate(index, timestamps[index], target))
    }

    /// Closest timestamp with no data requirement.
    pub fn resolve_ts(&self, timestamps: &[i64], target: i64) -> Option<Resolved> {
        let index = nearest_matching(timestamps, target, |_| true)?;
        Some(self.annotate(index, timestamps[index], target))
    }

    fn annotate(&self, index: usize, ts: i64, target: i64) -> Resolved {
        let distance_ms = (ts - target).abs();
        Resolved {
            index,
            ts,
            distance_ms,
            snapped: distance_ms > self.snap_threshold_ms,
        }
    }

    /// Convert a drag selection in pixels to `[start, end]` in epoch-ms.
    ///
    /// Each edge snaps to the nearest row when rows exist. Returns `None` for
    /// selections narrower than [`MIN_ZOOM_SPAN_MS`].
    pub fn zoom_bounds(
        &self,
        rows: &[RenderRow],
        domain: (i64, i64),
        width: f64,
        x_start: f64,
        x_end: f64,
    ) -> Option<(i64, i64)> {
        let timestamps: Vec<i64> = rows.iter().map(|r| r.ts).collect();
        let edge = |x: f64| {
            let ts = pixel_to_ts(x, width, domain)?;
            Some(self.resolve_ts(&timestamps, ts).map_or(ts, |r| r.ts))
        };

        let (a, b) = (edge(x_start)?, edge(x_end)?);
        let (start, end) = (a.min(b), a.max(b));
        (end - start > MIN_ZOOM_SPAN_MS).then_some((start, end))
    }
}
