// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Gap detection over a host's cached sequence.
//!
//! Only spans the cache does not already cover are requested, so a range
//! change over a mostly-cached window costs a handful of narrow fetches
//! instead of one wide one.

use crate::point::SeriesPoint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A backend fetch window in epoch milliseconds, `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FetchRange {
    pub start: i64,
    pub end: i64,
}

impl FetchRange {
    pub fn new(start: i64, end: i64) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// Whole minutes covered, rounded up, never zero.
    pub fn minutes(&self) -> i64 {
        let span = self.end - self.start;
        ((span + 59_999) / 60_000).max(1)
    }
}

impl fmt::Display for FetchRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}] ({}m)", self.start, self.end, self.minutes())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapConfig {
    /// Expected spacing between live samples.
    pub sampling_interval_ms: i64,
    /// Consecutive points further apart than `gap_factor` intervals are a gap.
    pub gap_factor: i64,
    /// Margin trimmed from each side of a gap before fetching.
    pub buffer_ms: i64,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            sampling_interval_ms: 60_000,
            gap_factor: 3,
            buffer_ms: 60_000,
        }
    }
}

impl GapConfig {
    fn threshold_ms(&self) -> i64 {
        self.sampling_interval_ms * self.gap_factor
    }

    /// Gaps in `points` (ascending) over the window `[start, end]`.
    ///
    /// An empty sequence yields the whole window. Otherwise the leading,
    /// interior and trailing gaps are reported, each trimmed by `buffer_ms`
    /// and clipped to the window; gaps that vanish after trimming are skipped.
    /// The nearest cached point on either side of the window bounds the edge
    /// gaps, so a window that falls inside a cached gap is fetched as a whole
    /// and nothing outside it is requested.
    pub fn plan(&self, points: &[SeriesPoint], start: i64, end: i64) -> Vec<FetchRange> {
        let lo = points.partition_point(|p| p.ts < start).saturating_sub(1);
        let hi = (points.partition_point(|p| p.ts <= end) + 1).min(points.len());
        let span = &points[lo..hi];

        let (Some(head), Some(tail)) = (span.first(), span.last()) else {
            return FetchRange::new(start, end).into_iter().collect();
        };

        let threshold = self.threshold_ms();
        let mut gaps = Vec::new();

        if head.ts - start > self.sampling_interval_ms {
            gaps.extend(FetchRange::new(start, (head.ts - self.buffer_ms).min(end)));
        }

        for pair in span.windows(2) {
            let (prev, next) = (pair[0].ts, pair[1].ts);
            if next - prev > threshold {
                gaps.extend(FetchRange::new(
                    (prev + self.buffer_ms).max(start),
                    (next - self.buffer_ms).min(end),
                ));
            }
        }

        if end - tail.ts > threshold {
            gaps.extend(FetchRange::new((tail.ts + self.buffer_ms).max(start), end));
        }

        gaps
    }
}
