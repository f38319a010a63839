// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Multi-host alignment into chart rows.
//!
//! Rows are the sorted union of every selected host's timestamps. A host only
//! contributes fields to a row when it has a sample at exactly that `ts`;
//! nothing is interpolated across hosts, so a row may carry a single host.

use crate::point::SeriesPoint;
use crate::store::PointStore;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::{BTreeMap, HashMap};

/// One host's contribution to a row.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HostCell {
    pub avg: Option<f64>,
    pub loss: Option<f64>,
    /// `[min, max]`, only when both are known.
    pub range: Option<[f64; 2]>,
}

impl HostCell {
    fn from_point(p: &SeriesPoint) -> Self {
        Self {
            avg: p.avg,
            loss: p.loss,
            range: p.min.zip(p.max).map(|(lo, hi)| [lo, hi]),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.avg.is_none() && self.loss.is_none() && self.range.is_none()
    }
}

/// A single timestamp's sparse, union-keyed record.
///
/// Serializes flat, the shape the chart consumes:
/// `{"ts": 1000, "a:avg": 12.0, "a:loss": 0.0, "a:range": [10.0, 14.0]}`.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRow {
    pub ts: i64,
    pub hosts: BTreeMap<String, HostCell>,
}

impl RenderRow {
    pub fn new(ts: i64) -> Self {
        Self {
            ts,
            hosts: BTreeMap::new(),
        }
    }

    pub fn cell(&self, host: &str) -> Option<&HostCell> {
        self.hosts.get(host)
    }

    pub fn avg(&self, host: &str) -> Option<f64> {
        self.cell(host).and_then(|c| c.avg)
    }

    pub fn loss(&self, host: &str) -> Option<f64> {
        self.cell(host).and_then(|c| c.loss)
    }

    pub fn range(&self, host: &str) -> Option<[f64; 2]> {
        self.cell(host).and_then(|c| c.range)
    }

    pub fn has_data_for<S: AsRef<str>>(&self, hosts: &[S]) -> bool {
        hosts.iter().any(|h| self.hosts.contains_key(h.as_ref()))
    }

    /// Mean of the `:avg` fields present in this row.
    pub fn mean_avg(&self) -> Option<f64> {
        let (sum, n) = self
            .hosts
            .values()
            .filter_map(|c| c.avg)
            .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
        (n > 0).then(|| sum / n as f64)
    }
}

impl Serialize for RenderRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("ts", &self.ts)?;
        for (host, cell) in &self.hosts {
            if let Some(avg) = cell.avg {
                map.serialize_entry(&format!("{host}:avg"), &avg)?;
            }
            if let Some(loss) = cell.loss {
                map.serialize_entry(&format!("{host}:loss"), &loss)?;
            }
            if let Some(range) = cell.range {
                map.serialize_entry(&format!("{host}:range"), &range)?;
            }
        }
        map.end()
    }
}

/// Build rows for `hosts` from points with `start <= ts <= end`.
pub fn align_hosts<S: AsRef<str>>(
    store: &PointStore,
    hosts: &[S],
    start: i64,
    end: i64,
) -> Vec<RenderRow> {
    let mut index: Vec<(&str, HashMap<i64, &SeriesPoint>)> = Vec::with_capacity(hosts.len());
    let mut all_ts: Vec<i64> = Vec::new();

    for host in hosts {
        let host = host.as_ref();
        let points = store.points(host);
        let lo = points.partition_point(|p| p.ts < start);
        let hi = points.partition_point(|p| p.ts <= end);
        let window = &points[lo..hi.max(lo)];

        all_ts.extend(window.iter().map(|p| p.ts));
        index.push((host, window.iter().map(|p| (p.ts, p)).collect()));
    }

    all_ts.sort_unstable();
    all_ts.dedup();

    all_ts
        .into_iter()
        .map(|ts| {
            let mut row = RenderRow::new(ts);
            for (host, by_ts) in &index {
                let Some(point) = by_ts.get(&ts) else {
                    continue;
                };
                let cell = HostCell::from_point(point);
                if !cell.is_empty() {
                    row.hosts.insert(host.to_string(), cell);
                }
            }
            row
        })
        .collect()
}
