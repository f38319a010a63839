// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Per-host point store.
//!
//! Each host owns a `Vec<SeriesPoint>` kept strictly ascending by `ts`. Live
//! samples take the append fast path; historical responses go through
//! [`PointStore::merge_history`], which rebuilds the sequence from a
//! `ts`-keyed map so repeated or overlapping merges are idempotent.

use crate::point::{HostSeriesMap, SeriesPoint};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace};

/// How long points are kept and how eagerly they are trimmed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetentionPolicy {
    /// Points older than `now - window_ms` are eligible for eviction.
    pub window_ms: i64,
    /// Optional soft cap on points per host.
    pub max_points: Option<usize>,
    /// Eviction waits until the expired backlog (or the overflow past
    /// `max_points`) exceeds this share of the cap.
    pub buffer_percent: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            window_ms: 43_200 * 60_000,
            max_points: None,
            buffer_percent: 10,
        }
    }
}

impl RetentionPolicy {
    fn slack(&self, len: usize) -> usize {
        let base = self.max_points.unwrap_or(len);
        (base * self.buffer_percent as usize / 100).max(1)
    }
}

/// Mutation notifications delivered to subscribers after the store changed.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Appended { host: String, ts: i64 },
    Merged { host: String, total: usize },
    Evicted { host: String, removed: usize },
    Cleared { host: String },
}

type Listener = Box<dyn Fn(&StoreEvent) + Send + Sync>;

#[derive(Default)]
pub struct PointStore {
    series: HashMap<String, Vec<SeriesPoint>>,
    retention: RetentionPolicy,
    listeners: Vec<Listener>,
}

impl PointStore {
    pub fn new(retention: RetentionPolicy) -> Self {
        Self {
            series: HashMap::new(),
            retention,
            listeners: Vec::new(),
        }
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    /// Register a callback invoked after every mutation.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&self, event: StoreEvent) {
        for listener in &self.listeners {
            listener(&event);
        }
    }

    /// Insert a live sample. Same `ts` as the last stored point overwrites it.
    /// Returns false when the point is malformed and was dropped.
    pub fn add_point(&mut self, host: &str, point: SeriesPoint) -> bool {
        let Some(point) = point.sanitized() else {
            debug!(host, ts = point.ts, "dropping malformed point");
            return false;
        };

        let points = self.series.entry(host.to_string()).or_default();
        match points.last().map(|last| last.ts) {
            Some(last_ts) if last_ts < point.ts => points.push(point),
            Some(_) => {
                // Same instant overwrites; a late sample is slotted in place
                // so the sequence stays sorted without a full sort.
                match points.binary_search_by_key(&point.ts, |p| p.ts) {
                    Ok(i) => points[i] = point,
                    Err(i) => points.insert(i, point),
                }
            }
            None => points.push(point),
        }
        trace!(host, ts = point.ts, len = points.len(), "point added");

        self.notify(StoreEvent::Appended {
            host: host.to_string(),
            ts: point.ts,
        });
        true
    }

    /// Merge a decoded historical response. Fetched values win on `ts`
    /// collisions; stored points outside the fetched set are kept.
    pub fn merge_history(&mut self, host: &str, fetched: Vec<SeriesPoint>) -> usize {
        let existing = self.series.remove(host).unwrap_or_default();
        let mut by_ts: BTreeMap<i64, SeriesPoint> =
            existing.into_iter().map(|p| (p.ts, p)).collect();

        let mut accepted = 0usize;
        for point in fetched.into_iter().filter_map(SeriesPoint::sanitized) {
            by_ts.insert(point.ts, point);
            accepted += 1;
        }

        let merged: Vec<SeriesPoint> = by_ts.into_values().collect();
        let total = merged.len();
        debug!(host, accepted, total, "merged history");
        self.series.insert(host.to_string(), merged);

        self.notify(StoreEvent::Merged {
            host: host.to_string(),
            total,
        });
        total
    }

    /// Drop expired points in one slice once the backlog passes the
    /// hysteresis slack. Points with `ts >= now - window` are never removed.
    pub fn evict(&mut self, host: &str, now_ms: i64) -> usize {
        let Some(points) = self.series.get_mut(host) else {
            return 0;
        };

        let cutoff = now_ms.saturating_sub(self.retention.window_ms);
        let expired = points.partition_point(|p| p.ts < cutoff);
        if expired == 0 {
            return 0;
        }

        let slack = self.retention.slack(points.len());
        let over_cap = self
            .retention
            .max_points
            .is_some_and(|cap| points.len() > cap + slack);
        if expired < slack && !over_cap {
            return 0;
        }

        points.drain(..expired);
        debug!(host, removed = expired, remaining = points.len(), "evicted points");

        self.notify(StoreEvent::Evicted {
            host: host.to_string(),
            removed: expired,
        });
        expired
    }

    pub fn evict_all(&mut self, now_ms: i64) -> usize {
        let hosts: Vec<String> = self.series.keys().cloned().collect();
        hosts.iter().map(|h| self.evict(h, now_ms)).sum()
    }

    pub fn clear(&mut self, host: &str) {
        if self.series.remove(host).is_some() {
            debug!(host, "cleared host cache");
            self.notify(StoreEvent::Cleared {
                host: host.to_string(),
            });
        }
    }

    pub fn points(&self, host: &str) -> &[SeriesPoint] {
        self.series.get(host).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, host: &str) -> bool {
        self.series.contains_key(host)
    }

    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn snapshot(&self) -> HostSeriesMap {
        self.series.clone()
    }
}
