// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Dashboard session: the cache, the host selection and the displayed range
//! behind one async mutex.
//!
//! The lock is never held across a backend call. Fetches are planned under
//! the lock, run without it, and their results merged under it again, so
//! concurrent backfills for different hosts or gaps interleave freely while
//! every store mutation stays serialized.

use crate::align::{align_hosts, RenderRow};
use crate::axis::{latency_domain, step_label, ticks, x_domain};
use crate::backend::{HistoryResponse, HostStatus, TelemetryBackend};
use crate::config::{Config, RenderConfig};
use crate::errors::{Error, Result};
use crate::gaps::{FetchRange, GapConfig};
use crate::inflight::InflightRegistry;
use crate::lttb::downsample_rows;
use crate::nearest::{pixel_to_ts, NearestResolver};
use crate::palette::{host_color, loss_color};
use crate::point::SeriesPoint;
use crate::range::{DisplayRange, RangeController, Transition};
use crate::store::{PointStore, StoreEvent};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Wall-clock epoch milliseconds.
pub fn now_ms() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Body of a range change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RangeRequest {
    Preset { preset_minutes: u32 },
    Absolute { start: i64, end: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Toggle {
    Selected { host: String, color: String },
    Deselected { host: String },
}

/// Outcome of one backfill pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    /// Successful backend calls.
    pub fetched: usize,
    pub failed: usize,
    /// Gaps refused because an overlapping fetch was already pending.
    pub skipped: usize,
    /// Points accepted from the responses.
    pub merged: usize,
}

impl BackfillReport {
    fn absorb(&mut self, other: BackfillReport) {
        self.fetched += other.fetched;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.merged += other.merged;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedHost {
    pub host: String,
    pub color: String,
}

/// Everything the chart component needs for one render.
#[derive(Debug, Clone, Serialize)]
pub struct RenderFrame {
    pub range: DisplayRange,
    pub custom_range_open: bool,
    pub revision: u64,
    pub selected: Vec<SelectedHost>,
    pub rows: Vec<RenderRow>,
    /// Row count before downsampling.
    pub total_rows: usize,
    pub downsampled: bool,
    pub step_seconds: Option<u64>,
    pub step_label: String,
    pub x_domain: [i64; 2],
    pub y_domain: [f64; 2],
    pub ticks: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipEntry {
    pub host: String,
    pub color: String,
    pub avg: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub loss: Option<f64>,
    pub loss_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    pub ts: i64,
    pub target: i64,
    pub distance_ms: i64,
    pub snapped: bool,
    pub entries: Vec<TooltipEntry>,
}

struct SessionState {
    store: PointStore,
    selection: Vec<String>,
    range: RangeController,
    status: BTreeMap<String, HostStatus>,
    registry: InflightRegistry,
    last_step: Option<u64>,
}

impl SessionState {
    fn aligned(&self, now: i64) -> Vec<RenderRow> {
        let (start, end) = self.range.current().filter_bounds(now);
        align_hosts(&self.store, &self.selection, start, end)
    }

    fn color_of(&self, host: &str) -> Option<&'static str> {
        self.selection
            .iter()
            .position(|h| h == host)
            .map(host_color)
    }
}

pub struct Session {
    backend: Arc<dyn TelemetryBackend>,
    state: Mutex<SessionState>,
    monitored: Vec<String>,
    gaps: GapConfig,
    render: RenderConfig,
    resolver: NearestResolver,
    revision: Arc<AtomicU64>,
    clock: Clock,
}

impl Session {
    pub fn new(backend: Arc<dyn TelemetryBackend>, config: &Config) -> Self {
        let revision = Arc::new(AtomicU64::new(0));
        let mut store = PointStore::new(config.retention.policy());
        let counter = revision.clone();
        store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        Self {
            backend,
            state: Mutex::new(SessionState {
                store,
                selection: Vec::new(),
                range: RangeController::default(),
                status: BTreeMap::new(),
                registry: InflightRegistry::new(),
                last_step: None,
            }),
            monitored: config.host_names(),
            gaps: config.gaps,
            render: config.render,
            resolver: NearestResolver::new(config.render.snap_threshold_ms),
            revision,
            clock: Arc::new(now_ms),
        }
    }

    /// Replace the wall clock, mostly for tests.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> i64 + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    fn now(&self) -> i64 {
        (self.clock)()
    }

    /// Bumped after every store mutation.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Relaxed)
    }

    pub async fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        self.state.lock().await.store.subscribe(listener);
    }

    /// Poll the backend for the monitored hosts (all hosts the backend knows
    /// when none are configured). On failure the previous table is kept.
    /// Returns the number of live points added for selected hosts.
    pub async fn poll_status(&self) -> Result<usize> {
        let statuses = match self.backend.fetch_status(&self.monitored).await {
            Ok(statuses) => statuses,
            Err(e) => {
                warn!(error = %e, "status poll failed, keeping previous status");
                return Err(e);
            }
        };
        let completed_at = self.now();

        let mut state = self.state.lock().await;
        state.status = statuses
            .into_iter()
            .map(|s| (s.host.clone(), s))
            .collect();

        let live: Vec<(String, SeriesPoint)> = state
            .selection
            .iter()
            .filter_map(|host| {
                let status = state.status.get(host)?;
                Some((host.clone(), status.to_point(completed_at)))
            })
            .collect();

        let mut added = 0;
        for (host, point) in live {
            if state.store.add_point(&host, point) {
                added += 1;
            }
        }
        state.store.evict_all(completed_at);
        debug!(hosts = state.status.len(), added, "status poll applied");
        Ok(added)
    }

    pub async fn status(&self) -> Vec<HostStatus> {
        self.state.lock().await.status.values().cloned().collect()
    }

    pub async fn selected(&self) -> Vec<String> {
        self.state.lock().await.selection.clone()
    }

    pub async fn range(&self) -> DisplayRange {
        self.state.lock().await.range.current()
    }

    pub async fn points(&self, host: &str) -> Vec<SeriesPoint> {
        self.state.lock().await.store.points(host).to_vec()
    }

    /// Mark the custom-range editor open. The next range transition closes it.
    pub async fn open_custom_range(&self) {
        self.state.lock().await.range.open_custom();
    }

    /// Select or deselect `host`. Selecting backfills the current window.
    pub async fn toggle_host(&self, host: &str) -> Result<Toggle> {
        let color = {
            let mut state = self.state.lock().await;

            if let Some(pos) = state.selection.iter().position(|h| h == host) {
                state.selection.remove(pos);
                if self.render.clear_on_deselect {
                    state.store.clear(host);
                }
                info!(host, "host deselected");
                return Ok(Toggle::Deselected {
                    host: host.to_string(),
                });
            }

            if state.selection.len() >= self.render.max_selected_hosts {
                return Err(Error::SelectionFull {
                    limit: self.render.max_selected_hosts,
                });
            }
            if !state.status.get(host).is_some_and(HostStatus::has_latency) {
                return Err(Error::NoData(host.to_string()));
            }

            state.selection.push(host.to_string());
            host_color(state.selection.len() - 1)
        };

        info!(host, color, "host selected");
        let report = self.backfill_host(host).await;
        debug!(host, ?report, "selection backfill done");

        Ok(Toggle::Selected {
            host: host.to_string(),
            color: color.to_string(),
        })
    }

    pub async fn set_range(&self, request: RangeRequest) -> Result<DisplayRange> {
        let now = self.now();
        let transition = {
            let mut state = self.state.lock().await;
            match request {
                RangeRequest::Preset { preset_minutes } => {
                    state.range.select_preset(preset_minutes)?
                }
                RangeRequest::Absolute { start, end } => {
                    state.range.apply_absolute(start, end, now)?
                }
            }
        };
        self.after_transition(transition).await;
        Ok(transition.current)
    }

    pub async fn reset_range(&self) -> DisplayRange {
        let transition = self.state.lock().await.range.reset();
        self.after_transition(transition).await;
        transition.current
    }

    /// Apply a drag selection in chart pixels. Returns `None` when the
    /// selection was too narrow to zoom.
    pub async fn zoom(&self, x_start: f64, x_end: f64, width: f64) -> Result<Option<DisplayRange>> {
        let now = self.now();
        let transition = {
            let mut state = self.state.lock().await;
            let rows = state.aligned(now);
            let domain = x_domain(&state.range.current(), &rows, now);
            let bounds = self
                .resolver
                .zoom_bounds(&rows, domain, width, x_start, x_end);
            let Some((start, end)) = bounds else {
                debug!(x_start, x_end, width, "zoom selection ignored");
                return Ok(None);
            };
            state.range.zoom(start, end, now)?
        };
        self.after_transition(transition).await;
        Ok(Some(transition.current))
    }

    async fn after_transition(&self, transition: Transition) {
        info!(from = %transition.previous, to = %transition.current, "range changed");
        let report = self.backfill_selected().await;
        // A fully cached window triggers no gap fetch, so ask the backend
        // once for the window to learn its step.
        if report.fetched == 0 && report.skipped == 0 {
            self.refresh_window().await;
        }
    }

    /// Backfill every selected host concurrently.
    pub async fn backfill_selected(&self) -> BackfillReport {
        let hosts = self.selected().await;
        let reports = join_all(hosts.iter().map(|h| self.backfill_host(h))).await;

        let mut total = BackfillReport::default();
        for report in reports {
            total.absorb(report);
        }
        total
    }

    /// Fetch and merge the gaps in `host`'s cache over the current window.
    pub async fn backfill_host(&self, host: &str) -> BackfillReport {
        let now = self.now();
        let mut report = BackfillReport::default();

        let planned: Vec<(Uuid, FetchRange)> = {
            let mut state = self.state.lock().await;
            let (start, end) = state.range.current().bounds(now);
            let gaps = self.gaps.plan(state.store.points(host), start, end);

            let mut planned = Vec::with_capacity(gaps.len());
            for gap in gaps {
                match state.registry.add_request(host, gap) {
                    Ok(id) => planned.push((id, gap)),
                    Err(e) => {
                        debug!(host, range = %gap, error = %e, "gap already being fetched");
                        report.skipped += 1;
                    }
                }
            }
            planned
        };

        if planned.is_empty() {
            return report;
        }

        let hosts = [host.to_string()];
        let fetches = planned.iter().map(|&(id, gap)| {
            let hosts = &hosts;
            async move {
                debug!(host = %hosts[0], range = %gap, "backfilling gap");
                let result = self
                    .backend
                    .fetch_history(hosts, gap.start, gap.end, 0)
                    .await;
                (id, gap, result)
            }
        });
        let results = join_all(fetches).await;

        let mut state = self.state.lock().await;
        for (id, gap, result) in results {
            match result {
                Ok(resp) => {
                    state.registry.mark_completed(id);
                    report.fetched += 1;
                    report.merged += self.apply_history(&mut state, host, &resp);
                }
                Err(e) => {
                    state.registry.mark_failed(id, &e.to_string());
                    warn!(host, range = %gap, error = %e, "gap left unfilled");
                    report.failed += 1;
                }
            }
        }
        state.store.evict(host, self.now());
        report
    }

    /// One history request over the whole window for all selected hosts.
    async fn refresh_window(&self) {
        let now = self.now();
        let (hosts, window, ids) = {
            let mut state = self.state.lock().await;
            if state.selection.is_empty() {
                return;
            }
            let (start, end) = state.range.current().bounds(now);
            let Some(window) = FetchRange::new(start, end) else {
                return;
            };

            let hosts = state.selection.clone();
            let mut ids = Vec::with_capacity(hosts.len());
            for host in &hosts {
                match state.registry.add_request(host, window) {
                    Ok(id) => ids.push(id),
                    Err(e) => {
                        debug!(host = %host, error = %e, "window refresh skipped");
                        for id in ids {
                            state.registry.mark_completed(id);
                        }
                        return;
                    }
                }
            }
            (hosts, window, ids)
        };

        let result = self
            .backend
            .fetch_history(&hosts, window.start, window.end, 0)
            .await;

        let mut state = self.state.lock().await;
        match result {
            Ok(resp) => {
                for id in ids {
                    state.registry.mark_completed(id);
                }
                for host in &hosts {
                    self.apply_history(&mut state, host, &resp);
                }
                state.store.evict_all(self.now());
            }
            Err(e) => {
                let message = e.to_string();
                for id in ids {
                    state.registry.mark_failed(id, &message);
                }
            }
        }
    }

    fn apply_history(&self, state: &mut SessionState, host: &str, resp: &HistoryResponse) -> usize {
        if let Some(step) = resp.step_seconds.filter(|&s| s > 0) {
            state.last_step = Some(step);
        }

        let selected = state.selection.iter().any(|h| h == host);
        if !selected && self.render.clear_on_deselect {
            debug!(host, "dropping history for deselected host");
            return 0;
        }

        let points = resp.points_for(host);
        let accepted = points.len();
        if accepted > 0 {
            state.store.merge_history(host, points);
        }
        accepted
    }

    pub async fn frame(&self) -> RenderFrame {
        let now = self.now();
        let state = self.state.lock().await;

        let range = state.range.current();
        let rows = state.aligned(now);
        let total_rows = rows.len();
        let domain = x_domain(&range, &rows, now);
        let (y_lo, y_hi) = latency_domain(&rows, &state.selection);

        let (rows, downsampled) = if total_rows > self.render.max_points {
            (downsample_rows(&rows, self.render.max_points), true)
        } else {
            (rows, false)
        };

        let selected = state
            .selection
            .iter()
            .enumerate()
            .map(|(i, host)| SelectedHost {
                host: host.clone(),
                color: host_color(i).to_string(),
            })
            .collect();

        RenderFrame {
            range,
            custom_range_open: state.range.custom_open(),
            revision: self.revision(),
            selected,
            rows,
            total_rows,
            downsampled,
            step_seconds: state.last_step,
            step_label: step_label(state.last_step),
            x_domain: [domain.0, domain.1],
            y_domain: [y_lo, y_hi],
            ticks: ticks(domain, state.last_step),
        }
    }

    /// Tooltip for the cursor at `x` pixels in a chart `width` pixels wide.
    pub async fn tooltip(&self, x: f64, width: f64) -> Option<Tooltip> {
        let now = self.now();
        let state = self.state.lock().await;

        let rows = state.aligned(now);
        let domain = x_domain(&state.range.current(), &rows, now);
        let target = pixel_to_ts(x, width, domain)?;
        let resolved = self.resolver.resolve(&rows, target, &state.selection)?;
        let row = &rows[resolved.index];

        let entries = state
            .selection
            .iter()
            .filter_map(|host| {
                let cell = row.cell(host)?;
                let color = state.color_of(host)?;
                Some(TooltipEntry {
                    host: host.clone(),
                    color: color.to_string(),
                    avg: cell.avg,
                    min: cell.range.map(|r| r[0]),
                    max: cell.range.map(|r| r[1]),
                    loss: cell.loss,
                    loss_color: cell.loss.map(|l| loss_color(l, color).to_string()),
                })
            })
            .collect();

        Some(Tooltip {
            ts: resolved.ts,
            target,
            distance_ms: resolved.distance_ms,
            snapped: resolved.snapped,
            entries,
        })
    }
}
