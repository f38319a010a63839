// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Client-side time-series cache for the network latency dashboard.
//!
//! Live status polls and on-demand historical backfills for each monitored
//! host land in one bounded, gap-aware store. Render requests align the
//! selected hosts onto a common timestamp axis, downsample oversized row sets
//! for the chart, and resolve cursor positions to the nearest sample.
//!
//! ## Architecture
//!
//! 1. **Point Store** (`store`) - per-host ascending, deduplicated samples
//!    with time-window retention and change notifications.
//!
//! 2. **Gap Detector** (`gaps`) - finds the spans the cache does not cover
//!    so backfills only request what is missing.
//!
//! 3. **Aligner** (`align`) - sparse union rows; a host only contributes to
//!    rows at its own timestamps, nothing is interpolated.
//!
//! 4. **Downsampler** (`lttb`) - Largest-Triangle-Three-Buckets.
//!
//! 5. **Nearest-Point Resolver** (`nearest`) - tooltips and drag-zoom.
//!
//! 6. **Range Controller** (`range`) - relative presets and absolute windows.
//!
//! `session` ties them to a [`TelemetryBackend`] behind one async mutex and
//! `server` exposes the session over HTTP.

pub mod align;
pub mod axis;
pub mod backend;
pub mod config;
pub mod errors;
pub mod gaps;
pub mod inflight;
pub mod lttb;
pub mod nearest;
pub mod palette;
pub mod point;
pub mod range;
pub mod server;
pub mod session;
pub mod store;

pub use align::{align_hosts, HostCell, RenderRow};
pub use backend::{HistoryResponse, HostStatus, HttpBackend, TelemetryBackend};
pub use config::Config;
pub use errors::{Error, Result};
pub use gaps::{FetchRange, GapConfig};
pub use point::{HostSeriesMap, SeriesPoint};
pub use range::{DisplayRange, RangeController};
pub use session::{RangeRequest, RenderFrame, Session, Toggle};
pub use store::{PointStore, RetentionPolicy, StoreEvent};
