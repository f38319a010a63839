// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Axis domains, tick placement and the resolution label.

use crate::align::RenderRow;
use crate::range::DisplayRange;

const DESIRED_TICKS: i64 = 8;
const MAX_TICKS: usize = 61;

/// Data spanning at least this share of a relative window is shown tight.
const TIGHT_SPAN_RATIO: f64 = 0.6;

/// Human label for the backend step, `auto` when the backend did not say.
pub fn step_label(step_seconds: Option<u64>) -> String {
    match step_seconds {
        None | Some(0) => "auto".to_string(),
        Some(s) if s < 60 => format!("{s}s"),
        Some(s) if s % 3600 == 0 => format!("{}h", s / 3600),
        Some(s) if s % 60 == 0 => format!("{}m", s / 60),
        Some(s) => format!("{s}s"),
    }
}

/// X-axis domain in epoch-ms.
///
/// Absolute ranges are shown as-is. A relative window is anchored on the
/// newest row so a slightly late poll does not leave a blank edge.
pub fn x_domain(range: &DisplayRange, rows: &[RenderRow], now_ms: i64) -> (i64, i64) {
    let window = range.window_ms();
    if let DisplayRange::Absolute { start, end } = *range {
        return (start, end);
    }

    let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
        return (now_ms - window, now_ms);
    };
    let (data_min, data_max) = (first.ts, last.ts);
    let span = data_max - data_min;

    if span as f64 >= window as f64 * TIGHT_SPAN_RATIO && data_min > data_max - window {
        (data_min, data_max)
    } else {
        (data_max - window, data_max)
    }
}

/// About eight ticks across `domain`, spaced on a multiple of the backend
/// step and aligned to that spacing.
pub fn ticks(domain: (i64, i64), step_seconds: Option<u64>) -> Vec<i64> {
    let (start, end) = domain;
    if end <= start {
        return vec![start];
    }

    let span_secs = (end - start) / 1000;
    let mut spacing = (span_secs / DESIRED_TICKS).max(1);
    if let Some(step) = step_seconds.filter(|&s| s > 0) {
        let step = step as i64;
        let multiples = ((spacing as f64 / step as f64).round() as i64).max(1);
        spacing = multiples * step;
    }

    let spacing_ms = spacing * 1000;
    let mut tick = start.div_euclid(spacing_ms) * spacing_ms;
    if tick < start {
        tick += spacing_ms;
    }

    let mut out = Vec::new();
    while tick <= end && out.len() < MAX_TICKS {
        out.push(tick);
        tick += spacing_ms;
    }
    out
}

/// Latency Y-axis domain over the selected hosts' `:avg` and `:range`.
pub fn latency_domain<S: AsRef<str>>(rows: &[RenderRow], hosts: &[S]) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;

    for row in rows {
        for host in hosts {
            let Some(cell) = row.cell(host.as_ref()) else {
                continue;
            };
            let values = cell
                .avg
                .into_iter()
                .chain(cell.range.into_iter().flatten());
            for v in values {
                lo = lo.min(v);
                hi = hi.max(v);
            }
        }
    }

    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if lo == hi {
        let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
        return ((lo - pad).max(0.0), hi + pad);
    }
    (lo, hi)
}
