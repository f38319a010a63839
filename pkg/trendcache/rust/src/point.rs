// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Sample types shared by the store, the aligner and the backend decoder.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One sampling instant for one host. Any subset of the metrics may be present.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Epoch milliseconds.
    pub ts: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Packet loss percent, 0..=100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss: Option<f64>,
}

impl SeriesPoint {
    pub fn new(ts: i64) -> Self {
        Self {
            ts,
            ..Default::default()
        }
    }

    pub fn with_avg(mut self, avg: f64) -> Self {
        self.avg = Some(avg);
        self
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn with_loss(mut self, loss: f64) -> Self {
        self.loss = Some(loss);
        self
    }

    /// Drops non-finite metrics and rejects the point when the timestamp is
    /// negative or no metric survives.
    pub fn sanitized(self) -> Option<Self> {
        if self.ts < 0 {
            return None;
        }
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
        let point = Self {
            ts: self.ts,
            min: finite(self.min),
            avg: finite(self.avg),
            max: finite(self.max),
            loss: finite(self.loss).map(|l| l.clamp(0.0, 100.0)),
        };
        point.has_metrics().then_some(point)
    }

    pub fn has_metrics(&self) -> bool {
        self.min.is_some() || self.avg.is_some() || self.max.is_some() || self.loss.is_some()
    }
}

/// host -> points, ascending by `ts`.
pub type HostSeriesMap = HashMap<String, Vec<SeriesPoint>>;
