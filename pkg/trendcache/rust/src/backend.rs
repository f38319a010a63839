// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Telemetry backend contract and its HTTP client.

use crate::errors::{Error, Result};
use crate::point::SeriesPoint;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Latest probe result for one host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostStatus {
    pub host: String,
    #[serde(default)]
    pub avg_latency: Option<f64>,
    #[serde(default)]
    pub min_latency: Option<f64>,
    #[serde(default)]
    pub max_latency: Option<f64>,
    #[serde(default)]
    pub packet_loss: Option<f64>,
    /// `ALERT` or `RECOVERY`.
    #[serde(default)]
    pub status: String,
}

impl HostStatus {
    pub fn has_latency(&self) -> bool {
        self.avg_latency.is_some_and(f64::is_finite)
    }

    pub fn is_alert(&self) -> bool {
        self.status.eq_ignore_ascii_case("ALERT")
    }

    /// Live sample for this status stamped at `ts`.
    pub fn to_point(&self, ts: i64) -> SeriesPoint {
        SeriesPoint {
            ts,
            min: self.min_latency,
            avg: self.avg_latency,
            max: self.max_latency,
            loss: self.packet_loss,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// Epoch milliseconds.
    pub timestamp: f64,
    #[serde(default)]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySeries {
    pub avg_latency: Vec<MetricSample>,
    pub min_latency: Vec<MetricSample>,
    pub max_latency: Vec<MetricSample>,
    pub packet_loss: Vec<MetricSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostHistory {
    pub host: String,
    #[serde(default)]
    pub series: HistorySeries,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub hosts: Vec<HostHistory>,
    #[serde(default)]
    pub step_seconds: Option<u64>,
}

impl HistoryResponse {
    /// Decoded points for `host`, empty when the response does not mention it.
    pub fn points_for(&self, host: &str) -> Vec<SeriesPoint> {
        self.hosts
            .iter()
            .find(|h| h.host == host)
            .map(|h| decode_series(&h.series))
            .unwrap_or_default()
    }
}

/// Join the four metric series on timestamp. Samples with a non-finite
/// timestamp are skipped and points left without any finite metric dropped.
pub fn decode_series(series: &HistorySeries) -> Vec<SeriesPoint> {
    let mut by_ts: BTreeMap<i64, SeriesPoint> = BTreeMap::new();

    let columns: [(&[MetricSample], fn(&mut SeriesPoint, f64)); 4] = [
        (series.avg_latency.as_slice(), |p, v| p.avg = Some(v)),
        (series.min_latency.as_slice(), |p, v| p.min = Some(v)),
        (series.max_latency.as_slice(), |p, v| p.max = Some(v)),
        (series.packet_loss.as_slice(), |p, v| p.loss = Some(v)),
    ];

    for (samples, set) in columns {
        for sample in samples {
            if !sample.timestamp.is_finite() {
                continue;
            }
            let Some(value) = sample.value else {
                continue;
            };
            let ts = sample.timestamp.round() as i64;
            let point = by_ts.entry(ts).or_insert_with(|| SeriesPoint::new(ts));
            set(point, value);
        }
    }

    by_ts
        .into_values()
        .filter_map(SeriesPoint::sanitized)
        .collect()
}

/// Source of live status and historical series.
#[async_trait]
pub trait TelemetryBackend: Send + Sync {
    async fn fetch_status(&self, hosts: &[String]) -> Result<Vec<HostStatus>>;

    /// `step_hint_secs == 0` lets the backend choose the resolution.
    async fn fetch_history(
        &self,
        hosts: &[String],
        start_ms: i64,
        end_ms: i64,
        step_hint_secs: u64,
    ) -> Result<HistoryResponse>;
}

/// [`TelemetryBackend`] over the backend's JSON HTTP API.
#[derive(Clone)]
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, ?query, "backend request");
        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        resp.json().await.map_err(|e| Error::Decode {
            context: format!("{path}: {e}"),
        })
    }
}

#[async_trait]
impl TelemetryBackend for HttpBackend {
    async fn fetch_status(&self, hosts: &[String]) -> Result<Vec<HostStatus>> {
        self.get_json("/api/status", &[("hosts", hosts.join(","))])
            .await
    }

    async fn fetch_history(
        &self,
        hosts: &[String],
        start_ms: i64,
        end_ms: i64,
        step_hint_secs: u64,
    ) -> Result<HistoryResponse> {
        if start_ms >= end_ms {
            return Err(Error::InvalidRange {
                start: start_ms,
                end: end_ms,
            });
        }
        self.get_json(
            "/api/history",
            &[
                ("hosts", hosts.join(",")),
                ("start", start_ms.to_string()),
                ("end", end_ms.to_string()),
                ("step", step_hint_secs.to_string()),
            ],
        )
        .await
    }
}
