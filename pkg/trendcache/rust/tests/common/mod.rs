// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Scripted in-process backend shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use latency_trendcache::backend::{HistorySeries, HostHistory, MetricSample};
use latency_trendcache::{
    Config, Error, HistoryResponse, HostStatus, Result, Session, TelemetryBackend,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const MINUTE: i64 = 60_000;

/// Fixed "now" used by every session built here.
pub const NOW: i64 = 1_700_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryCall {
    pub hosts: Vec<String>,
    pub start: i64,
    pub end: i64,
}

#[derive(Default)]
pub struct FakeBackend {
    pub statuses: Mutex<Vec<HostStatus>>,
    pub history: Mutex<VecDeque<HistoryResponse>>,
    pub calls: Mutex<Vec<HistoryCall>>,
    pub fail_status: AtomicBool,
    pub fail_history: AtomicBool,
    pub history_delay: Mutex<Option<Duration>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_statuses(&self, statuses: Vec<HostStatus>) {
        *self.statuses.lock().unwrap() = statuses;
    }

    pub fn push_history(&self, response: HistoryResponse) {
        self.history.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> Vec<HistoryCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl TelemetryBackend for FakeBackend {
    async fn fetch_status(&self, _hosts: &[String]) -> Result<Vec<HostStatus>> {
        if self.fail_status.load(Ordering::SeqCst) {
            return Err(Error::Transport("connection refused".into()));
        }
        Ok(self.statuses.lock().unwrap().clone())
    }

    async fn fetch_history(
        &self,
        hosts: &[String],
        start_ms: i64,
        end_ms: i64,
        _step_hint_secs: u64,
    ) -> Result<HistoryResponse> {
        self.calls.lock().unwrap().push(HistoryCall {
            hosts: hosts.to_vec(),
            start: start_ms,
            end: end_ms,
        });

        let delay = *self.history_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_history.load(Ordering::SeqCst) {
            return Err(Error::Decode {
                context: "truncated body".into(),
            });
        }
        Ok(self.history.lock().unwrap().pop_front().unwrap_or_default())
    }
}

pub fn status(host: &str, avg: f64, loss: f64) -> HostStatus {
    HostStatus {
        host: host.to_string(),
        avg_latency: Some(avg),
        min_latency: Some(avg - 1.0),
        max_latency: Some(avg + 1.0),
        packet_loss: Some(loss),
        status: if loss >= 100.0 { "ALERT" } else { "RECOVERY" }.to_string(),
    }
}

/// History for one host with an average sample at each timestamp.
pub fn history(host: &str, samples: &[(i64, f64)], step_seconds: Option<u64>) -> HistoryResponse {
    HistoryResponse {
        hosts: vec![HostHistory {
            host: host.to_string(),
            series: HistorySeries {
                avg_latency: samples
                    .iter()
                    .map(|&(ts, v)| MetricSample {
                        timestamp: ts as f64,
                        value: Some(v),
                    })
                    .collect(),
                ..Default::default()
            },
        }],
        step_seconds,
    }
}

pub fn config() -> Config {
    let mut config = Config::default();
    config.gaps.sampling_interval_ms = MINUTE;
    config.gaps.gap_factor = 3;
    config.gaps.buffer_ms = MINUTE / 10;
    config
}

pub fn session(backend: &Arc<FakeBackend>, config: &Config) -> Session {
    Session::new(backend.clone(), config).with_clock(|| NOW)
}
