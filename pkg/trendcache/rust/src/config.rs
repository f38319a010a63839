// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Configuration loading from a YAML file
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! usable configuration.

use crate::gaps::GapConfig;
use crate::store::RetentionPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV_VAR: &str = "TRENDCACHE_CONFIG";

/// Top-level configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend_url: String,
    pub request_timeout_secs: u64,
    pub hosts: Vec<HostEntry>,
    /// 0 disables the status poller.
    pub poll_interval_ms: u64,
    pub retention: RetentionConfig,
    pub gaps: GapConfig,
    pub render: RenderConfig,
    pub listen_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:8080".to_string(),
            request_timeout_secs: 30,
            hosts: Vec::new(),
            poll_interval_ms: 5_000,
            retention: RetentionConfig::default(),
            gaps: GapConfig::default(),
            render: RenderConfig::default(),
            listen_port: 8050,
        }
    }
}

/// A monitored host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostEntry {
    pub host: String,

    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub window_minutes: u32,
    pub max_points: Option<usize>,
    pub buffer_percent: u32,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            window_minutes: 43_200,
            max_points: None,
            buffer_percent: 10,
        }
    }
}

impl RetentionConfig {
    pub fn policy(&self) -> RetentionPolicy {
        RetentionPolicy {
            window_ms: i64::from(self.window_minutes) * 60_000,
            max_points: self.max_points,
            buffer_percent: self.buffer_percent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// LTTB budget for rows handed to the chart.
    pub max_points: usize,
    pub snap_threshold_ms: i64,
    pub max_selected_hosts: usize,
    /// Drop a host's cached points when it is deselected.
    pub clear_on_deselect: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_points: 1_000,
            snap_threshold_ms: 1_000,
            max_selected_hosts: 5,
            clear_on_deselect: false,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("Failed to parse YAML from '{}'", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.render.max_selected_hosts > 0,
            "render.max_selected_hosts must be at least 1"
        );
        anyhow::ensure!(
            self.gaps.sampling_interval_ms > 0 && self.gaps.gap_factor > 0,
            "gaps.sampling_interval_ms and gaps.gap_factor must be positive"
        );
        anyhow::ensure!(
            self.retention.window_minutes > 0,
            "retention.window_minutes must be positive"
        );
        Ok(())
    }

    /// Load from `explicit`, else from `$TRENDCACHE_CONFIG`, else defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn host_names(&self) -> Vec<String> {
        self.hosts.iter().map(|h| h.host.clone()).collect()
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from)
}
