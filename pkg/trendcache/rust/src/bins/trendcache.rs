// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Latency trend cache service.
//!
//! # Usage
//!
//! ```bash
//! trendcache
//! trendcache --config /etc/trendcache.yaml --port 8050
//! RUST_LOG=latency_trendcache=debug trendcache --json-logs
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use latency_trendcache::{server, Config, HttpBackend, Session};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "trendcache")]
#[command(about = "Time-series cache and render API for the latency dashboard")]
#[command(version)]
struct Args {
    /// YAML configuration file
    #[arg(long, env = "TRENDCACHE_CONFIG")]
    config: Option<PathBuf>,

    /// Port for the HTTP API (overrides listen_port)
    #[arg(short, long)]
    port: Option<u16>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn spawn_status_poller(session: Arc<Session>, interval_ms: u64) {
    if interval_ms == 0 {
        info!("status polling disabled");
        return;
    }
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            // Failures are logged by the session; the previous table stays.
            if let Ok(added) = session.poll_status().await {
                debug!(added, "status poll");
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.json_logs);

    let config = Config::resolve(args.config.as_deref())?;
    let port = args.port.unwrap_or(config.listen_port);
    info!(
        backend = %config.backend_url,
        hosts = config.hosts.len(),
        poll_interval_ms = config.poll_interval_ms,
        "starting trendcache"
    );

    let backend = HttpBackend::new(&config.backend_url, config.request_timeout())
        .context("Failed to create backend client")?;
    let session = Arc::new(Session::new(Arc::new(backend), &config));

    spawn_status_poller(session.clone(), config.poll_interval_ms);
    server::run_server(session, port).await
}
