// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Host line colors and packet-loss shading.

/// Line colors assigned to selected hosts by selection index.
pub const HOST_PALETTE: [&str; 5] = ["#3182ce", "#38a169", "#d69e2e", "#e53e3e", "#805ad5"];

pub fn host_color(index: usize) -> &'static str {
    HOST_PALETTE[index % HOST_PALETTE.len()]
}

/// SmokePing-style packet-loss bucket color. Zero loss keeps the host color.
pub fn loss_color(loss: f64, host_color: &str) -> &str {
    match loss {
        l if l <= 0.0 => host_color,
        l if l <= 1.0 => "#ffff00",
        l if l <= 5.0 => "#ffa500",
        l if l <= 20.0 => "#ff6600",
        l if l < 100.0 => "#ff69b4",
        _ => "#ff0000",
    }
}
