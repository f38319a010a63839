// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("backend request failed: {0}")]
    Transport(String),
    #[error("could not decode backend response: {context}")]
    Decode { context: String },
    #[error("invalid range [{start}, {end}]")]
    InvalidRange { start: i64, end: i64 },
    #[error("at most {limit} hosts can be selected")]
    SelectionFull { limit: usize },
    #[error("no monitoring data for host {0}")]
    NoData(String),
    #[error("request overlaps with a pending request for {host}")]
    Overlaps { host: String },
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::Decode {
                context: err.to_string(),
            }
        } else {
            Error::Transport(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
