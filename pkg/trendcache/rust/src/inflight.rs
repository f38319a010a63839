// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Registry of backfill fetches currently in flight.
//!
//! Two backfills for the same host whose ranges intersect would fetch and
//! merge the same data twice; the second is refused while the first is
//! pending. Entries are released on completion or failure, so a later range
//! change may ask again.

use crate::errors::{Error, Result};
use crate::gaps::FetchRange;
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
struct FetchRequest {
    host: String,
    range: FetchRange,
}

impl FetchRequest {
    fn overlaps(&self, host: &str, range: &FetchRange) -> bool {
        self.host == host && self.range.start < range.end && range.start < self.range.end
    }
}

#[derive(Debug, Default)]
pub struct InflightRegistry {
    requests: HashMap<Uuid, FetchRequest>,
}

impl InflightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_request(&mut self, host: &str, range: FetchRange) -> Result<Uuid> {
        if self.requests.values().any(|r| r.overlaps(host, &range)) {
            return Err(Error::Overlaps {
                host: host.to_string(),
            });
        }

        let id = Uuid::new_v4();
        self.requests.insert(
            id,
            FetchRequest {
                host: host.to_string(),
                range,
            },
        );
        Ok(id)
    }

    pub fn mark_completed(&mut self, id: Uuid) {
        if self.requests.remove(&id).is_none() {
            warn!(%id, "completed request not found");
        }
    }

    pub fn mark_failed(&mut self, id: Uuid, error: &str) {
        match self.requests.remove(&id) {
            Some(req) => warn!(host = %req.host, range = %req.range, error, "backfill failed"),
            None => warn!(%id, "failed request not found"),
        }
    }

    pub fn pending(&self) -> usize {
        self.requests.len()
    }

    pub fn is_pending(&self, host: &str) -> bool {
        self.requests.values().any(|r| r.host == host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: i64, end: i64) -> FetchRange {
        FetchRange::new(start, end).unwrap()
    }

    #[test]
    fn test_duplicate_pending_request_overlaps() {
        let mut reg = InflightRegistry::new();
        reg.add_request("a", range(0, 100)).unwrap();

        assert!(matches!(
            reg.add_request("a", range(0, 100)),
            Err(Error::Overlaps { .. })
        ));
        assert!(matches!(
            reg.add_request("a", range(50, 150)),
            Err(Error::Overlaps { .. })
        ));
        // Adjacent ranges and other hosts are independent.
        reg.add_request("a", range(100, 200)).unwrap();
        reg.add_request("b", range(0, 100)).unwrap();
        assert_eq!(reg.pending(), 3);
    }

    #[test]
    fn test_completion_and_failure_release() {
        let mut reg = InflightRegistry::new();
        let id = reg.add_request("a", range(0, 100)).unwrap();
        reg.mark_completed(id);
        assert!(!reg.is_pending("a"));

        let id = reg.add_request("a", range(0, 100)).unwrap();
        reg.mark_failed(id, "timeout");
        assert_eq!(reg.pending(), 0);
        reg.add_request("a", range(0, 100)).unwrap();
    }
}
