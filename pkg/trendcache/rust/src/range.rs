// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Displayed time window and its transitions.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Preset windows offered to the user, in minutes.
pub const PRESET_MINUTES: [u32; 9] = [10, 30, 60, 180, 720, 1440, 2880, 10080, 43200];

pub const DEFAULT_PRESET_MINUTES: u32 = 10;

/// An absolute range ending this close to now may collapse back to a preset.
pub const COLLAPSE_TOLERANCE_MS: i64 = 60_000;

const MINUTE_MS: i64 = 60_000;

/// The window the chart shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayRange {
    /// Trailing window that follows now
    Relative { minutes: u32 },

    /// Frozen `[start, end]` in epoch-ms
    Absolute { start: i64, end: i64 },
}

impl Default for DisplayRange {
    fn default() -> Self {
        DisplayRange::Relative {
            minutes: DEFAULT_PRESET_MINUTES,
        }
    }
}

impl DisplayRange {
    pub fn is_relative(&self) -> bool {
        matches!(self, DisplayRange::Relative { .. })
    }

    pub fn window_ms(&self) -> i64 {
        match *self {
            DisplayRange::Relative { minutes } => i64::from(minutes) * MINUTE_MS,
            DisplayRange::Absolute { start, end } => end - start,
        }
    }

    /// Concrete `[start, end]` the window covers at `now_ms`.
    pub fn bounds(&self, now_ms: i64) -> (i64, i64) {
        match *self {
            DisplayRange::Relative { .. } => (now_ms - self.window_ms(), now_ms),
            DisplayRange::Absolute { start, end } => (start, end),
        }
    }

    /// Bounds used to filter cached points. A relative window stays open at
    /// the right so samples stamped slightly after `now_ms` still show.
    pub fn filter_bounds(&self, now_ms: i64) -> (i64, i64) {
        match *self {
            DisplayRange::Relative { .. } => (now_ms - self.window_ms(), i64::MAX),
            DisplayRange::Absolute { start, end } => (start, end),
        }
    }
}

impl fmt::Display for DisplayRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayRange::Relative { minutes } => write!(f, "last {minutes}m"),
            DisplayRange::Absolute { start, end } => write!(f, "{start}..{end}"),
        }
    }
}

/// Result of a range change. Callers backfill selected hosts over `current`
/// and refresh the backend step for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub previous: DisplayRange,
    pub current: DisplayRange,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

#[derive(Debug, Default)]
pub struct RangeController {
    range: DisplayRange,
    /// The custom-range editor is open. Any transition closes it.
    custom_open: bool,
}

impl RangeController {
    pub fn new(range: DisplayRange) -> Self {
        Self {
            range,
            custom_open: false,
        }
    }

    pub fn current(&self) -> DisplayRange {
        self.range
    }

    pub fn custom_open(&self) -> bool {
        self.custom_open
    }

    pub fn open_custom(&mut self) {
        self.custom_open = true;
    }

    fn transition(&mut self, next: DisplayRange) -> Transition {
        let previous = self.range;
        self.range = next;
        self.custom_open = false;
        Transition {
            previous,
            current: next,
        }
    }

    pub fn select_preset(&mut self, minutes: u32) -> Result<Transition> {
        if minutes == 0 {
            return Err(Error::InvalidRange { start: 0, end: 0 });
        }
        Ok(self.transition(DisplayRange::Relative { minutes }))
    }

    /// Switch to `[start, end]`, collapsing to a preset when the range ends
    /// within [`COLLAPSE_TOLERANCE_MS`] of now and matches one in length.
    pub fn apply_absolute(&mut self, start: i64, end: i64, now_ms: i64) -> Result<Transition> {
        if start >= end {
            return Err(Error::InvalidRange { start, end });
        }

        let next = match collapse_to_preset(start, end, now_ms) {
            Some(minutes) => DisplayRange::Relative { minutes },
            None => DisplayRange::Absolute { start, end },
        };
        Ok(self.transition(next))
    }

    /// Drag-zoom result from the resolver.
    pub fn zoom(&mut self, start: i64, end: i64, now_ms: i64) -> Result<Transition> {
        self.apply_absolute(start, end, now_ms)
    }

    pub fn reset(&mut self) -> Transition {
        self.transition(DisplayRange::default())
    }
}

/// Whole minutes in `[start, end]`, rounded, at least one.
pub fn duration_minutes(start: i64, end: i64) -> i64 {
    ((end - start + MINUTE_MS / 2) / MINUTE_MS).max(1)
}

fn collapse_to_preset(start: i64, end: i64, now_ms: i64) -> Option<u32> {
    if (now_ms - end).abs() > COLLAPSE_TOLERANCE_MS {
        return None;
    }
    let minutes = duration_minutes(start, end);
    PRESET_MINUTES
        .iter()
        .copied()
        .find(|&p| i64::from(p) == minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn test_default_is_ten_minutes() {
        let ctl = RangeController::default();
        assert_eq!(ctl.current(), DisplayRange::Relative { minutes: 10 });
        assert_eq!(ctl.current().bounds(NOW), (NOW - 600_000, NOW));
    }

    #[test]
    fn test_absolute_near_now_collapses_to_preset() {
        let mut ctl = RangeController::default();
        let t = ctl
            .apply_absolute(NOW - 3_600_000 + 20_000, NOW + 20_000, NOW)
            .unwrap();
        assert_eq!(t.current, DisplayRange::Relative { minutes: 60 });
    }

    #[test]
    fn test_absolute_in_the_past_stays_absolute() {
        let mut ctl = RangeController::default();
        let t = ctl
            .apply_absolute(NOW - 7_200_000, NOW - 3_600_000, NOW)
            .unwrap();
        assert_eq!(
            t.current,
            DisplayRange::Absolute {
                start: NOW - 7_200_000,
                end: NOW - 3_600_000
            }
        );
        assert!(t.changed());
    }

    #[test]
    fn test_absolute_near_now_with_odd_duration_stays_absolute() {
        let mut ctl = RangeController::default();
        let t = ctl.apply_absolute(NOW - 17 * 60_000, NOW, NOW).unwrap();
        assert!(!t.current.is_relative());
    }

    #[test]
    fn test_invalid_ranges_rejected() {
        let mut ctl = RangeController::default();
        assert!(matches!(
            ctl.apply_absolute(NOW, NOW, NOW),
            Err(Error::InvalidRange { .. })
        ));
        assert!(ctl.select_preset(0).is_err());
        assert_eq!(ctl.current(), DisplayRange::default());
    }

    #[test]
    fn test_transitions_close_custom_editor() {
        let mut ctl = RangeController::default();
        ctl.open_custom();
        assert!(ctl.custom_open());
        ctl.select_preset(30).unwrap();
        assert!(!ctl.custom_open());
    }

    #[test]
    fn test_duration_minutes() {
        assert_eq!(duration_minutes(0, 10), 1);
        assert_eq!(duration_minutes(0, 89_999), 1);
        assert_eq!(duration_minutes(0, 90_000), 2);
    }

    #[test]
    fn test_filter_bounds_open_for_relative() {
        let r = DisplayRange::Relative { minutes: 10 };
        assert_eq!(r.filter_bounds(NOW), (NOW - 600_000, i64::MAX));
        let a = DisplayRange::Absolute { start: 1, end: 2 };
        assert_eq!(a.filter_bounds(NOW), (1, 2));
    }
}
