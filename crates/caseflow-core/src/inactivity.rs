//! Inactivity monitoring.
//!
//! The log stops mentioning some cases (crash, silent drop, archival)
//! without ever producing a terminal event. The monitor counts, per
//! case, how many consecutive windows passed without an update, and
//! forces a verdict once the count exceeds a limit so every window's
//! buckets stay exhaustive over all known cases.
//!
//! The limit is a logical window count derived from a maximum-allowed
//! silence in days and the window granularity, not a wall-clock timer.

use std::collections::BTreeMap;
use tracing::debug;

use crate::case::Case;
use crate::splitter::Granularity;

/// End-of-window sweep that forces silent cases to `Incomplete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InactivityMonitor {
    /// Maximum consecutive silent windows before a case is forced.
    limit: u32,
}

impl InactivityMonitor {
    pub fn new(limit: u32) -> Self {
        Self { limit }
    }

    /// Derive the window-count limit from a silence budget in days.
    /// Rounded to the nearest whole window, never below 1.
    pub fn from_silence_days(max_silence_days: u32, granularity: Granularity) -> Self {
        let limit = (max_silence_days as f64 / granularity.days() as f64).round() as u32;
        Self { limit: limit.max(1) }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Start-of-window pass: every known case gets one more silent
    /// window on the clock. Cases updated later in the window reset to
    /// zero when their event is applied.
    pub fn begin_window(&self, cases: &mut BTreeMap<String, Case>) {
        for case in cases.values_mut() {
            case.bump_inactivity();
        }
    }

    /// End-of-window pass: force every case whose counter exceeds the
    /// limit and which is not already terminal. Runs after all events
    /// of the window were applied, so a case with any update this
    /// window cannot be swept. Returns the ids that were forced.
    pub fn sweep(&self, cases: &mut BTreeMap<String, Case>, window_name: &str) -> Vec<String> {
        let mut forced = Vec::new();
        for case in cases.values_mut() {
            if case.inactivity_counter() > self.limit && !case.is_terminal() {
                case.force_inactive(window_name);
                forced.push(case.case_id().to_string());
            }
        }
        if !forced.is_empty() {
            debug!(window = window_name, count = forced.len(), "inactivity sweep forced cases");
        }
        forced
    }
}
