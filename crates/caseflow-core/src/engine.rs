//! Sequential case-classification engine.
//!
//! The engine owns the case registry and processes windows strictly one
//! at a time, in chronological order. Per window:
//!
//! 1. every known case gets one more silent window on its inactivity
//!    counter;
//! 2. every event is routed to its case (created on first sight),
//!    driving the state machine and resetting that case's counter;
//! 3. every known case is re-evaluated and placed into exactly one of
//!    the window's status buckets;
//! 4. the inactivity sweep forces silent, non-terminal cases to
//!    `Incomplete` and they are re-bucketed;
//! 5. the window is finalized into an immutable report.
//!
//! A case's fields at the start of window N reflect exactly its history
//! through the end of window N-1. The engine never re-sorts events; it
//! relies on the upstream splitter for global timestamp order.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

use crate::case::Case;
use crate::error::{CoreError, Result};
use crate::event::EventRecord;
use crate::inactivity::InactivityMonitor;
use crate::rules::CompletenessRules;
use crate::status::CaseStatus;
use crate::window::{WindowReport, WindowStats};

/// Incremental classifier over a windowed event log.
#[derive(Debug, Clone)]
pub struct CaseEngine {
    cases: BTreeMap<String, Case>,
    rules: CompletenessRules,
    monitor: InactivityMonitor,
    processed_windows: BTreeSet<String>,
}

impl CaseEngine {
    pub fn new(rules: CompletenessRules, monitor: InactivityMonitor) -> Self {
        Self {
            cases: BTreeMap::new(),
            rules,
            monitor,
            processed_windows: BTreeSet::new(),
        }
    }

    /// Process one window's events and return its finalized report.
    ///
    /// Window names must be unique across the run; reports are
    /// attributed by name, so a repeat fails fast instead of silently
    /// merging two time slices.
    pub fn process_window(&mut self, window_name: &str, events: &[EventRecord]) -> Result<WindowReport> {
        if !self.processed_windows.insert(window_name.to_string()) {
            return Err(CoreError::DuplicateWindow(window_name.to_string()));
        }

        let mut stats = WindowStats::new(window_name);
        self.monitor.begin_window(&mut self.cases);

        for event in events {
            stats.record_event(event);
            match self.cases.entry(event.case_id.clone()) {
                Entry::Occupied(mut occupied) => {
                    occupied.get_mut().apply_event(event, &self.rules, window_name);
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(Case::new(event, &self.rules, window_name));
                    stats.record_new_case();
                }
            }
        }

        // Classify everything known by window close, touched or not.
        for case in self.cases.values_mut() {
            case.evaluate_completeness(&self.rules, window_name);
            stats.classify(case);
        }

        // Events first, sweep second: a case updated this window can
        // never be forced inactive for this window.
        let forced = self.monitor.sweep(&mut self.cases, window_name);
        for id in &forced {
            if let Some(case) = self.cases.get(id) {
                stats.classify(case);
            }
        }

        let report = stats.generate_report();
        info!(
            window = window_name,
            events = report.total_events,
            new_cases = report.new_cases,
            forced = forced.len(),
            classified = report.cases_classified(),
            "processed window"
        );
        Ok(report)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn case(&self, case_id: &str) -> Option<&Case> {
        self.cases.get(case_id)
    }

    pub fn cases(&self) -> impl Iterator<Item = &Case> {
        self.cases.values()
    }

    pub fn case_count(&self) -> usize {
        self.cases.len()
    }

    pub fn rules(&self) -> &CompletenessRules {
        &self.rules
    }

    pub fn monitor(&self) -> &InactivityMonitor {
        &self.monitor
    }

    /// Final status per case after the full run, used as retrospective
    /// ground truth by the evaluator.
    pub fn final_statuses(&self) -> BTreeMap<String, CaseStatus> {
        self.cases
            .iter()
            .map(|(id, case)| (id.clone(), case.final_status()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use proptest::prelude::*;

    fn at(month: u32, day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, month, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn ev(case_id: &str, name: &str, state: &str, time: NaiveDateTime) -> EventRecord {
        EventRecord {
            case_id: case_id.to_string(),
            event_name: name.to_string(),
            state: state.to_string(),
            complete_time: time,
            is_cancelled: false,
        }
    }

    fn engine(limit: u32) -> CaseEngine {
        CaseEngine::new(CompletenessRules::default(), InactivityMonitor::new(limit))
    }

    #[test]
    fn duplicate_window_name_fails_fast() {
        let mut engine = engine(2);
        engine.process_window("w1", &[]).unwrap();
        let err = engine.process_window("w1", &[]).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateWindow(name) if name == "w1"));
    }

    #[test]
    fn silent_case_is_forced_when_counter_first_exceeds_limit() {
        let mut engine = engine(2);
        let report = engine
            .process_window(
                "w1",
                &[
                    ev("C1", "BILLED", "InProgress", at(1, 1, 9)),
                    ev("C1", "FIN", "InProgress", at(1, 1, 10)),
                ],
            )
            .unwrap();
        assert!(report.ongoing_cases.contains("C1"));

        // Silent windows: counter 1, then 2 (== limit, still ongoing).
        let w2 = engine.process_window("w2", &[]).unwrap();
        assert!(w2.ongoing_cases.contains("C1"));
        let w3 = engine.process_window("w3", &[]).unwrap();
        assert!(w3.ongoing_cases.contains("C1"));

        // Counter 3 exceeds the limit: forced exactly here.
        let w4 = engine.process_window("w4", &[]).unwrap();
        assert!(w4.incomplete_cases.contains("C1"));
        assert_eq!(
            engine.case("C1").unwrap().final_status(),
            CaseStatus::Incomplete
        );
        assert_eq!(
            engine.case("C1").unwrap().ledger().transitions()[0].reason,
            "exceeded inactivity limit"
        );
    }

    #[test]
    fn event_in_sweep_window_prevents_forcing() {
        let mut engine = engine(1);
        engine
            .process_window("w1", &[ev("A", "NEW", "InProgress", at(1, 1, 9))])
            .unwrap();
        engine.process_window("w2", &[]).unwrap();

        // Counter would exceed the limit this window, but the event
        // resets it before the sweep runs.
        let w3 = engine
            .process_window("w3", &[ev("A", "FIN", "InProgress", at(1, 20, 9))])
            .unwrap();
        assert!(w3.ongoing_cases.contains("A"));
        assert_eq!(engine.case("A").unwrap().inactivity_counter(), 0);
    }

    #[test]
    fn cancelled_on_only_event_is_terminal_in_same_window() {
        let mut engine = engine(2);
        let event = EventRecord {
            is_cancelled: true,
            ..ev("C2", "NEW", "InProgress", at(1, 1, 9))
        };
        let report = engine.process_window("w1", &[event]).unwrap();

        assert!(report.cancelled_cases.contains("C2"));
        assert_eq!(report.new_cases, 1);
        let case = engine.case("C2").unwrap();
        assert_eq!(case.final_status(), CaseStatus::Complete);
        assert!(case.is_terminal());
    }

    #[test]
    fn unbillable_case_completes_via_rejected_set_across_windows() {
        let mut engine = engine(10);
        engine
            .process_window(
                "w1",
                &[
                    ev("C3", "BILLED", "InProgress", at(1, 1, 9)),
                    ev("C3", "FIN", "InProgress", at(1, 2, 9)),
                    ev("C3", "RELEASE", "InProgress", at(1, 3, 9)),
                ],
            )
            .unwrap();
        let w2 = engine
            .process_window(
                "w2",
                &[
                    ev("C3", "CODE OK", "InProgress", at(2, 1, 9)),
                    ev("C3", "STORNO", "Unbillable", at(2, 2, 9)),
                    ev("C3", "REJECT", "Unbillable", at(2, 3, 9)),
                ],
            )
            .unwrap();
        // Unbillable but still missing SET STATUS.
        assert!(w2.incomplete_cases.contains("C3"));

        let w3 = engine
            .process_window("w3", &[ev("C3", "SET STATUS", "Unbillable", at(3, 1, 9))])
            .unwrap();
        assert!(w3.complete_cases.contains("C3"));
        assert!(!engine.case("C3").unwrap().is_billed());
    }

    #[test]
    fn pre_existing_cases_are_classified_every_window() {
        let mut engine = engine(10);
        engine
            .process_window("w1", &[ev("A", "NEW", "InProgress", at(1, 1, 9))])
            .unwrap();
        // A produces nothing in w2 but must still land in a bucket.
        let w2 = engine
            .process_window("w2", &[ev("B", "NEW", "InProgress", at(2, 1, 9))])
            .unwrap();
        assert_eq!(w2.cases_classified(), 2);
        assert!(w2.ongoing_cases.contains("A"));
        assert!(w2.ongoing_cases.contains("B"));
    }

    #[test]
    fn terminal_status_survives_later_events_and_sweeps() {
        let mut engine = engine(0);
        let cancel = EventRecord {
            is_cancelled: true,
            ..ev("A", "STORNO", "Cancelled", at(1, 1, 9))
        };
        engine.process_window("w1", &[cancel]).unwrap();

        // Later event and an aggressive sweep must not move the case.
        let w2 = engine
            .process_window("w2", &[ev("A", "NEW", "InProgress", at(2, 1, 9))])
            .unwrap();
        assert!(w2.cancelled_cases.contains("A"));
        let w3 = engine.process_window("w3", &[]).unwrap();
        assert!(w3.cancelled_cases.contains("A"));
        assert_eq!(engine.case("A").unwrap().final_status(), CaseStatus::Complete);
    }

    #[test]
    fn final_statuses_mirror_the_registry() {
        let mut engine = engine(2);
        let cancel = EventRecord {
            is_cancelled: true,
            ..ev("B", "STORNO", "Cancelled", at(1, 2, 9))
        };
        engine
            .process_window("w1", &[ev("A", "NEW", "InProgress", at(1, 1, 9)), cancel])
            .unwrap();

        let truth = engine.final_statuses();
        assert_eq!(truth["A"], CaseStatus::Ongoing);
        assert_eq!(truth["B"], CaseStatus::Complete);
        assert_eq!(truth.len(), engine.case_count());
    }

    // ── Property tests ───────────────────────────────────────────────

    const EVENT_NAMES: [&str; 7] = ["NEW", "FIN", "RELEASE", "CODE OK", "BILLED", "STORNO", "CHANGE DIAGN"];
    const STATES: [&str; 4] = ["InProgress", "Billed", "Unbillable", "Closed"];

    fn arb_event(case_pool: usize) -> impl Strategy<Value = (usize, usize, usize, bool)> {
        (0..case_pool, 0..EVENT_NAMES.len(), 0..STATES.len(), proptest::bool::weighted(0.05))
    }

    proptest! {
        /// Every known case lands in exactly one bucket, every window.
        #[test]
        fn buckets_are_exhaustive_and_disjoint(
            windows in proptest::collection::vec(
                proptest::collection::vec(arb_event(6), 0..12),
                1..6,
            )
        ) {
            let mut engine = engine(1);
            let mut tick = 0u32;
            for (w, window) in windows.iter().enumerate() {
                let events: Vec<EventRecord> = window
                    .iter()
                    .map(|&(case, name, state, cancelled)| {
                        tick += 1;
                        EventRecord {
                            case_id: format!("case-{case}"),
                            event_name: EVENT_NAMES[name].to_string(),
                            state: STATES[state].to_string(),
                            complete_time: at(1, 1, 0) + chrono::Duration::minutes(tick as i64),
                            is_cancelled: cancelled,
                        }
                    })
                    .collect();
                let report = engine.process_window(&format!("w{w}"), &events).unwrap();

                prop_assert!(report.buckets_disjoint());
                prop_assert_eq!(report.cases_classified(), engine.case_count());
            }
        }

        /// Once terminal, a case's status never changes again.
        #[test]
        fn terminal_statuses_are_monotonic(
            windows in proptest::collection::vec(
                proptest::collection::vec(arb_event(4), 0..10),
                2..6,
            )
        ) {
            let mut engine = engine(1);
            let mut terminal_at: BTreeMap<String, CaseStatus> = BTreeMap::new();
            let mut tick = 0u32;
            for (w, window) in windows.iter().enumerate() {
                let events: Vec<EventRecord> = window
                    .iter()
                    .map(|&(case, name, state, cancelled)| {
                        tick += 1;
                        EventRecord {
                            case_id: format!("case-{case}"),
                            event_name: EVENT_NAMES[name].to_string(),
                            state: STATES[state].to_string(),
                            complete_time: at(1, 1, 0) + chrono::Duration::minutes(tick as i64),
                            is_cancelled: cancelled,
                        }
                    })
                    .collect();
                engine.process_window(&format!("w{w}"), &events).unwrap();

                for case in engine.cases() {
                    if let Some(&frozen) = terminal_at.get(case.case_id()) {
                        prop_assert_eq!(case.final_status(), frozen);
                    } else if case.is_terminal() {
                        terminal_at.insert(case.case_id().to_string(), case.final_status());
                    }
                }
            }
        }
    }
}
