//! Per-case state machine.
//!
//! A [`Case`] tracks one process instance from its first event to a
//! terminal verdict. It consumes events one at a time, keeps the full
//! trace and timing history, and re-derives its classification after
//! every event and at every window close.
//!
//! ## Status transitions
//!
//! ```text
//! Ongoing -> Complete | Cancelled-bucketed Complete | Incomplete
//! Incomplete -> Ongoing | Complete   (non-terminal, can re-open)
//! Complete, Cancelled                (terminal, never re-evaluated)
//! ```
//!
//! Two flag disciplines coexist on purpose and must not be normalized:
//! `cancelled` is sticky (OR-accumulated across events), while
//! `is_billed` / `is_unbillable` are recomputed from the latest state on
//! every event and can flip in either direction. A case whose state
//! reverts from "Billed" before termination genuinely re-opens.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::event::EventRecord;
use crate::rules::{CompletenessRules, STATE_BILLED, STATE_UNBILLABLE};
use crate::status::{CaseStatus, TransitionLedger};

/// State of one process instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    case_id: String,
    last_state: String,
    last_event: String,
    unique_events: BTreeSet<String>,
    /// Event names in arrival order.
    trace: Vec<String>,
    /// Sticky: once an event carries `isCancelled`, stays true.
    cancelled: bool,
    /// Derived from `last_state` on every event; not sticky.
    is_billed: bool,
    /// Derived from `last_state` on every event; not sticky.
    is_unbillable: bool,
    final_status: CaseStatus,
    ongoing: bool,
    /// Required events not yet observed, as of the last evaluation.
    missing_events: BTreeSet<String>,
    /// Inter-event gaps; the first entry is always zero.
    #[serde(with = "gap_seconds")]
    event_gaps: Vec<Duration>,
    /// Cumulative mean of `event_gaps`.
    #[serde(with = "gap_seconds_single")]
    avg_wait: Duration,
    #[serde(with = "crate::event::timestamp_format")]
    first_event_time: NaiveDateTime,
    #[serde(with = "crate::event::timestamp_format")]
    last_event_time: NaiveDateTime,
    /// Consecutive windows without an event for this case.
    inactivity_counter: u32,
    /// Window in which the case was first seen.
    first_window: String,
    /// Window of the most recent event.
    last_window_update: String,
    ledger: TransitionLedger,
}

impl Case {
    /// Create a case from its first event (first-seen semantics: an
    /// unknown `case_id` is never an error).
    pub fn new(event: &EventRecord, rules: &CompletenessRules, window_name: &str) -> Self {
        let mut case = Self {
            case_id: event.case_id.clone(),
            last_state: event.state.clone(),
            last_event: event.event_name.clone(),
            unique_events: BTreeSet::from([event.event_name.clone()]),
            trace: vec![event.event_name.clone()],
            cancelled: event.is_cancelled,
            is_billed: event.state == STATE_BILLED,
            is_unbillable: event.state == STATE_UNBILLABLE,
            final_status: CaseStatus::Ongoing,
            ongoing: true,
            missing_events: BTreeSet::new(),
            event_gaps: vec![Duration::zero()],
            avg_wait: Duration::zero(),
            first_event_time: event.complete_time,
            last_event_time: event.complete_time,
            inactivity_counter: 0,
            first_window: window_name.to_string(),
            last_window_update: window_name.to_string(),
            ledger: TransitionLedger::new(),
        };
        case.evaluate_completeness(rules, window_name);
        case
    }

    /// Apply one event for this case's id, then re-evaluate.
    ///
    /// Resets the inactivity counter: a case that received any event in
    /// a window can never be swept inactive in that same window.
    pub fn apply_event(&mut self, event: &EventRecord, rules: &CompletenessRules, window_name: &str) {
        self.last_event = event.event_name.clone();
        self.last_state = event.state.clone();
        self.unique_events.insert(event.event_name.clone());
        self.trace.push(event.event_name.clone());

        let gap = event.complete_time - self.last_event_time;
        self.event_gaps.push(gap);
        self.avg_wait = mean_gap(&self.event_gaps);
        self.last_event_time = event.complete_time;

        self.cancelled |= event.is_cancelled;
        self.is_billed = self.last_state == STATE_BILLED;
        self.is_unbillable = self.last_state == STATE_UNBILLABLE;

        self.inactivity_counter = 0;
        self.last_window_update = window_name.to_string();

        self.evaluate_completeness(rules, window_name);
    }

    /// Re-derive the classification from current fields.
    ///
    /// Decision order:
    /// 1. cancelled short-circuits everything: the case is finalized
    ///    regardless of trace content;
    /// 2. otherwise the required-event set depends on `is_unbillable`;
    /// 3. a case still in flight (neither cancelled, billed nor
    ///    unbillable) stays `Ongoing`;
    /// 4. missing required events means `Incomplete`, else `Complete`.
    ///
    /// Idempotent: a second call with no intervening event yields the
    /// same status and appends no duplicate transition. Terminal cases
    /// are never re-evaluated.
    pub fn evaluate_completeness(&mut self, rules: &CompletenessRules, window_name: &str) {
        if self.final_status.is_terminal() {
            return;
        }

        if self.cancelled {
            self.ongoing = false;
            self.set_status(CaseStatus::Complete, window_name, "case cancelled");
            return;
        }

        self.missing_events = rules.missing_from(self.is_unbillable, &self.unique_events);
        let have_critical_events = self.missing_events.is_empty();
        self.ongoing = !(self.cancelled || self.is_billed || self.is_unbillable);

        if self.ongoing {
            self.set_status(CaseStatus::Ongoing, window_name, "trace not finalised");
        } else if !have_critical_events {
            let reason = format!(
                "missing events: {}",
                self.missing_events.iter().cloned().collect::<Vec<_>>().join(", ")
            );
            self.set_status(CaseStatus::Incomplete, window_name, &reason);
        } else {
            self.set_status(CaseStatus::Complete, window_name, "all required events observed");
        }
    }

    /// Force a terminal verdict on a case the log stopped mentioning.
    ///
    /// Invoked only by the inactivity sweep. Unconditionally marks the
    /// case `Incomplete`, even when it was only missing the "finalized"
    /// condition. No-op on already-terminal cases.
    pub fn force_inactive(&mut self, window_name: &str) {
        if self.final_status.is_terminal() {
            return;
        }
        self.ongoing = false;
        self.set_status(CaseStatus::Incomplete, window_name, "exceeded inactivity limit");
    }

    fn set_status(&mut self, to: CaseStatus, window_name: &str, reason: &str) {
        if self.final_status != to {
            self.ledger.record(self.final_status, to, window_name, reason);
            self.final_status = to;
        }
    }

    /// Which window bucket the case belongs to right now. Cancellation
    /// wins over everything else; otherwise the bucket mirrors the
    /// status.
    pub fn bucket(&self) -> CaseStatus {
        if self.cancelled {
            CaseStatus::Cancelled
        } else {
            self.final_status
        }
    }

    // ── Inactivity bookkeeping ───────────────────────────────────────

    /// Called once at the start of every window for every known case.
    pub fn bump_inactivity(&mut self) {
        self.inactivity_counter += 1;
    }

    pub fn inactivity_counter(&self) -> u32 {
        self.inactivity_counter
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn case_id(&self) -> &str {
        &self.case_id
    }

    pub fn final_status(&self) -> CaseStatus {
        self.final_status
    }

    pub fn is_terminal(&self) -> bool {
        self.final_status.is_terminal()
    }

    pub fn cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn is_billed(&self) -> bool {
        self.is_billed
    }

    pub fn is_unbillable(&self) -> bool {
        self.is_unbillable
    }

    pub fn ongoing(&self) -> bool {
        self.ongoing
    }

    pub fn last_state(&self) -> &str {
        &self.last_state
    }

    pub fn last_event(&self) -> &str {
        &self.last_event
    }

    pub fn trace(&self) -> &[String] {
        &self.trace
    }

    pub fn length(&self) -> usize {
        self.trace.len()
    }

    pub fn unique_events(&self) -> &BTreeSet<String> {
        &self.unique_events
    }

    pub fn missing_events(&self) -> &BTreeSet<String> {
        &self.missing_events
    }

    pub fn avg_wait(&self) -> Duration {
        self.avg_wait
    }

    pub fn first_event_time(&self) -> NaiveDateTime {
        self.first_event_time
    }

    pub fn last_event_time(&self) -> NaiveDateTime {
        self.last_event_time
    }

    pub fn first_window(&self) -> &str {
        &self.first_window
    }

    pub fn last_window_update(&self) -> &str {
        &self.last_window_update
    }

    pub fn ledger(&self) -> &TransitionLedger {
        &self.ledger
    }
}

/// Cumulative mean of all gaps seen so far (not windowed).
fn mean_gap(gaps: &[Duration]) -> Duration {
    if gaps.is_empty() {
        return Duration::zero();
    }
    let total = gaps.iter().fold(Duration::zero(), |acc, g| acc + *g);
    total / gaps.len() as i32
}

mod gap_seconds {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(gaps: &[Duration], s: S) -> Result<S::Ok, S::Error> {
        gaps.iter().map(Duration::num_seconds).collect::<Vec<_>>().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Duration>, D::Error> {
        Ok(Vec::<i64>::deserialize(d)?.into_iter().map(Duration::seconds).collect())
    }
}

mod gap_seconds_single {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(gap: &Duration, s: S) -> Result<S::Ok, S::Error> {
        gap.num_seconds().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::seconds(i64::deserialize(d)?))
    }
}
