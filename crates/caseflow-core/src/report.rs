//! Flat CSV persistence for run results.
//!
//! Two snapshots are written after a run: one row per case with its
//! final verdict and history, and one row per window with event counts
//! and bucket membership. Set-valued cells are `;`-joined; the
//! event-count map is stored as a JSON cell. Window reports can be read
//! back for retrospective evaluation.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::info;

use crate::case::Case;
use crate::error::Result;
use crate::event::TIMESTAMP_FORMAT;
use crate::status::CaseStatus;
use crate::window::WindowReport;

const SET_SEPARATOR: &str = ";";

/// One output row per case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseSnapshotRow {
    pub case_id: String,
    pub final_status: CaseStatus,
    pub cancelled: bool,
    pub is_billed: bool,
    pub is_unbillable: bool,
    pub trace: String,
    pub unique_events: String,
    pub missing_events: String,
    pub length: usize,
    /// Cumulative mean inter-event gap, in seconds.
    pub avg_wait_time: i64,
    pub inactivity_counter: u32,
    pub status_transitions: String,
    pub first_transition_to: String,
    pub first_event_time: String,
    pub last_event_time: String,
    pub first_window: String,
    pub last_window_update: String,
}

impl From<&Case> for CaseSnapshotRow {
    fn from(case: &Case) -> Self {
        Self {
            case_id: case.case_id().to_string(),
            final_status: case.final_status(),
            cancelled: case.cancelled(),
            is_billed: case.is_billed(),
            is_unbillable: case.is_unbillable(),
            trace: case.trace().join(SET_SEPARATOR),
            unique_events: join_set(case.unique_events()),
            missing_events: join_set(case.missing_events()),
            length: case.length(),
            avg_wait_time: case.avg_wait().num_seconds(),
            inactivity_counter: case.inactivity_counter(),
            status_transitions: case
                .ledger()
                .transitions()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(SET_SEPARATOR),
            first_transition_to: case
                .ledger()
                .first_transition_to()
                .map(|s| s.to_string())
                .unwrap_or_default(),
            first_event_time: case.first_event_time().format(TIMESTAMP_FORMAT).to_string(),
            last_event_time: case.last_event_time().format(TIMESTAMP_FORMAT).to_string(),
            first_window: case.first_window().to_string(),
            last_window_update: case.last_window_update().to_string(),
        }
    }
}

/// One output row per window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowReportRow {
    pub window_name: String,
    /// Event-name counts as a JSON object.
    pub event_counts: String,
    pub total_events: u64,
    pub new_cases: u64,
    pub ongoing_count: usize,
    pub complete_count: usize,
    pub incomplete_count: usize,
    pub cancelled_count: usize,
    pub ongoing_cases: String,
    pub complete_cases: String,
    pub incomplete_cases: String,
    pub cancelled_cases: String,
}

impl WindowReportRow {
    fn from_report(report: &WindowReport) -> Result<Self> {
        Ok(Self {
            window_name: report.window_name.clone(),
            event_counts: serde_json::to_string(&report.event_counts)?,
            total_events: report.total_events,
            new_cases: report.new_cases,
            ongoing_count: report.ongoing_cases.len(),
            complete_count: report.complete_cases.len(),
            incomplete_count: report.incomplete_cases.len(),
            cancelled_count: report.cancelled_cases.len(),
            ongoing_cases: join_set(&report.ongoing_cases),
            complete_cases: join_set(&report.complete_cases),
            incomplete_cases: join_set(&report.incomplete_cases),
            cancelled_cases: join_set(&report.cancelled_cases),
        })
    }

    fn into_report(self) -> Result<WindowReport> {
        Ok(WindowReport {
            window_name: self.window_name,
            event_counts: serde_json::from_str(&self.event_counts)?,
            total_events: self.total_events,
            new_cases: self.new_cases,
            ongoing_cases: split_set(&self.ongoing_cases),
            complete_cases: split_set(&self.complete_cases),
            incomplete_cases: split_set(&self.incomplete_cases),
            cancelled_cases: split_set(&self.cancelled_cases),
        })
    }
}

/// Write one row per case.
pub fn write_case_snapshots<'a, I>(path: &Path, cases: I) -> Result<()>
where
    I: IntoIterator<Item = &'a Case>,
{
    let mut writer = csv::Writer::from_path(path)?;
    let mut count = 0usize;
    for case in cases {
        writer.serialize(CaseSnapshotRow::from(case))?;
        count += 1;
    }
    writer.flush()?;
    info!(path = %path.display(), cases = count, "wrote case snapshots");
    Ok(())
}

/// Write one row per window.
pub fn write_window_reports(path: &Path, reports: &[WindowReport]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for report in reports {
        writer.serialize(WindowReportRow::from_report(report)?)?;
    }
    writer.flush()?;
    info!(path = %path.display(), windows = reports.len(), "wrote window reports");
    Ok(())
}

/// Read back window reports written by [`write_window_reports`].
pub fn read_window_reports(path: &Path) -> Result<Vec<WindowReport>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut reports = Vec::new();
    for row in reader.deserialize::<WindowReportRow>() {
        reports.push(row?.into_report()?);
    }
    Ok(reports)
}

/// Read the final-status column of a case snapshot file, keyed by case
/// id. This is the ground truth the evaluator scores windows against.
pub fn read_final_statuses(path: &Path) -> Result<BTreeMap<String, CaseStatus>> {
    #[derive(Deserialize)]
    struct TruthRow {
        case_id: String,
        final_status: CaseStatus,
    }

    let mut reader = csv::Reader::from_path(path)?;
    let mut truth = BTreeMap::new();
    for row in reader.deserialize::<TruthRow>() {
        let row = row?;
        truth.insert(row.case_id, row.final_status);
    }
    Ok(truth)
}

fn join_set(set: &BTreeSet<String>) -> String {
    set.iter().cloned().collect::<Vec<_>>().join(SET_SEPARATOR)
}

fn split_set(joined: &str) -> BTreeSet<String> {
    joined
        .split(SET_SEPARATOR)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
