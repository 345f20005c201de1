//! Event-log splitting.
//!
//! Turns one raw, time-ordered CSV event log into an initial log (the
//! first N months, used to warm up the engine with pre-existing cases)
//! plus one smaller window log per calendar period. Window labels are
//! zero-padded so lexicographic order equals chronological order; the
//! engine processes the files in exactly that order.

use chrono::{Datelike, Months, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{LogError, Result};
use crate::event::EventRecord;

/// File name of the warm-up log inside a split directory.
pub const INITIAL_LOG_NAME: &str = "initial_log.csv";
/// Suffix of every per-period log inside a split directory.
pub const WINDOW_LOG_SUFFIX: &str = "_window_log.csv";

/// Calendar granularity of the window split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
}

impl Granularity {
    /// Nominal window length in days, used to convert a silence budget
    /// into a window count.
    pub fn days(self) -> u32 {
        match self {
            Granularity::Daily => 1,
            Granularity::Weekly => 7,
            Granularity::Monthly => 30,
        }
    }

    /// Chronologically sortable label for the period containing `time`.
    pub fn window_label(self, time: NaiveDateTime) -> String {
        match self {
            Granularity::Daily => time.format("%Y-%m-%d").to_string(),
            Granularity::Weekly => {
                let week = time.date().iso_week();
                format!("{}_w{:02}", week.year(), week.week())
            }
            Granularity::Monthly => time.format("%Y-%m").to_string(),
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Granularity::Daily),
            "weekly" => Ok(Granularity::Weekly),
            "monthly" => Ok(Granularity::Monthly),
            other => Err(format!("granularity must be daily, weekly or monthly, got '{other}'")),
        }
    }
}

/// Split `input` into `output_dir/initial_log.csv` plus one
/// `<label>_window_log.csv` per period after the initial cutoff.
///
/// The initial cutoff is `min(complete_time) + initial_months`. Events
/// are written in input order, which the upstream export guarantees to
/// be non-decreasing in `complete_time`.
pub fn split_event_log(
    input: &Path,
    output_dir: &Path,
    granularity: Granularity,
    initial_months: u32,
) -> Result<Vec<PathBuf>> {
    let events = read_event_log(input)?;
    let first = match events.iter().map(|e| e.complete_time).min() {
        Some(t) => t,
        None => return Err(LogError::EmptyLog { path: input.to_path_buf() }.into()),
    };
    let cutoff = first
        .checked_add_months(Months::new(initial_months))
        .unwrap_or(NaiveDateTime::MAX);

    let mut initial: Vec<&EventRecord> = Vec::new();
    let mut windows: BTreeMap<String, Vec<&EventRecord>> = BTreeMap::new();
    for event in &events {
        if event.complete_time < cutoff {
            initial.push(event);
        } else {
            windows
                .entry(granularity.window_label(event.complete_time))
                .or_default()
                .push(event);
        }
    }

    fs::create_dir_all(output_dir)?;
    let mut written = Vec::new();

    let initial_path = output_dir.join(INITIAL_LOG_NAME);
    write_event_log(&initial_path, &initial)?;
    written.push(initial_path);

    for (label, group) in &windows {
        let path = output_dir.join(format!("{label}{WINDOW_LOG_SUFFIX}"));
        write_event_log(&path, group)?;
        written.push(path);
    }

    info!(
        input = %input.display(),
        windows = windows.len(),
        initial_events = initial.len(),
        "split event log"
    );
    Ok(written)
}

/// Read a full event log CSV.
pub fn read_event_log(path: &Path) -> Result<Vec<EventRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut events = Vec::new();
    for record in reader.deserialize() {
        events.push(record?);
    }
    Ok(events)
}

fn write_event_log(path: &Path, events: &[&EventRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for event in events {
        writer.serialize(event)?;
    }
    writer.flush()?;
    Ok(())
}

/// Locate the initial log and the window logs of a split directory,
/// window logs sorted chronologically by label.
pub fn list_split_logs(dir: &Path) -> Result<(PathBuf, Vec<(String, PathBuf)>)> {
    let mut initial = None;
    let mut windows = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name == INITIAL_LOG_NAME {
            initial = Some(entry.path());
        } else if let Some(label) = name.strip_suffix(WINDOW_LOG_SUFFIX) {
            windows.push((label.to_string(), entry.path()));
        }
    }
    windows.sort_by(|a, b| a.0.cmp(&b.0));

    let initial = initial.ok_or(LogError::MissingInitialLog { dir: dir.to_path_buf() })?;
    Ok((initial, windows))
}
