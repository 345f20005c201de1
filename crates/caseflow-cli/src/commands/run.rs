use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use caseflow_core::report::{write_case_snapshots, write_window_reports};
use caseflow_core::splitter::{list_split_logs, read_event_log};
use caseflow_core::{CaseEngine, CaseStatus};

use super::load_config;

#[derive(Args)]
pub struct RunArgs {
    /// Directory of split logs (from `caseflow-cli split`)
    #[arg(long)]
    pub logs_dir: Option<PathBuf>,
    /// Directory for result snapshots
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
    /// Override the inactivity limit in windows
    #[arg(long)]
    pub limit: Option<u32>,
    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Print every window report instead of a final summary only
    #[arg(long)]
    pub verbose_windows: bool,
}

#[derive(Serialize)]
struct RunSummary {
    windows_processed: usize,
    cases_processed: usize,
    cancelled_cases: usize,
    complete_cases: usize,
    incomplete_cases: usize,
    ongoing_cases: usize,
    completeness_ratio: f64,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args.config.as_deref())?;
    let logs_dir = args.logs_dir.unwrap_or_else(|| config.output_dir.join("logs"));
    let output_dir = args.output_dir.unwrap_or_else(|| config.output_dir.clone());

    let monitor = match args.limit {
        Some(limit) => caseflow_core::InactivityMonitor::new(limit),
        None => config.monitor(),
    };
    let mut engine = CaseEngine::new(config.rules(), monitor);

    let (initial, windows) = list_split_logs(&logs_dir)?;
    let mut reports = Vec::with_capacity(windows.len() + 1);

    let events = read_event_log(&initial)?;
    reports.push(engine.process_window("initial_log", &events)?);

    for (label, path) in &windows {
        let events = read_event_log(path)?;
        let report = engine.process_window(label, &events)?;
        if args.verbose_windows {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        reports.push(report);
    }

    std::fs::create_dir_all(&output_dir)?;
    write_case_snapshots(&output_dir.join("case_snapshots.csv"), engine.cases())?;
    write_window_reports(&output_dir.join("window_reports.csv"), &reports)?;

    let cancelled = engine.cases().filter(|c| c.cancelled()).count();
    let complete = engine
        .cases()
        .filter(|c| c.final_status() == CaseStatus::Complete && !c.cancelled())
        .count();
    let incomplete = engine
        .cases()
        .filter(|c| c.final_status() == CaseStatus::Incomplete)
        .count();
    let not_cancelled = engine.case_count() - cancelled;
    let summary = RunSummary {
        windows_processed: reports.len(),
        cases_processed: engine.case_count(),
        cancelled_cases: cancelled,
        complete_cases: complete,
        incomplete_cases: incomplete,
        ongoing_cases: engine
            .cases()
            .filter(|c| c.final_status() == CaseStatus::Ongoing)
            .count(),
        completeness_ratio: if not_cancelled > 0 {
            complete as f64 / not_cancelled as f64
        } else {
            0.0
        },
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
