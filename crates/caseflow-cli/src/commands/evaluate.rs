use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use caseflow_core::report::{read_final_statuses, read_window_reports};
use caseflow_core::{evaluate, weighted_summary, WeightedMetrics, WindowEvaluation};

use super::load_config;

#[derive(Args)]
pub struct EvaluateArgs {
    /// Window reports CSV (from `caseflow-cli run`)
    #[arg(long)]
    pub windows: Option<PathBuf>,
    /// Case snapshots CSV (from `caseflow-cli run`)
    #[arg(long)]
    pub cases: Option<PathBuf>,
    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Serialize)]
struct EvaluationOutput {
    windows: Vec<WindowEvaluation>,
    weighted: WeightedMetrics,
}

pub fn run(args: EvaluateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args.config.as_deref())?;
    let windows_path = args
        .windows
        .unwrap_or_else(|| config.output_dir.join("window_reports.csv"));
    let cases_path = args
        .cases
        .unwrap_or_else(|| config.output_dir.join("case_snapshots.csv"));

    let reports = read_window_reports(&windows_path)?;
    let truth = read_final_statuses(&cases_path)?;

    let evaluations = evaluate(&reports, &truth);
    let weighted = weighted_summary(&evaluations);
    let output = EvaluationOutput {
        windows: evaluations,
        weighted,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
