use clap::Args;
use std::path::PathBuf;

use caseflow_core::splitter::split_event_log;
use caseflow_core::Granularity;

use super::load_config;

#[derive(Args)]
pub struct SplitArgs {
    /// Raw event log CSV to split
    #[arg(long)]
    pub input: Option<PathBuf>,
    /// Directory for the split logs
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
    /// Window granularity: daily, weekly or monthly
    #[arg(long)]
    pub granularity: Option<Granularity>,
    /// Months of history for the initial log
    #[arg(long)]
    pub initial_months: Option<u32>,
    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: SplitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args.config.as_deref())?;

    let input = args
        .input
        .or(config.dataset_path.clone())
        .ok_or("no input log: pass --input or set dataset_path in the config")?;
    let output_dir = args.output_dir.unwrap_or_else(|| config.output_dir.join("logs"));
    let granularity = args.granularity.unwrap_or(config.granularity);
    let initial_months = args.initial_months.unwrap_or(config.initial_months);

    let written = split_event_log(&input, &output_dir, granularity, initial_months)?;
    println!(
        "split {} into {} logs under {}",
        input.display(),
        written.len(),
        output_dir.display()
    );
    Ok(())
}
