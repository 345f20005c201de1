use clap::Subcommand;
use std::path::PathBuf;

use caseflow_core::EngineConfig;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the resolved configuration
    Show {
        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Write a default configuration file
    Init {
        /// Destination path
        #[arg(long, default_value = "caseflow.toml")]
        path: PathBuf,
    },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show { config } => {
            let config = super::load_config(config.as_deref())?;
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Init { path } => {
            EngineConfig::default().save(&path)?;
            println!("wrote default configuration to {}", path.display());
        }
    }
    Ok(())
}
