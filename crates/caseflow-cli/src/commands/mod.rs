pub mod config;
pub mod evaluate;
pub mod run;
pub mod split;

use caseflow_core::EngineConfig;
use std::path::Path;

/// Load the TOML config if a path was given, defaults otherwise.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    match path {
        Some(p) => Ok(EngineConfig::load(p)?),
        None => Ok(EngineConfig::default()),
    }
}
