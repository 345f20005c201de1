//! TOML-based run configuration.
//!
//! Collects everything the engine consumes but does not own: window
//! granularity, the silence budget for the inactivity sweep, the
//! required-event sets, and the input/output locations. Every field has
//! a default so a partial file (or none at all) still yields a working
//! configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::inactivity::InactivityMonitor;
use crate::rules::CompletenessRules;
use crate::splitter::Granularity;

/// Run configuration, serialized to/from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Window granularity for the log split.
    #[serde(default = "default_granularity")]
    pub granularity: Granularity,
    /// Months of history that go into the initial warm-up log.
    #[serde(default = "default_initial_months")]
    pub initial_months: u32,
    /// Maximum silence in days before a case is forced inactive.
    #[serde(default = "default_max_silence_days")]
    pub max_silence_days: u32,
    /// Events every case needs to be complete.
    #[serde(default = "default_critical_events")]
    pub critical_events: BTreeSet<String>,
    /// Extra events required for unbillable cases.
    #[serde(default = "default_rejected_events")]
    pub rejected_events: BTreeSet<String>,
    /// Raw event log to split.
    #[serde(default)]
    pub dataset_path: Option<PathBuf>,
    /// Directory for split logs and result snapshots.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            granularity: default_granularity(),
            initial_months: default_initial_months(),
            max_silence_days: default_max_silence_days(),
            critical_events: default_critical_events(),
            rejected_events: default_rejected_events(),
            dataset_path: None,
            output_dir: default_output_dir(),
        }
    }
}

impl EngineConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config: Self =
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save as TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(path, text).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.critical_events.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "critical_events".to_string(),
                message: "must name at least one event".to_string(),
            }
            .into());
        }
        if self.max_silence_days == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_silence_days".to_string(),
                message: "must be positive".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// The completeness rule set this configuration describes.
    pub fn rules(&self) -> CompletenessRules {
        CompletenessRules {
            critical_events: self.critical_events.clone(),
            rejected_events: self.rejected_events.clone(),
        }
    }

    /// The inactivity monitor for this granularity and silence budget.
    pub fn monitor(&self) -> InactivityMonitor {
        InactivityMonitor::from_silence_days(self.max_silence_days, self.granularity)
    }
}

fn default_granularity() -> Granularity {
    Granularity::Weekly
}

fn default_initial_months() -> u32 {
    12
}

fn default_max_silence_days() -> u32 {
    190
}

fn default_critical_events() -> BTreeSet<String> {
    CompletenessRules::default().critical_events
}

fn default_rejected_events() -> BTreeSet<String> {
    CompletenessRules::default().rejected_events
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_standard_rules() {
        let config = EngineConfig::default();
        assert_eq!(config.granularity, Granularity::Weekly);
        assert_eq!(config.max_silence_days, 190);
        assert_eq!(config.rules(), CompletenessRules::default());
        assert_eq!(config.monitor().limit(), 27);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: EngineConfig = toml::from_str("granularity = \"monthly\"").unwrap();
        assert_eq!(config.granularity, Granularity::Monthly);
        assert_eq!(config.initial_months, 12);
        assert!(!config.critical_events.is_empty());
    }

    #[test]
    fn round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("caseflow.toml");

        let mut config = EngineConfig::default();
        config.granularity = Granularity::Daily;
        config.max_silence_days = 30;
        config.save(&path).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn empty_critical_set_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("caseflow.toml");
        std::fs::write(&path, "critical_events = []\n").unwrap();
        assert!(EngineConfig::load(&path).is_err());
    }
}
