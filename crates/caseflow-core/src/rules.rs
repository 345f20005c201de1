//! Completeness rules: which events a case must have seen to count as
//! complete.
//!
//! The rule set is immutable configuration injected once at engine
//! construction. Standard cases need the critical events; cases whose
//! last known state is "Unbillable" additionally need the rejected
//! events (the case must have gone through an explicit rejection path).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// State string that marks a case as billed.
pub const STATE_BILLED: &str = "Billed";
/// State string that marks a case as unbillable.
pub const STATE_UNBILLABLE: &str = "Unbillable";

/// Required-event configuration for the completeness check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletenessRules {
    /// Events every case must produce before it can be complete.
    pub critical_events: BTreeSet<String>,
    /// Extra events required when the case ended up unbillable.
    pub rejected_events: BTreeSet<String>,
}

impl Default for CompletenessRules {
    fn default() -> Self {
        Self {
            critical_events: ["BILLED", "FIN", "RELEASE", "CODE OK"]
                .into_iter()
                .map(String::from)
                .collect(),
            rejected_events: ["STORNO", "REJECT", "SET STATUS"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl CompletenessRules {
    /// The full required set for a case: critical events, plus the
    /// rejected events when the case is unbillable.
    pub fn required_for(&self, unbillable: bool) -> BTreeSet<String> {
        let mut required = self.critical_events.clone();
        if unbillable {
            required.extend(self.rejected_events.iter().cloned());
        }
        required
    }

    /// Required events not yet present in `unique_events`.
    pub fn missing_from(&self, unbillable: bool, unique_events: &BTreeSet<String>) -> BTreeSet<String> {
        self.required_for(unbillable)
            .difference(unique_events)
            .cloned()
            .collect()
    }
}
