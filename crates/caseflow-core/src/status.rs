//! Case status and the per-case transition ledger.
//!
//! Status is a closed enum so a typo can never create a fifth,
//! unhandled classification. The ledger is pure bookkeeping: it records
//! every status change together with the window that caused it, and has
//! no influence on classification itself.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a case at any point in the run.
///
/// `Ongoing` is the initial state. `Complete` and `Cancelled` are
/// terminal: no event or sweep ever moves a case out of them.
/// `Incomplete` is assigned either on evaluation (missing required
/// events) or by the inactivity sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CaseStatus {
    Ongoing,
    Complete,
    Incomplete,
    Cancelled,
}

impl CaseStatus {
    /// Terminal statuses are never re-evaluated.
    pub fn is_terminal(self) -> bool {
        matches!(self, CaseStatus::Complete | CaseStatus::Cancelled)
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CaseStatus::Ongoing => "ONGOING",
            CaseStatus::Complete => "COMPLETE",
            CaseStatus::Incomplete => "INCOMPLETE",
            CaseStatus::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for CaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ONGOING" => Ok(CaseStatus::Ongoing),
            "COMPLETE" => Ok(CaseStatus::Complete),
            "INCOMPLETE" => Ok(CaseStatus::Incomplete),
            "CANCELLED" => Ok(CaseStatus::Cancelled),
            other => Err(format!("unknown case status '{other}'")),
        }
    }
}

/// One recorded status change, attributed to the window that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransition {
    pub from: CaseStatus,
    pub to: CaseStatus,
    /// Window during which the change happened.
    pub window: String,
    /// Position in the case's transition history, starting at 0.
    pub seq: usize,
    /// Short human-readable explanation, e.g. "exceeded inactivity limit".
    pub reason: String,
}

impl fmt::Display for StatusTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}@{}", self.from, self.to, self.window)
    }
}

/// Append-only history of a case's status changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransitionLedger {
    transitions: Vec<StatusTransition>,
    /// The first status the case ever moved to, captured once.
    first_transition_to: Option<CaseStatus>,
}

impl TransitionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a change. Callers only invoke this when `from != to`.
    pub fn record(&mut self, from: CaseStatus, to: CaseStatus, window: &str, reason: &str) {
        debug_assert_ne!(from, to, "ledger entries must be actual changes");
        if self.first_transition_to.is_none() {
            self.first_transition_to = Some(to);
        }
        let seq = self.transitions.len();
        self.transitions.push(StatusTransition {
            from,
            to,
            window: window.to_string(),
            seq,
            reason: reason.to_string(),
        });
    }

    pub fn transitions(&self) -> &[StatusTransition] {
        &self.transitions
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn first_transition_to(&self) -> Option<CaseStatus> {
        self.first_transition_to
    }
}
