//! # Caseflow Core Library
//!
//! Caseflow classifies long-running business process instances
//! ("cases") as complete, incomplete, cancelled, or still ongoing by
//! incrementally replaying a time-ordered event log split into
//! sequential windows. After each window it answers: which cases can
//! already be judged finished, and how?
//!
//! ## Architecture
//!
//! - **Case state machine**: per-instance status, trace, and timing
//!   history, driven one event at a time
//! - **Window aggregator**: per-slice event counts and disjoint status
//!   buckets, finalized into immutable reports
//! - **Inactivity monitor**: forces a verdict on cases the log stops
//!   mentioning
//! - **Splitter / reports**: CSV log splitting and flat result snapshots
//! - **Evaluation**: retrospective scoring of window verdicts against
//!   the final statuses
//!
//! ## Key Components
//!
//! - [`CaseEngine`]: the sequential per-window driver
//! - [`Case`]: one process instance from first event to verdict
//! - [`WindowReport`]: immutable per-window summary
//! - [`EngineConfig`]: TOML run configuration

pub mod case;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod event;
pub mod inactivity;
pub mod report;
pub mod rules;
pub mod splitter;
pub mod status;
pub mod window;

pub use case::Case;
pub use config::EngineConfig;
pub use engine::CaseEngine;
pub use error::{ConfigError, CoreError, LogError, Result};
pub use evaluation::{evaluate, weighted_summary, WeightedMetrics, WindowEvaluation};
pub use event::EventRecord;
pub use inactivity::InactivityMonitor;
pub use rules::CompletenessRules;
pub use splitter::Granularity;
pub use status::{CaseStatus, StatusTransition, TransitionLedger};
pub use window::{WindowReport, WindowStats};
