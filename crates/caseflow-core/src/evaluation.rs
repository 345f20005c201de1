//! Retrospective evaluation of window-level verdicts.
//!
//! After a full run, the final status of every case is the ground
//! truth. Each window's complete/incomplete buckets are then scored
//! against it: a case the window judged complete that really finished
//! complete is a true positive, and so on. Ongoing and cancelled
//! buckets are not scored; the engine makes no early claim about them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::status::CaseStatus;
use crate::window::WindowReport;

/// Confusion counts and derived metrics for one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowEvaluation {
    pub window_name: String,
    pub true_positives: u32,
    pub false_positives: u32,
    pub true_negatives: u32,
    pub false_negatives: u32,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    /// Cases this window committed to a complete/incomplete verdict.
    pub traces_classified: u32,
}

/// Run-level summary, weighted by traces classified per window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedMetrics {
    pub weighted_accuracy: f64,
    pub weighted_precision: f64,
    pub weighted_recall: f64,
    pub weighted_f1_score: f64,
}

/// Score every window against the final statuses.
pub fn evaluate(
    reports: &[WindowReport],
    truth: &BTreeMap<String, CaseStatus>,
) -> Vec<WindowEvaluation> {
    reports
        .iter()
        .map(|report| evaluate_window(report, truth))
        .collect()
}

fn evaluate_window(report: &WindowReport, truth: &BTreeMap<String, CaseStatus>) -> WindowEvaluation {
    let mut tp = 0u32;
    let mut fp = 0u32;
    let mut tn = 0u32;
    let mut fn_count = 0u32;

    for case_id in &report.complete_cases {
        if truth.get(case_id) == Some(&CaseStatus::Complete) {
            tp += 1;
        } else {
            fp += 1;
        }
    }
    for case_id in &report.incomplete_cases {
        if truth.get(case_id) == Some(&CaseStatus::Incomplete) {
            tn += 1;
        } else {
            fn_count += 1;
        }
    }

    let total = tp + fp + tn + fn_count;
    let accuracy = ratio(tp + tn, total);
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_count);
    let f1_score = if precision + recall > 0.0 {
        round2(2.0 * precision * recall / (precision + recall))
    } else {
        0.0
    };

    WindowEvaluation {
        window_name: report.window_name.clone(),
        true_positives: tp,
        false_positives: fp,
        true_negatives: tn,
        false_negatives: fn_count,
        accuracy,
        precision,
        recall,
        f1_score,
        traces_classified: total,
    }
}

/// Weighted macro average across all windows.
pub fn weighted_summary(evaluations: &[WindowEvaluation]) -> WeightedMetrics {
    let total: u32 = evaluations.iter().map(|e| e.traces_classified).sum();
    if total == 0 {
        return WeightedMetrics {
            weighted_accuracy: 0.0,
            weighted_precision: 0.0,
            weighted_recall: 0.0,
            weighted_f1_score: 0.0,
        };
    }

    let weighted = |metric: fn(&WindowEvaluation) -> f64| {
        round2(
            evaluations
                .iter()
                .map(|e| metric(e) * e.traces_classified as f64)
                .sum::<f64>()
                / total as f64,
        )
    };

    WeightedMetrics {
        weighted_accuracy: weighted(|e| e.accuracy),
        weighted_precision: weighted(|e| e.precision),
        weighted_recall: weighted(|e| e.recall),
        weighted_f1_score: weighted(|e| e.f1_score),
    }
}

fn ratio(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        round2(numerator as f64 / denominator as f64)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
