//! Turning classifier scores into a moderation verdict.

use std::collections::BTreeMap;

use neo_models::{ModerationResult, ModerationVerdict};

use crate::error::{MlError, MlResult};

/// Any label at or above this score blocks the content.
pub const BLOCK_THRESHOLD: f64 = 0.8;

/// Any label at or above this score sends the content to review.
pub const REVIEW_THRESHOLD: f64 = 0.5;

/// Verdict for a set of label scores; the highest score decides.
pub fn verdict_for(scores: &BTreeMap<String, f64>) -> ModerationVerdict {
    let max = scores.values().copied().fold(0.0_f64, f64::max);
    if max >= BLOCK_THRESHOLD {
        ModerationVerdict::Block
    } else if max >= REVIEW_THRESHOLD {
        ModerationVerdict::Review
    } else {
        ModerationVerdict::Allow
    }
}

pub fn result_from_scores(scores: BTreeMap<String, f64>) -> ModerationResult {
    ModerationResult {
        verdict: verdict_for(&scores),
        scores,
    }
}

/// Parse `{"scores": {label: score}}` classifier output.
pub fn parse_scores(output: &serde_json::Value) -> MlResult<BTreeMap<String, f64>> {
    let scores = output
        .get("scores")
        .and_then(|s| s.as_object())
        .ok_or_else(|| MlError::invalid_output("classifier output has no `scores` object"))?;

    scores
        .iter()
        .map(|(label, score)| {
            score
                .as_f64()
                .map(|s| (label.clone(), s))
                .ok_or_else(|| MlError::invalid_output(format!("score for `{}` is not a number", label)))
        })
        .collect()
}

/// Per-label maximum across several score sets.
pub fn max_per_label(sets: impl IntoIterator<Item = BTreeMap<String, f64>>) -> BTreeMap<String, f64> {
    let mut merged: BTreeMap<String, f64> = BTreeMap::new();
    for set in sets {
        for (label, score) in set {
            merged
                .entry(label)
                .and_modify(|current| *current = current.max(score))
                .or_insert(score);
        }
    }
    merged
}
