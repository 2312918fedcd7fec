//! The scoring engine.
//!
//! Scores are recomputed over the whole round every time any review
//! changes, so the stored numbers always reflect the full set of marks.

use std::collections::HashMap;

use crate::config::GameLimitsConfig;
use crate::protocol::types::{CompletedRound, FieldScores, ScoringMode, ANSWER_FIELDS};
use crate::protocol::validation::shared_answer_key;

const POINTS_PER_FIELD: f64 = 10.0;

/// Round to two decimal places, the precision all scores carry.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Recompute every reviewed submission's scores in `round` under `mode`.
///
/// FIXED_10 awards ten points per correct field. SHARED_10 splits the ten
/// points between reviewed-correct submissions whose normalised answers
/// match; an empty answer never shares and scores zero even when marked
/// correct, because there is nothing to credit.
pub fn recompute_round_scores(
    round: &mut CompletedRound,
    mode: ScoringMode,
    limits: &GameLimitsConfig,
) {
    match mode {
        ScoringMode::Fixed10 => {
            for submission in &mut round.submissions {
                if let Some(review) = submission.review.as_mut() {
                    let mut scores = FieldScores::default();
                    let mut total = 0.0;
                    for field in ANSWER_FIELDS {
                        let value = if review.marks.field(field) {
                            POINTS_PER_FIELD
                        } else {
                            0.0
                        };
                        scores.set_field(field, value);
                        total += value;
                    }
                    scores.total = round2(total);
                    review.scores = scores;
                }
            }
        }
        ScoringMode::Shared10 => {
            // First pass: how many reviewed-correct submissions share each
            // normalised answer, per field.
            let mut counts: Vec<HashMap<String, u32>> = vec![HashMap::new(); ANSWER_FIELDS.len()];
            for submission in &round.submissions {
                let Some(review) = submission.review.as_ref() else {
                    continue;
                };
                for (slot, field) in ANSWER_FIELDS.into_iter().enumerate() {
                    if !review.marks.field(field) {
                        continue;
                    }
                    let key = shared_answer_key(submission.answers.field(field), limits);
                    if key.is_empty() {
                        continue;
                    }
                    if let Some(bucket) = counts.get_mut(slot) {
                        *bucket.entry(key).or_insert(0) += 1;
                    }
                }
            }

            // Second pass: award each share.
            for submission in &mut round.submissions {
                let answers = submission.answers.clone();
                let Some(review) = submission.review.as_mut() else {
                    continue;
                };
                let mut scores = FieldScores::default();
                let mut total = 0.0;
                for (slot, field) in ANSWER_FIELDS.into_iter().enumerate() {
                    let mut value = 0.0;
                    if review.marks.field(field) {
                        let key = shared_answer_key(answers.field(field), limits);
                        if !key.is_empty() {
                            let sharers = counts
                                .get(slot)
                                .and_then(|bucket| bucket.get(&key))
                                .copied()
                                .unwrap_or(1);
                            value = round2(POINTS_PER_FIELD / f64::from(sharers));
                        }
                    }
                    scores.set_field(field, value);
                    total += value;
                }
                scores.total = round2(total);
                review.scores = scores;
            }
        }
    }
}
