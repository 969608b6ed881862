// ABOUTME: Constitution questionnaire scoring and submission
// ABOUTME: Sums answers into five buckets and picks a constitution with a gap and threshold rule
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::BTreeMap;

use chrono::Utc;
use fitplan_core::constants::limits::MAX_ANSWER_VALUE;
use fitplan_core::errors::{AppError, AppResult};
use fitplan_core::models::{Assessment, Constitution, ConstitutionScores};
use tracing::info;
use uuid::Uuid;

use crate::database::Database;

/// Questionnaire revision assumed when the client does not send one
pub const DEFAULT_QUESTIONNAIRE_VERSION: i64 = 1;

/// A leader below this score is only chosen when it clears the runner-up by the gap
const DOMINANCE_THRESHOLD: i64 = 6;

/// Minimum lead over the runner-up for a low-scoring leader
const DOMINANCE_GAP: i64 = 2;

/// Bucket order used to break ties
const BUCKETS: [(&str, Constitution); 5] = [
    ("yang", Constitution::YangDeficiency),
    ("yin", Constitution::YinDeficiency),
    ("qi", Constitution::QiDeficiency),
    ("phlegm", Constitution::PhlegmDampness),
    ("stasis", Constitution::BloodStasis),
];

/// Sum answers per bucket
///
/// Keys are `<bucket>_<question>`; keys with an unknown bucket prefix are
/// ignored.
///
/// # Errors
///
/// Returns `InvalidInput` if any answer is outside `0..=5`
pub fn score_answers(answers: &BTreeMap<String, i64>) -> AppResult<ConstitutionScores> {
    if let Some((key, value)) = answers
        .iter()
        .find(|(_, value)| !(0..=MAX_ANSWER_VALUE).contains(*value))
    {
        return Err(AppError::invalid_input(format!(
            "Answer {key} must be between 0 and {MAX_ANSWER_VALUE}, got {value}"
        )));
    }

    let mut scores = ConstitutionScores::default();
    for (key, value) in answers {
        let bucket = key.split('_').next().unwrap_or_default();
        match bucket {
            "yang" => scores.yang += value,
            "yin" => scores.yin += value,
            "qi" => scores.qi += value,
            "phlegm" => scores.phlegm += value,
            "stasis" => scores.stasis += value,
            _ => {}
        }
    }
    Ok(scores)
}

/// Pick the constitution for a set of bucket totals
#[must_use]
pub fn choose_constitution(scores: &ConstitutionScores) -> Constitution {
    let totals = [
        scores.yang,
        scores.yin,
        scores.qi,
        scores.phlegm,
        scores.stasis,
    ];

    let mut ranked: Vec<usize> = (0..BUCKETS.len()).collect();
    // Stable sort keeps the bucket order for ties
    ranked.sort_by(|a, b| totals[*b].cmp(&totals[*a]));

    let top = totals[ranked[0]];
    let second = totals[ranked[1]];

    if top - second < DOMINANCE_GAP && top < DOMINANCE_THRESHOLD {
        Constitution::Balanced
    } else {
        BUCKETS[ranked[0]].1
    }
}

/// Score and store a questionnaire submission
///
/// # Errors
///
/// Returns `InvalidInput` for out-of-range answers, or a database error
pub async fn submit_assessment(
    database: &Database,
    user_id: Uuid,
    answers: BTreeMap<String, i64>,
    questionnaire_version: Option<i64>,
) -> AppResult<Assessment> {
    let scores = score_answers(&answers)?;
    let constitution = choose_constitution(&scores);

    let assessment = Assessment {
        id: Uuid::new_v4(),
        user_id,
        answers,
        scores,
        constitution,
        questionnaire_version: questionnaire_version.unwrap_or(DEFAULT_QUESTIONNAIRE_VERSION),
        created_at: Utc::now(),
    };
    database.create_assessment(&assessment).await?;

    info!(
        user.id = %user_id,
        assessment.id = %assessment.id,
        constitution = %constitution,
        "Assessment submitted"
    );
    Ok(assessment)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(pairs: &[(&str, i64)]) -> BTreeMap<String, i64> {
        pairs.iter().map(|(k, v)| ((*k).to_owned(), *v)).collect()
    }

    fn scores(yang: i64, yin: i64, qi: i64, phlegm: i64, stasis: i64) -> ConstitutionScores {
        ConstitutionScores {
            yang,
            yin,
            qi,
            phlegm,
            stasis,
        }
    }

    #[test]
    fn test_scores_sum_by_prefix_and_ignore_unknown_buckets() {
        let scored = score_answers(&answers(&[
            ("yang_1", 3),
            ("yang_2", 4),
            ("qi_1", 2),
            ("sleep_1", 5),
            ("stasis", 1),
        ]))
        .unwrap();
        assert_eq!(scored, scores(7, 0, 2, 0, 1));
    }

    #[test]
    fn test_out_of_range_answers_are_rejected() {
        assert!(score_answers(&answers(&[("yin_1", 6)])).is_err());
        assert!(score_answers(&answers(&[("yin_1", -1)])).is_err());
        assert!(score_answers(&answers(&[("yin_1", 0), ("yin_2", 5)])).is_ok());
    }

    #[test]
    fn test_close_low_scores_are_balanced() {
        assert_eq!(choose_constitution(&scores(5, 4, 0, 0, 0)), Constitution::Balanced);
        assert_eq!(choose_constitution(&ConstitutionScores::default()), Constitution::Balanced);
    }

    #[test]
    fn test_clear_gap_or_high_score_wins() {
        assert_eq!(choose_constitution(&scores(1, 5, 2, 0, 0)), Constitution::YinDeficiency);
        assert_eq!(choose_constitution(&scores(6, 6, 0, 0, 0)), Constitution::YangDeficiency);
        assert_eq!(choose_constitution(&scores(0, 0, 0, 3, 9)), Constitution::BloodStasis);
    }

    #[test]
    fn test_ties_follow_bucket_order() {
        assert_eq!(choose_constitution(&scores(0, 0, 7, 7, 0)), Constitution::QiDeficiency);
    }
}
