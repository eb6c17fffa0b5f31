use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Prior mean for an untried skill.
pub const PRIOR_MEAN: f64 = 0.3;
/// Pseudo-count weight of the prior.
pub const PRIOR_WEIGHT: f64 = 2.0;

const PRIOR_ALPHA: f64 = PRIOR_MEAN * PRIOR_WEIGHT; // pseudo-successes
const PRIOR_BETA: f64 = (1.0 - PRIOR_MEAN) * PRIOR_WEIGHT; // pseudo-failures

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MasteryUpdate {
    pub mastery_probability: f64,
    pub confidence_score: f64,
    pub attempts_count: i64,
}

/// Folds one new attempt into the (attempts, correct) counts for a skill.
///
/// Beta-Binomial with prior Beta(0.6, 1.4): after `n` attempts with `s`
/// successes the posterior mean is `(α + s) / (α + β + n)`. The confidence
/// score is the posterior's total pseudo-count, so it grows by exactly 1 per
/// attempt.
pub fn update_mastery_from_counts(
    attempts_count: i64,
    correct_count: i64,
    correct: bool,
) -> Result<MasteryUpdate, EngineError> {
    if attempts_count < 0 {
        return Err(EngineError::NegativeCount { field: "attempts_count", value: attempts_count });
    }
    if correct_count < 0 {
        return Err(EngineError::NegativeCount { field: "correct_count", value: correct_count });
    }
    if correct_count > attempts_count {
        return Err(EngineError::CorrectExceedsAttempts {
            attempts: attempts_count,
            correct: correct_count,
        });
    }

    let n = attempts_count
        .checked_add(1)
        .ok_or(EngineError::AttemptsOverflow { attempts: attempts_count })?;
    let s = correct_count + i64::from(correct);
    let total = PRIOR_ALPHA + PRIOR_BETA + n as f64;

    Ok(MasteryUpdate {
        mastery_probability: (PRIOR_ALPHA + s as f64) / total,
        confidence_score: total,
        attempts_count: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_first_correct_attempt_from_prior() {
        let r = update_mastery_from_counts(0, 0, true).unwrap();
        assert!(close(r.mastery_probability, 1.6 / 3.0));
        assert_eq!(r.attempts_count, 1);
        assert!(close(r.confidence_score, 3.0));
    }

    #[test]
    fn test_first_incorrect_attempt_from_prior() {
        let r = update_mastery_from_counts(0, 0, false).unwrap();
        assert!(close(r.mastery_probability, 0.6 / 3.0));
    }

    #[test]
    fn test_correct_attempt_raises_mastery() {
        // (0.6 + 5) / (2 + 6) = 0.7, below the raw 5/6 because of the prior
        let r = update_mastery_from_counts(5, 4, true).unwrap();
        assert!(close(r.mastery_probability, 0.7));
        assert_eq!(r.attempts_count, 6);
    }

    #[test]
    fn test_incorrect_attempt_lowers_mastery() {
        let before = update_mastery_from_counts(4, 4, true).unwrap();
        let after = update_mastery_from_counts(5, 5, false).unwrap();
        assert!(after.mastery_probability < before.mastery_probability);
        assert!(after.mastery_probability < 1.0);
    }

    #[test]
    fn test_confidence_is_prior_weight_plus_attempts() {
        for attempts in 0..50 {
            for correct in [0, attempts / 2, attempts] {
                let r = update_mastery_from_counts(attempts, correct, correct % 2 == 0).unwrap();
                assert!(close(r.confidence_score, (attempts + 1) as f64 + PRIOR_WEIGHT));
                assert!((0.0..=1.0).contains(&r.mastery_probability));
            }
        }
    }

    #[test]
    fn test_confidence_strictly_increases() {
        let mut previous = 0.0;
        for attempts in 0..20 {
            let r = update_mastery_from_counts(attempts, 0, false).unwrap();
            assert!(r.confidence_score > previous);
            previous = r.confidence_score;
        }
    }

    #[test]
    fn test_replay_matches_direct_counts() {
        let outcomes = [true, false, true, true, false, true, true];
        let (mut attempts, mut correct) = (0, 0);
        let mut last = None;
        for &ok in &outcomes {
            last = Some(update_mastery_from_counts(attempts, correct, ok).unwrap());
            attempts += 1;
            correct += i64::from(ok);
        }
        let last = last.unwrap();
        assert!(close(last.mastery_probability, (0.6 + 5.0) / (2.0 + 7.0)));
        assert_eq!(last.attempts_count, 7);
    }

    #[test]
    fn test_rejects_malformed_counts() {
        assert_eq!(
            update_mastery_from_counts(-1, 0, true),
            Err(EngineError::NegativeCount { field: "attempts_count", value: -1 })
        );
        assert_eq!(
            update_mastery_from_counts(3, -2, true),
            Err(EngineError::NegativeCount { field: "correct_count", value: -2 })
        );
        assert_eq!(
            update_mastery_from_counts(2, 3, false),
            Err(EngineError::CorrectExceedsAttempts { attempts: 2, correct: 3 })
        );
    }

    #[test]
    fn test_rejects_attempts_at_max() {
        assert_eq!(
            update_mastery_from_counts(i64::MAX, 0, true),
            Err(EngineError::AttemptsOverflow { attempts: i64::MAX })
        );
        let r = update_mastery_from_counts(i64::MAX - 1, 0, false).unwrap();
        assert_eq!(r.attempts_count, i64::MAX);
    }
}
