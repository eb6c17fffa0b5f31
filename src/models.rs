use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// An authored exercise. Ordering within a skill is (lesson sort order, exercise sort order).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: String,
    pub lesson_id: String,
    pub skill_id: String,
    pub prompt: String,
    pub sort_order: i64,
}

/// One answer from a learner. The attempt log is append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    pub id: String,
    pub learner_id: String,
    pub exercise_id: String,
    pub correct: bool,
    pub created_at: DateTime<Utc>,
}

/// Materialized per (learner, skill) summary, overwritten on every attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillMasteryState {
    pub learner_id: String,
    pub skill_id: String,
    pub mastery_probability: f64,
    pub confidence_score: f64,
    pub attempts_count: i64,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub next_review_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewScheduleEntry {
    pub learner_id: String,
    pub skill_id: String,
    pub next_review_at: DateTime<Utc>,
}

/// What the selector knows about one skill.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MasteryForSkill {
    pub mastery_probability: f64,
    pub confidence_score: f64,
    pub next_review_at: Option<DateTime<Utc>>,
}

impl Default for MasteryForSkill {
    fn default() -> Self {
        Self {
            mastery_probability: crate::mastery::PRIOR_MEAN,
            confidence_score: 0.0,
            next_review_at: None,
        }
    }
}

impl MasteryForSkill {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_at.is_some_and(|at| at <= now)
    }
}
