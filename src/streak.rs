use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::learners::ChallengeStyle;

pub const XP_PER_MISSION: i64 = 25;
pub const CHALLENGE_DAYS: i64 = 7;
/// Streak kept by a gentle learner after a missed day.
pub const GENTLE_STREAK_CAP: i64 = 3;

/// XP, daily streak and 7-day challenge progress for one learner in one domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpStreakState {
    pub xp: i64,
    pub streak: i64,
    pub challenge_day: i64,
    pub committed: bool,
    pub last_completed_date: Option<NaiveDate>,
}

impl XpStreakState {
    /// Records today's mission. Completing more than once a day changes nothing.
    pub fn complete_mission(&self, today: NaiveDate) -> XpStreakState {
        if self.last_completed_date == Some(today) {
            return self.clone();
        }

        let streak = if self.last_completed_date == today.pred_opt() {
            self.streak + 1
        } else {
            1
        };
        let challenge_day = if self.committed {
            (self.challenge_day + 1).clamp(0, CHALLENGE_DAYS)
        } else {
            self.challenge_day
        };

        XpStreakState {
            xp: self.xp + XP_PER_MISSION,
            streak,
            challenge_day,
            committed: self.committed,
            last_completed_date: Some(today),
        }
    }

    pub fn commit(&self) -> XpStreakState {
        XpStreakState { committed: true, ..self.clone() }
    }

    /// Applies the missed-day rule for a committed learner whose last mission
    /// was before yesterday. Returns the new state and whether anything was reset.
    pub fn apply_missed_days(&self, today: NaiveDate, style: ChallengeStyle) -> (XpStreakState, bool) {
        let Some(last) = self.last_completed_date else {
            return (self.clone(), false);
        };
        if !self.committed || last == today || Some(last) == today.pred_opt() {
            return (self.clone(), false);
        }

        let next = match style {
            ChallengeStyle::Strict => XpStreakState { challenge_day: 0, streak: 0, ..self.clone() },
            ChallengeStyle::Gentle => XpStreakState {
                streak: self.streak.clamp(0, GENTLE_STREAK_CAP),
                ..self.clone()
            },
        };
        (next, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn test_first_completion() {
        let s = XpStreakState::default().complete_mission(day(1));
        assert_eq!(s.xp, 25);
        assert_eq!(s.streak, 1);
        assert_eq!(s.challenge_day, 0);
        assert_eq!(s.last_completed_date, Some(day(1)));
    }

    #[test]
    fn test_same_day_not_double_counted() {
        let once = XpStreakState::default().complete_mission(day(1));
        assert_eq!(once.complete_mission(day(1)), once);
    }

    #[test]
    fn test_consecutive_days_grow_streak() {
        let s = XpStreakState::default().commit();
        let s = s.complete_mission(day(1)).complete_mission(day(2)).complete_mission(day(3));
        assert_eq!(s.streak, 3);
        assert_eq!(s.challenge_day, 3);
        assert_eq!(s.xp, 75);
    }

    #[test]
    fn test_gap_restarts_streak() {
        let s = XpStreakState::default().complete_mission(day(1)).complete_mission(day(2));
        let s = s.complete_mission(day(5));
        assert_eq!(s.streak, 1);
    }

    #[test]
    fn test_challenge_day_caps_at_seven() {
        let mut s = XpStreakState::default().commit();
        for d in 1..=10 {
            s = s.complete_mission(day(d));
        }
        assert_eq!(s.challenge_day, CHALLENGE_DAYS);
        assert_eq!(s.streak, 10);
    }

    #[test]
    fn test_uncommitted_challenge_does_not_advance() {
        let s = XpStreakState::default().complete_mission(day(1)).complete_mission(day(2));
        assert_eq!(s.challenge_day, 0);
    }

    #[test]
    fn test_strict_missed_day_resets() {
        let mut s = XpStreakState::default().commit();
        for d in 1..=5 {
            s = s.complete_mission(day(d));
        }
        let (after, reset) = s.apply_missed_days(day(8), ChallengeStyle::Strict);
        assert!(reset);
        assert_eq!(after.streak, 0);
        assert_eq!(after.challenge_day, 0);
        assert_eq!(after.xp, s.xp);
    }

    #[test]
    fn test_gentle_missed_day_caps_streak() {
        let mut s = XpStreakState::default().commit();
        for d in 1..=5 {
            s = s.complete_mission(day(d));
        }
        let (after, reset) = s.apply_missed_days(day(8), ChallengeStyle::Gentle);
        assert!(reset);
        assert_eq!(after.streak, 3);
        assert_eq!(after.challenge_day, 5);
    }

    #[test]
    fn test_missed_day_rule_needs_commitment_and_a_gap() {
        let s = XpStreakState::default().complete_mission(day(1));
        assert!(!s.apply_missed_days(day(9), ChallengeStyle::Strict).1);

        let s = s.commit();
        assert!(!s.apply_missed_days(day(1), ChallengeStyle::Strict).1);
        assert!(!s.apply_missed_days(day(2), ChallengeStyle::Strict).1);
        assert!(s.apply_missed_days(day(3), ChallengeStyle::Strict).1);
        assert!(!XpStreakState::default().commit().apply_missed_days(day(3), ChallengeStyle::Strict).1);
    }
}
