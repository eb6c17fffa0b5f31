use chrono::{DateTime, Duration, Utc};

/// Re-exposure delay after a miss.
pub const RELEARN_MINUTES: i64 = 10;

/// Review interval in days after a correct answer, keyed by mastery band.
///
/// `[0, 0.7)` -> 1 day, `[0.7, 0.9)` -> 3 days, `[0.9, 1.0]` -> 7 days.
pub fn review_interval_days(mastery_probability: f64) -> i64 {
    if mastery_probability >= 0.9 {
        7
    } else if mastery_probability >= 0.7 {
        3
    } else {
        1
    }
}

/// Calculates when a skill should next be reviewed.
///
/// A miss brings the skill back in 10 minutes regardless of mastery. A correct
/// answer pushes it out 1-7 days, longer the better the skill is known.
/// Intervals are whole 24h spans on the UTC timeline, so month and year
/// rollover is handled by the instant arithmetic.
pub fn schedule_next_review(
    correct: bool,
    mastery_probability: f64,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    if correct {
        now + Duration::days(review_interval_days(mastery_probability))
    } else {
        now + Duration::minutes(RELEARN_MINUTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_incorrect_is_ten_minutes_for_any_mastery() {
        for p in [0.0, 0.3, 0.5, 0.69, 0.7, 0.89, 0.9, 0.95, 1.0] {
            assert_eq!(schedule_next_review(false, p, base()), base() + Duration::minutes(10));
        }
    }

    #[test]
    fn test_low_mastery_is_one_day() {
        let next = schedule_next_review(true, 0.5, base());
        assert_eq!(next, base() + Duration::days(1));
        assert_eq!(next.day(), 2);
        assert_eq!(next.month(), 3);
    }

    #[test]
    fn test_mid_mastery_is_three_days() {
        assert_eq!(schedule_next_review(true, 0.8, base()).day(), 4);
    }

    #[test]
    fn test_high_mastery_is_seven_days() {
        assert_eq!(schedule_next_review(true, 0.95, base()).day(), 8);
    }

    #[test]
    fn test_band_edges_are_inclusive_below() {
        assert_eq!(review_interval_days(0.0), 1);
        assert_eq!(review_interval_days(0.6999), 1);
        assert_eq!(review_interval_days(0.7), 3);
        assert_eq!(review_interval_days(0.8999), 3);
        assert_eq!(review_interval_days(0.9), 7);
        assert_eq!(review_interval_days(1.0), 7);
    }

    #[test]
    fn test_rolls_over_month_and_year() {
        let eve = Utc.with_ymd_and_hms(2024, 12, 28, 23, 30, 0).unwrap();
        let next = schedule_next_review(true, 0.95, eve);
        assert_eq!((next.year(), next.month(), next.day()), (2025, 1, 4));

        let leap = Utc.with_ymd_and_hms(2024, 2, 28, 8, 0, 0).unwrap();
        let next = schedule_next_review(true, 0.1, leap);
        assert_eq!((next.month(), next.day()), (2, 29));
    }

    #[test]
    fn test_always_strictly_in_the_future() {
        for correct in [true, false] {
            for p in [0.0, 0.5, 1.0] {
                assert!(schedule_next_review(correct, p, base()) > base());
            }
        }
    }
}
