use chrono::{DateTime, Duration, Utc};

/// Starting interval for a card that has never been reviewed.
pub const DEFAULT_INTERVAL_DAYS: i32 = 1;
/// Ease factor applied to every card. The scheduler keeps no per-card state,
/// so the factor never drifts from this value.
pub const DEFAULT_EASE: f64 = 2.5;

/// Scheduling produced by a single grading action.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSchedule {
    pub interval_days: i32,
    pub ease_factor: f64,
    pub due_at: DateTime<Utc>,
}

/// Computes the next review date for a grade on the 0..=4 scale (callers
/// validate the range before recording anything).
///
/// Every call starts from the defaults rather than the card's review history:
/// a passing grade (3 or better) lands on `ceil(1 * 2.5)` days, a failing one
/// on 1 day, and the ease factor never moves. Intervals therefore do not
/// compound across sessions. Deterministic for a fixed `(grade, now)`.
pub fn schedule_review(grade: i32, now: DateTime<Utc>) -> ReviewSchedule {
    let interval_days = if grade >= 3 {
        (DEFAULT_INTERVAL_DAYS as f64 * DEFAULT_EASE).ceil() as i32
    } else {
        DEFAULT_INTERVAL_DAYS
    };

    ReviewSchedule {
        interval_days,
        ease_factor: DEFAULT_EASE,
        due_at: now + Duration::days(interval_days as i64),
    }
}

/// A quiz answer mapped onto the grading scale.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizOutcome {
    pub grade: i32,
    pub schedule: ReviewSchedule,
}

/// Scores a multiple-choice answer. A correct answer counts as a confident
/// pass pushed a week out; a wrong one as a lapse due again tomorrow.
pub fn grade_quiz_answer(correct: bool, now: DateTime<Utc>) -> QuizOutcome {
    let (grade, interval_days) = if correct { (4, 7) } else { (1, 1) };

    QuizOutcome {
        grade,
        schedule: ReviewSchedule {
            interval_days,
            ease_factor: DEFAULT_EASE,
            due_at: now + Duration::days(interval_days as i64),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_passing_grades_schedule_three_days_out() {
        let now = fixed_now();

        for grade in 3..=4 {
            let schedule = schedule_review(grade, now);
            assert_eq!(schedule.interval_days, 3);
            assert_eq!(schedule.due_at, now + Duration::days(3));
        }
    }

    #[test]
    fn test_failing_grades_schedule_tomorrow() {
        let now = fixed_now();

        for grade in 0..=2 {
            let schedule = schedule_review(grade, now);
            assert_eq!(schedule.interval_days, 1);
            assert_eq!(schedule.due_at, now + Duration::days(1));
        }
    }

    #[test]
    fn test_ease_factor_never_moves() {
        let now = fixed_now();

        for grade in 0..=4 {
            assert_eq!(schedule_review(grade, now).ease_factor, DEFAULT_EASE);
        }
    }

    #[test]
    fn test_interval_does_not_compound() {
        // Repeated passes always restart from the default interval.
        let now = fixed_now();
        let first = schedule_review(4, now);
        let second = schedule_review(4, now + Duration::days(3));

        assert_eq!(first.interval_days, second.interval_days);
    }

    #[test]
    fn test_schedule_is_deterministic() {
        let now = fixed_now();
        assert_eq!(schedule_review(3, now), schedule_review(3, now));
    }

    #[test]
    fn test_correct_quiz_answer_is_a_week_out() {
        let outcome = grade_quiz_answer(true, fixed_now());

        assert_eq!(outcome.grade, 4);
        assert_eq!(outcome.schedule.interval_days, 7);
        assert_eq!(outcome.schedule.due_at, fixed_now() + Duration::days(7));
        assert_eq!(outcome.schedule.ease_factor, DEFAULT_EASE);
    }

    #[test]
    fn test_incorrect_quiz_answer_is_due_tomorrow() {
        let outcome = grade_quiz_answer(false, fixed_now());

        assert_eq!(outcome.grade, 1);
        assert_eq!(outcome.schedule.interval_days, 1);
        assert_eq!(outcome.schedule.due_at, fixed_now() + Duration::days(1));
    }
}
