// Weak-course ranking heuristic
//
// Scores every course on a composite of quality and popularity signals and
// ranks descending (higher score = weaker course). Used exclusively to pick
// auto-targets for administrator-authored promotions.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Per-course signals feeding the weakness score
#[derive(Debug, Clone, PartialEq)]
pub struct CourseSignals {
    pub course_id: i32,
    pub rating_avg: f64,
    pub enrollment_count: i64,
    pub view_count: i64,
    /// Sum of discounted sale prices recorded for the course
    pub revenue: Decimal,
}

/// Default result bound for the ranking
pub const DEFAULT_WEAK_COURSE_LIMIT: usize = 100;

const RATING_WEIGHT: f64 = 0.4;
const ENROLLMENT_WEIGHT: f64 = 0.3;
const VIEW_WEIGHT: f64 = 0.2;
const REVENUE_WEIGHT: f64 = 0.1;

/// Composite weakness score for one course
///
/// `(5 − rating)·0.4 + (1/enrollments)·0.3 + (1/views)·0.2 +
/// (1/revenue)·0.1`; a zero denominator contributes zero to the sum rather
/// than infinity.
pub fn weakness_score(signals: &CourseSignals) -> f64 {
    let rating_term = (5.0 - signals.rating_avg) * RATING_WEIGHT;
    let enrollment_term = inverse_or_zero(signals.enrollment_count as f64) * ENROLLMENT_WEIGHT;
    let view_term = inverse_or_zero(signals.view_count as f64) * VIEW_WEIGHT;
    let revenue_term = inverse_or_zero(signals.revenue.to_f64().unwrap_or(0.0)) * REVENUE_WEIGHT;

    rating_term + enrollment_term + view_term + revenue_term
}

fn inverse_or_zero(value: f64) -> f64 {
    if value > 0.0 {
        1.0 / value
    } else {
        0.0
    }
}

/// Rank courses weakest-first, bounded by `limit`
///
/// The sort is stable, so equal scores keep the input order (callers feed
/// courses in ascending id order).
pub fn rank_weak_courses(signals: &[CourseSignals], limit: usize) -> Vec<i32> {
    let mut scored: Vec<(i32, f64)> = signals
        .iter()
        .map(|s| (s.course_id, weakness_score(s)))
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    scored.into_iter().take(limit).map(|(id, _)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn signals(
        course_id: i32,
        rating_avg: f64,
        enrollment_count: i64,
        view_count: i64,
        revenue: Decimal,
    ) -> CourseSignals {
        CourseSignals {
            course_id,
            rating_avg,
            enrollment_count,
            view_count,
            revenue,
        }
    }

    #[test]
    fn test_poor_course_outscores_strong_course() {
        // A: rating 5, 100 enrollments, 1000 views, revenue 500
        // B: rating 1, 1 enrollment, 1 view, revenue 1
        let a = signals(1, 5.0, 100, 1000, dec!(500));
        let b = signals(2, 1.0, 1, 1, dec!(1));

        let score_a = weakness_score(&a);
        let score_b = weakness_score(&b);

        assert!(score_b > score_a);
        assert_eq!(rank_weak_courses(&[a, b], 100), vec![2, 1]);
    }

    #[test]
    fn test_zero_denominators_contribute_zero() {
        let fresh = signals(1, 0.0, 0, 0, dec!(0));
        // Only the rating term remains: (5 - 0) * 0.4
        let score = weakness_score(&fresh);
        assert!((score - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_components() {
        let s = signals(1, 4.0, 2, 4, dec!(10));
        // (5-4)*0.4 + (1/2)*0.3 + (1/4)*0.2 + (1/10)*0.1
        let expected = 0.4 + 0.15 + 0.05 + 0.01;
        assert!((weakness_score(&s) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_limit_bounds_result() {
        let all: Vec<CourseSignals> = (1..=10)
            .map(|id| signals(id, 5.0 - id as f64 * 0.1, 10, 10, dec!(10)))
            .collect();

        let ranked = rank_weak_courses(&all, 3);
        assert_eq!(ranked.len(), 3);
        // Lowest rating = weakest = first
        assert_eq!(ranked, vec![10, 9, 8]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let a = signals(3, 4.0, 10, 10, dec!(10));
        let b = signals(7, 4.0, 10, 10, dec!(10));
        let c = signals(9, 4.0, 10, 10, dec!(10));

        assert_eq!(rank_weak_courses(&[a, b, c], 100), vec![3, 7, 9]);
    }
}
