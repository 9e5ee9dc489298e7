// Discount eligibility resolver
//
// Determines whether a discount can be applied at all (gate checks, in a
// fixed order with short-circuiting) and which courses of a cart it covers.
// Business-rule misses are reason codes in the result, never errors.

use chrono::{DateTime, Utc};

use crate::discounts::models::{Discount, ScopeKind, TargetSet};
use crate::models::Course;

/// Why a discount cannot be applied at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EligibilityFailure {
    NotStarted,
    Expired,
    Inactive,
    UsageExhausted,
    UserLimitReached,
}

impl EligibilityFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            EligibilityFailure::NotStarted => "NOT_STARTED",
            EligibilityFailure::Expired => "EXPIRED",
            EligibilityFailure::Inactive => "INACTIVE",
            EligibilityFailure::UsageExhausted => "USAGE_EXHAUSTED",
            EligibilityFailure::UserLimitReached => "USER_LIMIT_REACHED",
        }
    }

    /// Human-readable message for the preview result
    pub fn message(&self) -> &'static str {
        match self {
            EligibilityFailure::NotStarted => "This code is not active yet",
            EligibilityFailure::Expired => "This code has expired",
            EligibilityFailure::Inactive => "This code has been deactivated",
            EligibilityFailure::UsageExhausted => "This code has reached its usage limit",
            EligibilityFailure::UserLimitReached => {
                "You have already used this code the maximum number of times"
            }
        }
    }
}

impl std::fmt::Display for EligibilityFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a course/category-scoped discount with zero target rows means
///
/// The source system silently treated such discounts as applying to every
/// course; that fallback is kept as an explicit, named policy so either
/// behavior can be pinned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyTargetPolicy {
    /// Zero targets means the discount covers every course
    #[default]
    ApplyToAll,
    /// Zero targets means the discount covers nothing
    ApplyToNone,
}

/// Per-course applicability flag
#[derive(Debug, Clone, PartialEq)]
pub struct CourseEligibility {
    pub course_id: i32,
    pub eligible: bool,
    pub reason: Option<String>,
}

/// Result of resolving a discount against a course set
#[derive(Debug, Clone, PartialEq)]
pub struct EligibilityOutcome {
    /// Set when a gate check failed; the per-course flags are then all
    /// ineligible
    pub failure: Option<EligibilityFailure>,
    pub courses: Vec<CourseEligibility>,
}

impl EligibilityOutcome {
    /// Whether the discount passed the gate checks and covers at least one
    /// course
    pub fn is_eligible(&self) -> bool {
        self.failure.is_none() && self.courses.iter().any(|c| c.eligible)
    }

    pub fn eligible_course_ids(&self) -> Vec<i32> {
        self.courses
            .iter()
            .filter(|c| c.eligible)
            .map(|c| c.course_id)
            .collect()
    }
}

/// Resolver for discount eligibility
pub struct EligibilityResolver;

impl EligibilityResolver {
    /// Resolve a discount against a course set for an acting user
    ///
    /// Gate checks run in order and short-circuit: validity window, active
    /// flag, global usage ceiling, per-user ceiling. `user_redemptions` is
    /// the count of distinct prior purchase transactions by this user
    /// against this discount (transaction-scoped, not item-scoped).
    pub fn resolve(
        discount: &Discount,
        targets: &TargetSet,
        courses: &[Course],
        user_redemptions: i64,
        now: DateTime<Utc>,
        policy: EmptyTargetPolicy,
    ) -> EligibilityOutcome {
        if let Some(failure) = Self::gate_check(discount, user_redemptions, now) {
            let courses = courses
                .iter()
                .map(|course| CourseEligibility {
                    course_id: course.id,
                    eligible: false,
                    reason: Some(failure.message().to_string()),
                })
                .collect();
            return EligibilityOutcome {
                failure: Some(failure),
                courses,
            };
        }

        let courses = courses
            .iter()
            .map(|course| {
                if Self::course_applies(discount, targets, course, policy) {
                    CourseEligibility {
                        course_id: course.id,
                        eligible: true,
                        reason: None,
                    }
                } else {
                    CourseEligibility {
                        course_id: course.id,
                        eligible: false,
                        reason: Some("This code does not apply to this course".to_string()),
                    }
                }
            })
            .collect();

        EligibilityOutcome {
            failure: None,
            courses,
        }
    }

    /// Run only the gate checks (temporal, active, usage ceilings)
    ///
    /// The availability search uses this without the per-course narrowing.
    pub fn gate_check(
        discount: &Discount,
        user_redemptions: i64,
        now: DateTime<Utc>,
    ) -> Option<EligibilityFailure> {
        if now < discount.starts_at {
            return Some(EligibilityFailure::NotStarted);
        }
        if now > discount.ends_at {
            return Some(EligibilityFailure::Expired);
        }
        if !discount.is_active {
            return Some(EligibilityFailure::Inactive);
        }
        if let Some(limit) = discount.usage_limit {
            if discount.usage_count >= limit {
                return Some(EligibilityFailure::UsageExhausted);
            }
        }
        if let Some(limit) = discount.per_user_limit {
            if user_redemptions >= i64::from(limit) {
                return Some(EligibilityFailure::UserLimitReached);
            }
        }
        None
    }

    /// Whether a single course is in scope for the discount
    pub fn course_applies(
        discount: &Discount,
        targets: &TargetSet,
        course: &Course,
        policy: EmptyTargetPolicy,
    ) -> bool {
        match discount.scope {
            ScopeKind::Global => true,
            ScopeKind::Course | ScopeKind::Category => {
                if targets.is_empty() {
                    return matches!(policy, EmptyTargetPolicy::ApplyToAll);
                }
                if targets.course_ids.contains(&course.id) {
                    return true;
                }
                match course.category_id {
                    Some(category_id) => targets.category_ids.contains(&category_id),
                    None => false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Role;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn course(id: i32, category_id: Option<i32>) -> Course {
        Course {
            id,
            title: format!("Course {}", id),
            description: None,
            category_id,
            lecturer_id: 1,
            price: dec!(100.00),
            rating_avg: 4.0,
            view_count: 100,
            enrollment_count: 10,
            is_published: true,
            created_at: Utc::now(),
        }
    }

    fn active_discount(scope: ScopeKind) -> Discount {
        Discount {
            id: 1,
            name: "Test".to_string(),
            description: None,
            code: "TEST".to_string(),
            is_hidden: false,
            created_by: 1,
            creator_role: Role::Admin,
            scope,
            percent_value: Some(20),
            fixed_value: None,
            usage_limit: None,
            per_user_limit: None,
            starts_at: Utc::now() - Duration::days(1),
            ends_at: Utc::now() + Duration::days(1),
            usage_count: 0,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_not_started_short_circuits() {
        let mut discount = active_discount(ScopeKind::Global);
        discount.starts_at = Utc::now() + Duration::days(1);
        discount.ends_at = Utc::now() + Duration::days(2);
        // Also inactive, but the temporal check comes first
        discount.is_active = false;

        let outcome = EligibilityResolver::resolve(
            &discount,
            &TargetSet::default(),
            &[course(1, None)],
            0,
            Utc::now(),
            EmptyTargetPolicy::ApplyToAll,
        );

        assert_eq!(outcome.failure, Some(EligibilityFailure::NotStarted));
        assert!(!outcome.is_eligible());
        assert!(!outcome.courses[0].eligible);
        assert!(outcome.courses[0].reason.is_some());
    }

    #[test]
    fn test_expired() {
        let mut discount = active_discount(ScopeKind::Global);
        discount.starts_at = Utc::now() - Duration::days(2);
        discount.ends_at = Utc::now() - Duration::days(1);

        let outcome = EligibilityResolver::resolve(
            &discount,
            &TargetSet::default(),
            &[course(1, None)],
            0,
            Utc::now(),
            EmptyTargetPolicy::ApplyToAll,
        );

        assert_eq!(outcome.failure, Some(EligibilityFailure::Expired));
    }

    #[test]
    fn test_inactive() {
        let mut discount = active_discount(ScopeKind::Global);
        discount.is_active = false;

        let failure = EligibilityResolver::gate_check(&discount, 0, Utc::now());
        assert_eq!(failure, Some(EligibilityFailure::Inactive));
    }

    #[test]
    fn test_usage_exhausted_at_limit() {
        let mut discount = active_discount(ScopeKind::Global);
        discount.usage_limit = Some(5);
        discount.usage_count = 5;

        let failure = EligibilityResolver::gate_check(&discount, 0, Utc::now());
        assert_eq!(failure, Some(EligibilityFailure::UsageExhausted));

        // One below the limit still passes
        discount.usage_count = 4;
        assert_eq!(EligibilityResolver::gate_check(&discount, 0, Utc::now()), None);
    }

    #[test]
    fn test_per_user_limit_is_transaction_scoped() {
        let mut discount = active_discount(ScopeKind::Global);
        discount.per_user_limit = Some(2);

        // Two prior transactions: limit reached regardless of items per
        // transaction
        let failure = EligibilityResolver::gate_check(&discount, 2, Utc::now());
        assert_eq!(failure, Some(EligibilityFailure::UserLimitReached));

        assert_eq!(EligibilityResolver::gate_check(&discount, 1, Utc::now()), None);
    }

    #[test]
    fn test_global_scope_covers_everything() {
        let discount = active_discount(ScopeKind::Global);
        let outcome = EligibilityResolver::resolve(
            &discount,
            &TargetSet::default(),
            &[course(1, Some(9)), course(2, None)],
            0,
            Utc::now(),
            EmptyTargetPolicy::ApplyToAll,
        );

        assert!(outcome.is_eligible());
        assert_eq!(outcome.eligible_course_ids(), vec![1, 2]);
    }

    #[test]
    fn test_course_targets_narrow_eligibility() {
        let discount = active_discount(ScopeKind::Course);
        let targets = TargetSet::courses(vec![1]);

        let outcome = EligibilityResolver::resolve(
            &discount,
            &targets,
            &[course(1, None), course(2, None)],
            0,
            Utc::now(),
            EmptyTargetPolicy::ApplyToAll,
        );

        assert!(outcome.is_eligible());
        assert_eq!(outcome.eligible_course_ids(), vec![1]);
        assert!(!outcome.courses[1].eligible);
        assert_eq!(
            outcome.courses[1].reason.as_deref(),
            Some("This code does not apply to this course")
        );
    }

    #[test]
    fn test_category_targets_match_by_membership() {
        let discount = active_discount(ScopeKind::Category);
        let targets = TargetSet {
            course_ids: vec![],
            category_ids: vec![7],
        };

        let outcome = EligibilityResolver::resolve(
            &discount,
            &targets,
            &[course(1, Some(7)), course(2, Some(8)), course(3, None)],
            0,
            Utc::now(),
            EmptyTargetPolicy::ApplyToAll,
        );

        assert_eq!(outcome.eligible_course_ids(), vec![1]);
    }

    #[test]
    fn test_union_of_course_and_category_targets() {
        let discount = active_discount(ScopeKind::Course);
        let targets = TargetSet {
            course_ids: vec![2],
            category_ids: vec![7],
        };

        let outcome = EligibilityResolver::resolve(
            &discount,
            &targets,
            &[course(1, Some(7)), course(2, None), course(3, Some(8))],
            0,
            Utc::now(),
            EmptyTargetPolicy::ApplyToAll,
        );

        assert_eq!(outcome.eligible_course_ids(), vec![1, 2]);
    }

    #[test]
    fn test_empty_targets_apply_to_all_policy() {
        let discount = active_discount(ScopeKind::Course);

        let outcome = EligibilityResolver::resolve(
            &discount,
            &TargetSet::default(),
            &[course(1, None), course(2, Some(3))],
            0,
            Utc::now(),
            EmptyTargetPolicy::ApplyToAll,
        );

        assert_eq!(outcome.eligible_course_ids(), vec![1, 2]);
    }

    #[test]
    fn test_empty_targets_apply_to_none_policy() {
        let discount = active_discount(ScopeKind::Course);

        let outcome = EligibilityResolver::resolve(
            &discount,
            &TargetSet::default(),
            &[course(1, None), course(2, Some(3))],
            0,
            Utc::now(),
            EmptyTargetPolicy::ApplyToNone,
        );

        assert!(!outcome.is_eligible());
        assert!(outcome.eligible_course_ids().is_empty());
    }
}
