// Discount amount calculator
//
// Pure price arithmetic: per-course discount amounts and the aggregate
// preview. No I/O and no persisted state.

use rust_decimal::Decimal;

use crate::discounts::eligibility::EligibilityOutcome;
use crate::discounts::models::{AmountKind, Discount, DiscountPreview, PreviewItem};
use crate::models::Course;

/// Calculator for discount amounts and preview aggregates
pub struct DiscountCalculator;

impl DiscountCalculator {
    /// Amount a discount knocks off a single course price
    ///
    /// Percent: `price * percent / 100`, clamped so the final price never
    /// goes negative. Fixed: `min(fixed_value, price)`.
    pub fn discount_amount(discount: &Discount, price: Decimal) -> Decimal {
        let raw = match discount.amount_kind() {
            AmountKind::Percent => {
                let percent = Decimal::from(discount.percent_value.unwrap_or(0));
                price * percent / Decimal::from(100)
            }
            AmountKind::Fixed => discount.fixed_value.unwrap_or(Decimal::ZERO),
        };

        raw.min(price).max(Decimal::ZERO)
    }

    /// Build the structured preview for a discount applied to a course set
    ///
    /// Each course line is computed independently: eligible lines get the
    /// calculated amount, ineligible lines keep their full base price and
    /// carry the resolver's reason string. `courses` and `outcome.courses`
    /// are parallel (the outcome was resolved from the same slice).
    pub fn build_preview(
        discount: &Discount,
        courses: &[Course],
        outcome: &EligibilityOutcome,
    ) -> DiscountPreview {
        let mut items = Vec::with_capacity(courses.len());
        let mut total_discount = Decimal::ZERO;
        let mut total_price_after = Decimal::ZERO;

        for (course, flag) in courses.iter().zip(outcome.courses.iter()) {
            let (amount, reason) = if flag.eligible {
                (Self::discount_amount(discount, course.price), None)
            } else {
                (Decimal::ZERO, flag.reason.clone())
            };

            let final_price = course.price - amount;
            total_discount += amount;
            total_price_after += final_price;

            items.push(PreviewItem {
                course_id: course.id,
                base_price: course.price,
                discount_amount: amount,
                final_price,
                applied: flag.eligible,
                reason,
            });
        }

        DiscountPreview {
            discount_id: discount.id,
            code: discount.code.clone(),
            eligible: outcome.is_eligible(),
            ineligible_reason: outcome.failure.map(|f| f.as_str().to_string()),
            total_discount,
            total_price_after,
            items,
        }
    }

    /// The largest amount the discount could produce across the eligible
    /// courses of a set; the availability-search ranking key
    pub fn best_amount(
        discount: &Discount,
        courses: &[Course],
        outcome: &EligibilityOutcome,
    ) -> Decimal {
        courses
            .iter()
            .zip(outcome.courses.iter())
            .filter(|(_, flag)| flag.eligible)
            .map(|(course, _)| Self::discount_amount(discount, course.price))
            .max()
            .unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Role;
    use crate::discounts::eligibility::{EligibilityResolver, EmptyTargetPolicy};
    use crate::discounts::models::{ScopeKind, TargetSet};
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn course(id: i32, price: Decimal) -> Course {
        Course {
            id,
            title: format!("Course {}", id),
            description: None,
            category_id: None,
            lecturer_id: 1,
            price,
            rating_avg: 4.0,
            view_count: 100,
            enrollment_count: 10,
            is_published: true,
            created_at: Utc::now(),
        }
    }

    fn percent_discount(percent: i32) -> Discount {
        Discount {
            id: 1,
            name: "Test".to_string(),
            description: None,
            code: "TEST".to_string(),
            is_hidden: false,
            created_by: 1,
            creator_role: Role::Admin,
            scope: ScopeKind::Global,
            percent_value: Some(percent),
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

    fn fixed_discount(amount: Decimal) -> Discount {
        let mut discount = percent_discount(0);
        discount.percent_value = None;
        discount.fixed_value = Some(amount);
        discount
    }

    #[test]
    fn test_percent_amount() {
        let discount = percent_discount(20);
        assert_eq!(
            DiscountCalculator::discount_amount(&discount, dec!(100.00)),
            dec!(20.00)
        );
    }

    #[test]
    fn test_percent_full_discount() {
        let discount = percent_discount(100);
        assert_eq!(
            DiscountCalculator::discount_amount(&discount, dec!(49.99)),
            dec!(49.99)
        );
    }

    #[test]
    fn test_fixed_amount_capped_at_price() {
        let discount = fixed_discount(dec!(30.00));
        assert_eq!(
            DiscountCalculator::discount_amount(&discount, dec!(100.00)),
            dec!(30.00)
        );
        assert_eq!(
            DiscountCalculator::discount_amount(&discount, dec!(19.99)),
            dec!(19.99)
        );
    }

    #[test]
    fn test_zero_price_course() {
        let discount = fixed_discount(dec!(5.00));
        assert_eq!(
            DiscountCalculator::discount_amount(&discount, dec!(0)),
            dec!(0)
        );
    }

    #[test]
    fn test_preview_end_to_end_percent() {
        let discount = percent_discount(20);
        let courses = vec![course(1, dec!(100.00))];
        let outcome = EligibilityResolver::resolve(
            &discount,
            &TargetSet::default(),
            &courses,
            0,
            Utc::now(),
            EmptyTargetPolicy::ApplyToAll,
        );

        let preview = DiscountCalculator::build_preview(&discount, &courses, &outcome);

        assert!(preview.eligible);
        assert_eq!(preview.total_discount, dec!(20.00));
        assert_eq!(preview.total_price_after, dec!(80.00));
        assert_eq!(preview.items[0].discount_amount, dec!(20.00));
        assert_eq!(preview.items[0].final_price, dec!(80.00));
        assert!(preview.items[0].applied);
    }

    #[test]
    fn test_preview_partial_applicability() {
        let mut discount = percent_discount(50);
        discount.scope = ScopeKind::Course;
        let targets = TargetSet::courses(vec![1]);
        let courses = vec![course(1, dec!(100.00)), course(2, dec!(40.00))];

        let outcome = EligibilityResolver::resolve(
            &discount,
            &targets,
            &courses,
            0,
            Utc::now(),
            EmptyTargetPolicy::ApplyToAll,
        );
        let preview = DiscountCalculator::build_preview(&discount, &courses, &outcome);

        // Course 1 discounted, course 2 at full price with a reason
        assert!(preview.items[0].applied);
        assert_eq!(preview.items[0].final_price, dec!(50.00));
        assert!(!preview.items[1].applied);
        assert_eq!(preview.items[1].discount_amount, dec!(0));
        assert_eq!(preview.items[1].final_price, dec!(40.00));
        assert!(preview.items[1].reason.as_deref().unwrap().len() > 0);

        assert_eq!(preview.total_discount, dec!(50.00));
        assert_eq!(preview.total_price_after, dec!(90.00));
    }

    #[test]
    fn test_best_amount_takes_maximum() {
        let discount = percent_discount(10);
        let courses = vec![course(1, dec!(50.00)), course(2, dec!(200.00))];
        let outcome = EligibilityResolver::resolve(
            &discount,
            &TargetSet::default(),
            &courses,
            0,
            Utc::now(),
            EmptyTargetPolicy::ApplyToAll,
        );

        assert_eq!(
            DiscountCalculator::best_amount(&discount, &courses, &outcome),
            dec!(20.00)
        );
    }
}
