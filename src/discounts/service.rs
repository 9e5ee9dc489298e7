// Discount engine service layer
//
// Orchestrates authoring, listing, preview/apply, availability search,
// toggle/delete, and redemption recording. All role constraints flow through
// the Role capability methods; all storage access goes through the
// repositories and commits transactionally or not at all.

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::models::Role;
use crate::discounts::{
    calculator::DiscountCalculator,
    eligibility::EligibilityResolver,
    error::DiscountError,
    models::{
        AvailableDiscount, CreateDiscountRequest, Discount, DiscountListResponse, DiscountPreview,
        DiscountResponse, ScopeKind, TargetSet, UpdateDiscountRequest,
    },
    query::{DiscountListParams, DiscountQueryBuilder, ListingScope, ValidatedDiscountQuery},
    repository::{CourseCatalogRepository, DiscountRepository, NewDiscount, RedemptionLine},
    weakness::rank_weak_courses,
};
use crate::models::Course;
use crate::settings::SettingsProvider;

const GENERATED_CODE_LENGTH: usize = 10;

/// Service for the discount rules engine
#[derive(Clone)]
pub struct DiscountService {
    discounts: DiscountRepository,
    courses: CourseCatalogRepository,
    settings: Arc<SettingsProvider>,
}

impl DiscountService {
    pub fn new(
        discounts: DiscountRepository,
        courses: CourseCatalogRepository,
        settings: Arc<SettingsProvider>,
    ) -> Self {
        Self {
            discounts,
            courses,
            settings,
        }
    }

    /// Create a discount
    ///
    /// Validation order: validity window, amount kind, code uniqueness, then
    /// role-scoped target resolution. Nothing persists unless every check
    /// passes.
    pub async fn create(
        &self,
        actor_id: i32,
        role: Role,
        request: CreateDiscountRequest,
    ) -> Result<DiscountResponse, DiscountError> {
        if !role.can_author_discounts() {
            return Err(DiscountError::Forbidden(
                "Only admins and lecturers may create discounts".to_string(),
            ));
        }

        Self::check_window(request.starts_at, request.ends_at)?;
        let (percent_value, fixed_value) =
            Self::check_amount_fields(request.percent_value, request.fixed_value, true)?;
        Self::check_limits(request.usage_limit, request.per_user_limit)?;

        let code = match &request.code {
            Some(code) => Self::normalize_code(code)?,
            None => Self::generate_code(),
        };
        if self.discounts.code_exists(&code, None).await? {
            return Err(DiscountError::DuplicateCode(code));
        }

        let (scope, targets) = self
            .resolve_targets(
                actor_id,
                role,
                request.scope,
                request.auto_target_weak,
                &request.course_ids,
                &request.category_ids,
            )
            .await?;

        let new = NewDiscount {
            name: request.name,
            description: request.description,
            code,
            is_hidden: request.hidden,
            created_by: actor_id,
            creator_role: role,
            scope,
            percent_value,
            fixed_value,
            usage_limit: request.usage_limit,
            per_user_limit: request.per_user_limit,
            starts_at: request.starts_at,
            ends_at: request.ends_at,
        };

        let discount = self.discounts.create(&new, &targets).await?;
        tracing::info!(
            "Created discount {} ({}) by {} {}",
            discount.id,
            discount.code,
            role,
            actor_id
        );

        Ok(DiscountResponse::from_parts(discount, targets))
    }

    /// Edit a discount
    ///
    /// A discount with any redemption becomes structurally frozen: its code
    /// and amount kind can no longer change. Target rows are replaced
    /// wholesale with the newly resolved set.
    pub async fn update(
        &self,
        id: i32,
        actor_id: i32,
        role: Role,
        request: UpdateDiscountRequest,
    ) -> Result<DiscountResponse, DiscountError> {
        if !role.can_author_discounts() {
            return Err(DiscountError::Forbidden(
                "Only admins and lecturers may edit discounts".to_string(),
            ));
        }

        let mut discount = self
            .discounts
            .find_by_id(id)
            .await?
            .ok_or(DiscountError::NotFound)?;

        self.check_ownership(&discount, actor_id, role)?;

        let redeemed =
            discount.usage_count > 0 || self.discounts.redemption_count(id).await? > 0;

        // Structural freeze checks come before any mutation
        if let Some(ref new_code) = request.code {
            let normalized = Self::normalize_code(new_code)?;
            if redeemed && !normalized.eq_ignore_ascii_case(&discount.code) {
                return Err(DiscountError::FrozenAfterUse);
            }
        }
        if redeemed {
            let changes_to_percent =
                request.percent_value.is_some() && discount.percent_value.is_none();
            let changes_to_fixed = request.fixed_value.is_some() && discount.fixed_value.is_none();
            if changes_to_percent || changes_to_fixed {
                return Err(DiscountError::FrozenAfterUse);
            }
        }

        // Merge scalar fields
        if let Some(name) = request.name {
            discount.name = name;
        }
        if let Some(description) = request.description {
            discount.description = Some(description);
        }
        if let Some(hidden) = request.hidden {
            discount.is_hidden = hidden;
        }
        if let Some(starts_at) = request.starts_at {
            discount.starts_at = starts_at;
        }
        if let Some(ends_at) = request.ends_at {
            discount.ends_at = ends_at;
        }
        if request.usage_limit.is_some() {
            discount.usage_limit = request.usage_limit;
        }
        if request.per_user_limit.is_some() {
            discount.per_user_limit = request.per_user_limit;
        }

        Self::check_window(discount.starts_at, discount.ends_at)?;

        // Amount kind: setting one side clears the other
        if request.percent_value.is_some() || request.fixed_value.is_some() {
            let (percent_value, fixed_value) =
                Self::check_amount_fields(request.percent_value, request.fixed_value, true)?;
            discount.percent_value = percent_value;
            discount.fixed_value = fixed_value;
        }
        Self::check_limits(discount.usage_limit, discount.per_user_limit)?;

        if let Some(ref new_code) = request.code {
            let normalized = Self::normalize_code(new_code)?;
            if !normalized.eq_ignore_ascii_case(&discount.code) {
                if self.discounts.code_exists(&normalized, Some(id)).await? {
                    return Err(DiscountError::DuplicateCode(normalized));
                }
                discount.code = normalized;
            }
        }

        // Resolve the replacement target set
        let requested_scope = request.scope.unwrap_or(discount.scope);
        let existing_targets = self.discounts.load_targets(id).await?;

        let (scope, targets) = if request.auto_target_weak
            || request.scope.is_some()
            || request.course_ids.is_some()
            || request.category_ids.is_some()
        {
            let course_ids = request
                .course_ids
                .unwrap_or_else(|| existing_targets.course_ids.clone());
            let category_ids = request
                .category_ids
                .unwrap_or_else(|| existing_targets.category_ids.clone());

            self.resolve_targets(
                actor_id,
                role,
                requested_scope,
                request.auto_target_weak,
                &course_ids,
                &category_ids,
            )
            .await?
        } else {
            (discount.scope, existing_targets)
        };

        discount.scope = scope;

        let updated = self.discounts.update(&discount, &targets).await?;
        tracing::info!("Updated discount {} by {} {}", id, role, actor_id);

        Ok(DiscountResponse::from_parts(updated, targets))
    }

    /// Role-scoped listing with filters, sorting, and pagination
    pub async fn list(
        &self,
        actor_id: i32,
        role: Role,
        params: DiscountListParams,
    ) -> Result<DiscountListResponse, DiscountError> {
        let listing_scope = match role {
            Role::Admin => ListingScope::AdminAuthored,
            Role::Lecturer => ListingScope::OwnedBy(actor_id),
            Role::Student => {
                return Err(DiscountError::Forbidden(
                    "Students may not list discounts".to_string(),
                ))
            }
        };

        let validated = ValidatedDiscountQuery::from_params(params)?;
        let builder = DiscountQueryBuilder::from_query(&validated, listing_scope);

        let (discounts, total) = self.discounts.list(&builder).await?;

        let ids: Vec<i32> = discounts.iter().map(|d| d.id).collect();
        let mut targets_map = self.discounts.load_targets_many(&ids).await?;

        let items = discounts
            .into_iter()
            .map(|discount| {
                let targets = targets_map.remove(&discount.id).unwrap_or_default();
                DiscountResponse::from_parts(discount, targets)
            })
            .collect();

        Ok(DiscountListResponse {
            items,
            total,
            page: validated.page,
            page_size: validated.page_size,
        })
    }

    /// Fetch a single discount with its targets
    pub async fn get(
        &self,
        id: i32,
        actor_id: i32,
        role: Role,
    ) -> Result<DiscountResponse, DiscountError> {
        let discount = self
            .discounts
            .find_by_id(id)
            .await?
            .ok_or(DiscountError::NotFound)?;

        self.check_ownership(&discount, actor_id, role)?;

        let targets = self.discounts.load_targets(id).await?;
        Ok(DiscountResponse::from_parts(discount, targets))
    }

    /// Preview a discount against a cart of courses
    ///
    /// Read-only: repeated calls with the same inputs return the same
    /// result, and no counter moves. The identifier is tried as a code
    /// first, then as a raw discount id.
    pub async fn preview(
        &self,
        course_ids: &[i32],
        code_or_id: &str,
        user_id: i32,
    ) -> Result<DiscountPreview, DiscountError> {
        let courses = self.fetch_courses(course_ids).await?;
        let discount = self.resolve_code_or_id(code_or_id).await?;
        let targets = self.discounts.load_targets(discount.id).await?;

        let user_transactions = self
            .discounts
            .user_transaction_count(discount.id, user_id)
            .await?;
        let settings = self.settings.current().await?;

        let outcome = EligibilityResolver::resolve(
            &discount,
            &targets,
            &courses,
            user_transactions,
            Utc::now(),
            settings.empty_target_policy,
        );

        Ok(DiscountCalculator::build_preview(
            &discount, &courses, &outcome,
        ))
    }

    /// Availability search: every active, non-hidden discount that could
    /// discount at least one course in the set, ranked by the best amount
    /// it could produce
    ///
    /// The sort is stable and candidates are fetched in ascending id order,
    /// so equal amounts keep id order.
    pub async fn find_available(
        &self,
        course_ids: &[i32],
        user_id: i32,
    ) -> Result<Vec<AvailableDiscount>, DiscountError> {
        let courses = self.fetch_courses(course_ids).await?;
        let candidates = self.discounts.list_active_visible().await?;
        let ids: Vec<i32> = candidates.iter().map(|d| d.id).collect();
        let mut targets_map = self.discounts.load_targets_many(&ids).await?;
        let settings = self.settings.current().await?;
        let now = Utc::now();

        let mut available = Vec::new();
        for discount in candidates {
            let user_transactions = self
                .discounts
                .user_transaction_count(discount.id, user_id)
                .await?;

            if EligibilityResolver::gate_check(&discount, user_transactions, now).is_some() {
                continue;
            }

            let targets = targets_map.remove(&discount.id).unwrap_or_default();
            let outcome = EligibilityResolver::resolve(
                &discount,
                &targets,
                &courses,
                user_transactions,
                now,
                settings.empty_target_policy,
            );

            if !outcome.is_eligible() {
                continue;
            }

            let best_amount = DiscountCalculator::best_amount(&discount, &courses, &outcome);
            available.push(AvailableDiscount {
                discount: DiscountResponse::from_parts(discount, targets),
                best_amount,
            });
        }

        available.sort_by(|a, b| b.best_amount.cmp(&a.best_amount));

        Ok(available)
    }

    /// Flip or set the active flag
    pub async fn toggle(
        &self,
        id: i32,
        actor_id: i32,
        role: Role,
        explicit: Option<bool>,
    ) -> Result<DiscountResponse, DiscountError> {
        if !role.can_author_discounts() {
            return Err(DiscountError::Forbidden(
                "Only admins and lecturers may toggle discounts".to_string(),
            ));
        }

        let discount = self
            .discounts
            .find_by_id(id)
            .await?
            .ok_or(DiscountError::NotFound)?;

        self.check_ownership(&discount, actor_id, role)?;

        let new_active = explicit.unwrap_or(!discount.is_active);
        let updated = self.discounts.set_active(id, new_active).await?;
        let targets = self.discounts.load_targets(id).await?;

        Ok(DiscountResponse::from_parts(updated, targets))
    }

    /// Delete a never-used discount
    pub async fn delete(&self, id: i32, actor_id: i32, role: Role) -> Result<(), DiscountError> {
        if !role.can_author_discounts() {
            return Err(DiscountError::Forbidden(
                "Only admins and lecturers may delete discounts".to_string(),
            ));
        }

        let discount = self
            .discounts
            .find_by_id(id)
            .await?
            .ok_or(DiscountError::NotFound)?;

        self.check_ownership(&discount, actor_id, role)?;

        if discount.usage_count > 0 || self.discounts.redemption_count(id).await? > 0 {
            return Err(DiscountError::HasHistory);
        }

        self.discounts.delete(id).await?;
        tracing::info!("Deleted discount {} by {} {}", id, role, actor_id);

        Ok(())
    }

    /// Record a redemption at checkout commit
    ///
    /// Runs the full eligibility resolution, then writes the usage-counter
    /// bump and the per-line history rows in one transaction. The counter
    /// bump is guarded against the usage ceiling, so concurrent redemptions
    /// cannot push `usage_count` past `usage_limit`.
    pub async fn redeem(
        &self,
        course_ids: &[i32],
        code_or_id: &str,
        user_id: i32,
        purchase_id: Uuid,
    ) -> Result<DiscountPreview, DiscountError> {
        let courses = self.fetch_courses(course_ids).await?;
        let discount = self.resolve_code_or_id(code_or_id).await?;
        let targets = self.discounts.load_targets(discount.id).await?;

        let user_transactions = self
            .discounts
            .user_transaction_count(discount.id, user_id)
            .await?;
        let settings = self.settings.current().await?;

        let outcome = EligibilityResolver::resolve(
            &discount,
            &targets,
            &courses,
            user_transactions,
            Utc::now(),
            settings.empty_target_policy,
        );

        if let Some(failure) = outcome.failure {
            return Err(match failure {
                crate::discounts::eligibility::EligibilityFailure::UsageExhausted => {
                    DiscountError::UsageExhausted
                }
                other => DiscountError::ValidationError(other.message().to_string()),
            });
        }
        if !outcome.is_eligible() {
            return Err(DiscountError::ValidationError(
                "This code does not apply to any course in the purchase".to_string(),
            ));
        }

        let preview = DiscountCalculator::build_preview(&discount, &courses, &outcome);

        let lines: Vec<RedemptionLine> = preview
            .items
            .iter()
            .filter(|item| item.applied)
            .map(|item| (item.course_id, item.discount_amount, item.final_price))
            .collect();

        self.discounts
            .record_redemption(discount.id, purchase_id, user_id, &lines)
            .await?;

        tracing::info!(
            "Recorded redemption of discount {} for purchase {} by user {}",
            discount.id,
            purchase_id,
            user_id
        );

        Ok(preview)
    }

    // ------------------------------------------------------------------
    // Internals

    /// Lecturers may only act on discounts they authored
    fn check_ownership(
        &self,
        discount: &Discount,
        actor_id: i32,
        role: Role,
    ) -> Result<(), DiscountError> {
        match role {
            Role::Admin => Ok(()),
            Role::Lecturer => {
                if discount.created_by == actor_id {
                    Ok(())
                } else {
                    Err(DiscountError::Forbidden(
                        "Lecturers may only manage their own discounts".to_string(),
                    ))
                }
            }
            Role::Student => Err(DiscountError::Forbidden(
                "Students may not manage discounts".to_string(),
            )),
        }
    }

    fn check_window(
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Result<(), DiscountError> {
        if starts_at >= ends_at {
            return Err(DiscountError::ValidationError(
                "starts_at must be before ends_at".to_string(),
            ));
        }
        Ok(())
    }

    /// Enforce the percent/fixed exclusivity invariant
    ///
    /// Exactly one side comes out populated; `require_one` demands that a
    /// side was provided at all (create, or an edit touching the amount).
    fn check_amount_fields(
        percent_value: Option<i32>,
        fixed_value: Option<Decimal>,
        require_one: bool,
    ) -> Result<(Option<i32>, Option<Decimal>), DiscountError> {
        match (percent_value, fixed_value) {
            (Some(_), Some(_)) => Err(DiscountError::ValidationError(
                "percent_value and fixed_value are mutually exclusive".to_string(),
            )),
            (Some(percent), None) => {
                if !(1..=100).contains(&percent) {
                    return Err(DiscountError::ValidationError(
                        "percent_value must be between 1 and 100".to_string(),
                    ));
                }
                Ok((Some(percent), None))
            }
            (None, Some(fixed)) => {
                if fixed <= Decimal::ZERO {
                    return Err(DiscountError::ValidationError(
                        "fixed_value must be positive".to_string(),
                    ));
                }
                Ok((None, Some(fixed)))
            }
            (None, None) => {
                if require_one {
                    Err(DiscountError::ValidationError(
                        "Either percent_value or fixed_value is required".to_string(),
                    ))
                } else {
                    Ok((None, None))
                }
            }
        }
    }

    fn check_limits(
        usage_limit: Option<i32>,
        per_user_limit: Option<i32>,
    ) -> Result<(), DiscountError> {
        if let Some(limit) = usage_limit {
            if limit < 1 {
                return Err(DiscountError::ValidationError(
                    "usage_limit must be at least 1".to_string(),
                ));
            }
        }
        if let Some(limit) = per_user_limit {
            if limit < 1 {
                return Err(DiscountError::ValidationError(
                    "per_user_limit must be at least 1".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Codes are stored and compared uppercase
    fn normalize_code(code: &str) -> Result<String, DiscountError> {
        crate::validation::validate_discount_code(code)
            .map_err(|_| DiscountError::ValidationError("Invalid discount code format".to_string()))?;
        Ok(code.trim().to_uppercase())
    }

    fn generate_code() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(GENERATED_CODE_LENGTH)
            .map(char::from)
            .collect::<String>()
            .to_uppercase()
    }

    /// Resolve the persisted scope and target set for an authoring request
    async fn resolve_targets(
        &self,
        actor_id: i32,
        role: Role,
        scope: ScopeKind,
        auto_target_weak: bool,
        course_ids: &[i32],
        category_ids: &[i32],
    ) -> Result<(ScopeKind, TargetSet), DiscountError> {
        if scope == ScopeKind::Category && !role.can_target_categories() {
            return Err(DiscountError::Forbidden(
                "Lecturers may not create category-scoped discounts".to_string(),
            ));
        }
        if auto_target_weak && !role.can_auto_target_weak() {
            return Err(DiscountError::Forbidden(
                "Only admins may auto-target weak courses".to_string(),
            ));
        }

        if auto_target_weak {
            let settings = self.settings.current().await?;
            let signals = self.courses.weak_course_signals().await?;
            let weak_ids = rank_weak_courses(&signals, settings.weak_course_limit);
            return Ok((ScopeKind::Course, TargetSet::courses(weak_ids)));
        }

        match scope {
            ScopeKind::Global => {
                if role.requires_course_ownership() {
                    // A lecturer's "global" discount covers exactly their
                    // own catalog
                    let owned = self.courses.ids_owned_by(actor_id).await?;
                    if owned.is_empty() {
                        return Err(DiscountError::NoCourses);
                    }
                    Ok((ScopeKind::Course, TargetSet::courses(owned)))
                } else {
                    Ok((ScopeKind::Global, TargetSet::default()))
                }
            }
            ScopeKind::Course => {
                let course_ids = Self::dedup(course_ids);
                if course_ids.is_empty() && role.requires_course_ownership() {
                    return Err(DiscountError::NoCourses);
                }
                let courses = self.courses.find_by_ids(&course_ids).await?;
                Self::check_all_found(&course_ids, &courses)?;

                if role.requires_course_ownership() {
                    for course in &courses {
                        if course.lecturer_id != actor_id {
                            return Err(DiscountError::NotOwner(course.id));
                        }
                    }
                }

                Ok((ScopeKind::Course, TargetSet::courses(course_ids)))
            }
            ScopeKind::Category => {
                let category_ids = Self::dedup(category_ids);
                let existing = self.courses.existing_category_ids(&category_ids).await?;
                for id in &category_ids {
                    if !existing.contains(id) {
                        return Err(DiscountError::CategoryNotFound(*id));
                    }
                }

                Ok((
                    ScopeKind::Category,
                    TargetSet {
                        course_ids: Vec::new(),
                        category_ids,
                    },
                ))
            }
        }
    }

    /// Fetch courses preserving the request order, rejecting unknown ids
    async fn fetch_courses(&self, course_ids: &[i32]) -> Result<Vec<Course>, DiscountError> {
        if course_ids.is_empty() {
            return Err(DiscountError::ValidationError(
                "At least one course is required".to_string(),
            ));
        }

        let unique = Self::dedup(course_ids);
        let fetched = self.courses.find_by_ids(&unique).await?;
        Self::check_all_found(&unique, &fetched)?;

        let mut by_id: HashMap<i32, Course> =
            fetched.into_iter().map(|c| (c.id, c)).collect();

        Ok(unique
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect())
    }

    fn check_all_found(requested: &[i32], found: &[Course]) -> Result<(), DiscountError> {
        if found.len() != requested.len() {
            let found_ids: Vec<i32> = found.iter().map(|c| c.id).collect();
            for id in requested {
                if !found_ids.contains(id) {
                    return Err(DiscountError::CourseNotFound(*id));
                }
            }
        }
        Ok(())
    }

    fn dedup(ids: &[i32]) -> Vec<i32> {
        let mut seen = std::collections::HashSet::new();
        ids.iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Resolve an identifier as a code first, then as a raw id
    async fn resolve_code_or_id(&self, code_or_id: &str) -> Result<Discount, DiscountError> {
        if let Some(discount) = self.discounts.find_by_code(code_or_id).await? {
            return Ok(discount);
        }
        if let Ok(id) = code_or_id.trim().parse::<i32>() {
            if let Some(discount) = self.discounts.find_by_id(id).await? {
                return Ok(discount);
            }
        }
        Err(DiscountError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_fields_mutually_exclusive() {
        let result = DiscountService::check_amount_fields(Some(20), Some(dec!(5.00)), true);
        assert!(matches!(result, Err(DiscountError::ValidationError(_))));
    }

    #[test]
    fn test_amount_fields_percent_range() {
        assert!(DiscountService::check_amount_fields(Some(0), None, true).is_err());
        assert!(DiscountService::check_amount_fields(Some(101), None, true).is_err());
        assert_eq!(
            DiscountService::check_amount_fields(Some(1), None, true).unwrap(),
            (Some(1), None)
        );
        assert_eq!(
            DiscountService::check_amount_fields(Some(100), None, true).unwrap(),
            (Some(100), None)
        );
    }

    #[test]
    fn test_amount_fields_fixed_positive() {
        assert!(DiscountService::check_amount_fields(None, Some(dec!(0)), true).is_err());
        assert!(DiscountService::check_amount_fields(None, Some(dec!(-1)), true).is_err());
        assert_eq!(
            DiscountService::check_amount_fields(None, Some(dec!(5.00)), true).unwrap(),
            (None, Some(dec!(5.00)))
        );
    }

    #[test]
    fn test_amount_fields_missing() {
        assert!(DiscountService::check_amount_fields(None, None, true).is_err());
        assert!(DiscountService::check_amount_fields(None, None, false).is_ok());
    }

    #[test]
    fn test_window_validation() {
        let start = Utc::now();
        assert!(DiscountService::check_window(start, start).is_err());
        assert!(
            DiscountService::check_window(start, start + chrono::Duration::seconds(1)).is_ok()
        );
        assert!(
            DiscountService::check_window(start, start - chrono::Duration::seconds(1)).is_err()
        );
    }

    #[test]
    fn test_normalize_code_uppercases() {
        assert_eq!(
            DiscountService::normalize_code("save20").unwrap(),
            "SAVE20"
        );
        assert!(DiscountService::normalize_code("has spaces").is_err());
    }

    #[test]
    fn test_generated_codes_are_well_formed() {
        for _ in 0..20 {
            let code = DiscountService::generate_code();
            assert_eq!(code.len(), GENERATED_CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
            assert_eq!(code, code.to_uppercase());
        }
    }

    #[test]
    fn test_dedup_preserves_order() {
        assert_eq!(DiscountService::dedup(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }
}
