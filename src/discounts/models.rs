use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::auth::models::Role;

/// The dimension a discount applies along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    /// Applies to every course
    Global,
    /// Applies to explicitly targeted courses
    Course,
    /// Applies to courses in explicitly targeted categories
    Category,
}

impl ScopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeKind::Global => "global",
            ScopeKind::Course => "course",
            ScopeKind::Category => "category",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "global" | "all" => Ok(ScopeKind::Global),
            "course" => Ok(ScopeKind::Course),
            "category" => Ok(ScopeKind::Category),
            _ => Err(format!("Invalid scope kind: {}", s)),
        }
    }
}

impl std::fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Discount calculation mode
///
/// Derived from which value field is populated; the two are mutually
/// exclusive on the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountKind {
    Percent,
    Fixed,
}

impl AmountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AmountKind::Percent => "percent",
            AmountKind::Fixed => "fixed",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "percent" => Ok(AmountKind::Percent),
            "fixed" => Ok(AmountKind::Fixed),
            _ => Err(format!("Invalid amount kind: {}", s)),
        }
    }
}

impl std::fmt::Display for AmountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Domain model for a discount row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Discount {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub code: String,
    pub is_hidden: bool,
    pub created_by: i32,
    pub creator_role: Role,
    pub scope: ScopeKind,
    pub percent_value: Option<i32>,
    pub fixed_value: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub per_user_limit: Option<i32>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub usage_count: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Discount {
    /// Which calculation mode this discount uses
    ///
    /// Exactly one of the value fields is non-null (enforced at authoring
    /// time and by a storage CHECK); a row violating that reads as Percent.
    pub fn amount_kind(&self) -> AmountKind {
        if self.percent_value.is_some() {
            AmountKind::Percent
        } else {
            AmountKind::Fixed
        }
    }
}

/// A (discount, course-or-category) applicability row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DiscountTarget {
    pub id: i32,
    pub discount_id: i32,
    pub course_id: Option<i32>,
    pub category_id: Option<i32>,
}

/// In-memory form of a discount's target rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSet {
    pub course_ids: Vec<i32>,
    pub category_ids: Vec<i32>,
}

impl TargetSet {
    pub fn is_empty(&self) -> bool {
        self.course_ids.is_empty() && self.category_ids.is_empty()
    }

    pub fn courses(ids: Vec<i32>) -> Self {
        Self {
            course_ids: ids,
            category_ids: Vec::new(),
        }
    }
}

/// One redemption record: a discount consumed by one purchase line
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DiscountRedemption {
    pub id: i32,
    pub discount_id: i32,
    pub purchase_id: Uuid,
    pub user_id: i32,
    pub course_id: i32,
    pub amount_discounted: Decimal,
    pub final_price: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Request DTO for creating a discount
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDiscountRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    pub description: Option<String>,
    /// Optional; a random code is generated when absent
    pub code: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    pub scope: ScopeKind,
    pub percent_value: Option<i32>,
    pub fixed_value: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub per_user_limit: Option<i32>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// Admin-only: target the weakest-performing courses instead of an
    /// explicit list
    #[serde(default)]
    pub auto_target_weak: bool,
    #[serde(default)]
    pub course_ids: Vec<i32>,
    #[serde(default)]
    pub category_ids: Vec<i32>,
}

/// Request DTO for editing a discount
///
/// Omitted fields keep their current values. Target lists, when present,
/// replace the prior target rows wholesale.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateDiscountRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub code: Option<String>,
    pub hidden: Option<bool>,
    pub scope: Option<ScopeKind>,
    pub percent_value: Option<i32>,
    pub fixed_value: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub per_user_limit: Option<i32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub auto_target_weak: bool,
    pub course_ids: Option<Vec<i32>>,
    pub category_ids: Option<Vec<i32>>,
}

/// Request DTO for the preview/apply endpoint
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ApplyDiscountRequest {
    #[validate(length(min = 1, message = "At least one course is required"))]
    pub course_ids: Vec<i32>,
    /// A discount code, or a raw discount id; tried in that order
    #[validate(length(min = 1, message = "Code or id is required"))]
    pub code_or_id: String,
}

/// Request DTO for the availability search
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AvailableDiscountsRequest {
    #[validate(length(min = 1, message = "At least one course is required"))]
    pub course_ids: Vec<i32>,
}

/// Request DTO for toggling a discount's active flag
///
/// `active` sets the flag explicitly; absent means flip.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToggleDiscountRequest {
    pub active: Option<bool>,
}

/// Response DTO for a discount with its resolved targets
#[derive(Debug, Clone, Serialize)]
pub struct DiscountResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub code: String,
    pub is_hidden: bool,
    pub created_by: i32,
    pub creator_role: Role,
    pub scope: ScopeKind,
    pub amount_kind: AmountKind,
    pub percent_value: Option<i32>,
    pub fixed_value: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub per_user_limit: Option<i32>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub usage_count: i32,
    pub is_active: bool,
    pub course_ids: Vec<i32>,
    pub category_ids: Vec<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DiscountResponse {
    pub fn from_parts(discount: Discount, targets: TargetSet) -> Self {
        let amount_kind = discount.amount_kind();
        Self {
            id: discount.id,
            name: discount.name,
            description: discount.description,
            code: discount.code,
            is_hidden: discount.is_hidden,
            created_by: discount.created_by,
            creator_role: discount.creator_role,
            scope: discount.scope,
            amount_kind,
            percent_value: discount.percent_value,
            fixed_value: discount.fixed_value,
            usage_limit: discount.usage_limit,
            per_user_limit: discount.per_user_limit,
            starts_at: discount.starts_at,
            ends_at: discount.ends_at,
            usage_count: discount.usage_count,
            is_active: discount.is_active,
            course_ids: targets.course_ids,
            category_ids: targets.category_ids,
            created_at: discount.created_at,
            updated_at: discount.updated_at,
        }
    }
}

/// One line of a discount preview
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PreviewItem {
    pub course_id: i32,
    pub base_price: Decimal,
    pub discount_amount: Decimal,
    pub final_price: Decimal,
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Structured result of a preview/apply computation
///
/// Pure projection; computing one never mutates persisted state.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DiscountPreview {
    pub discount_id: i32,
    pub code: String,
    pub eligible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ineligible_reason: Option<String>,
    pub total_discount: Decimal,
    pub total_price_after: Decimal,
    pub items: Vec<PreviewItem>,
}

/// One entry of the availability search result
#[derive(Debug, Clone, Serialize)]
pub struct AvailableDiscount {
    pub discount: DiscountResponse,
    /// The largest amount this code could knock off any single course in
    /// the queried set; the ranking key
    pub best_amount: Decimal,
}

/// Paginated listing response
#[derive(Debug, Clone, Serialize)]
pub struct DiscountListResponse {
    pub items: Vec<DiscountResponse>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_scope_kind_parsing() {
        assert_eq!(ScopeKind::from_str("global").unwrap(), ScopeKind::Global);
        // Legacy alias used by older clients
        assert_eq!(ScopeKind::from_str("all").unwrap(), ScopeKind::Global);
        assert_eq!(ScopeKind::from_str("COURSE").unwrap(), ScopeKind::Course);
        assert!(ScopeKind::from_str("bundle").is_err());
    }

    #[test]
    fn test_amount_kind_from_row_shape() {
        let mut discount = sample_discount();
        discount.percent_value = Some(20);
        discount.fixed_value = None;
        assert_eq!(discount.amount_kind(), AmountKind::Percent);

        discount.percent_value = None;
        discount.fixed_value = Some(dec!(5.00));
        assert_eq!(discount.amount_kind(), AmountKind::Fixed);
    }

    #[test]
    fn test_create_request_defaults() {
        let json = r#"{
            "name": "Launch week",
            "scope": "global",
            "percent_value": 15,
            "starts_at": "2026-01-01T00:00:00Z",
            "ends_at": "2026-02-01T00:00:00Z"
        }"#;

        let request: CreateDiscountRequest = serde_json::from_str(json).unwrap();
        assert!(!request.hidden);
        assert!(!request.auto_target_weak);
        assert!(request.course_ids.is_empty());
        assert!(request.category_ids.is_empty());
        assert_eq!(request.code, None);
    }

    pub(crate) fn sample_discount() -> Discount {
        Discount {
            id: 1,
            name: "Sample".to_string(),
            description: None,
            code: "SAMPLE".to_string(),
            is_hidden: false,
            created_by: 1,
            creator_role: Role::Admin,
            scope: ScopeKind::Global,
            percent_value: Some(10),
            fixed_value: None,
            usage_limit: None,
            per_user_limit: None,
            starts_at: Utc::now() - chrono::Duration::days(1),
            ends_at: Utc::now() + chrono::Duration::days(1),
            usage_count: 0,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
