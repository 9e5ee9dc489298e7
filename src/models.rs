use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Represents a course in the catalog
///
/// Besides the listing fields, a course carries the popularity and quality
/// signals (rating average, view count, enrollment count) consumed by the
/// discount engine's weak-course ranking.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Course {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Rust for Backend Engineers")]
    pub title: String,
    #[schema(example = "From ownership to production services")]
    pub description: Option<String>,
    pub category_id: Option<i32>,
    pub lecturer_id: i32,
    #[schema(value_type = f64, example = 49.99)]
    pub price: Decimal,
    #[schema(example = 4.5, minimum = 0.0, maximum = 5.0)]
    pub rating_avg: f64,
    pub view_count: i64,
    pub enrollment_count: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// Represents a course category
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Programming")]
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Data needed to create a new course
///
/// Used for POST /api/courses requests; id, counters, and timestamps are
/// generated server-side.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateCourse {
    #[schema(example = "Rust for Backend Engineers")]
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[schema(example = "From ownership to production services")]
    pub description: Option<String>,
    pub category_id: Option<i32>,
    pub lecturer_id: i32,
    #[schema(value_type = f64, example = 49.99)]
    #[validate(custom = "crate::validation::validate_price")]
    pub price: Decimal,
}

/// Data for updating an existing course
///
/// All fields are optional to support partial updates.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct UpdateCourse {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i32>,
    #[schema(value_type = f64, example = 59.99)]
    #[validate(custom = "crate::validation::validate_price")]
    pub price: Option<Decimal>,
    pub is_published: Option<bool>,
}

/// Data needed to create a category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateCategory {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    #[schema(example = "Programming")]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_course_serialization() {
        let course = Course {
            id: 1,
            title: "Rust for Backend Engineers".to_string(),
            description: Some("From ownership to production services".to_string()),
            category_id: Some(3),
            lecturer_id: 7,
            price: dec!(49.99),
            rating_avg: 4.5,
            view_count: 1200,
            enrollment_count: 85,
            is_published: true,
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&course).expect("Failed to serialize Course");

        assert!(json.contains("\"id\":1"));
        assert!(json.contains("\"title\":\"Rust for Backend Engineers\""));
        assert!(json.contains("\"price\":\"49.99\""));
        assert!(json.contains("\"rating_avg\":4.5"));
        assert!(json.contains("\"enrollment_count\":85"));
    }

    #[test]
    fn test_update_course_partial_fields() {
        let json = r#"{
            "title": "Renamed Course",
            "price": "39.99"
        }"#;

        let update: UpdateCourse =
            serde_json::from_str(json).expect("Failed to deserialize UpdateCourse");

        assert_eq!(update.title, Some("Renamed Course".to_string()));
        assert_eq!(update.price, Some(dec!(39.99)));
        assert_eq!(update.description, None);
        assert_eq!(update.category_id, None);
        assert_eq!(update.is_published, None);
    }

    #[test]
    fn test_update_course_empty() {
        let update: UpdateCourse =
            serde_json::from_str("{}").expect("Failed to deserialize UpdateCourse");

        assert_eq!(update.title, None);
        assert_eq!(update.price, None);
    }
}
