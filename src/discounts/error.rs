use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error types for discount operations
///
/// Business-rule failures carry a machine-readable code; eligibility misses
/// are not errors and travel in the preview/availability result shape
/// instead.
#[derive(Debug, thiserror::Error)]
pub enum DiscountError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Discount not found")]
    NotFound,

    #[error("Course not found: {0}")]
    CourseNotFound(i32),

    #[error("Category not found: {0}")]
    CategoryNotFound(i32),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("A discount with code '{0}' already exists")]
    DuplicateCode(String),

    #[error("Discount has been redeemed; code and amount kind are frozen")]
    FrozenAfterUse,

    #[error("Course {0} is not owned by the acting lecturer")]
    NotOwner(i32),

    #[error("Lecturer owns no courses to target")]
    NoCourses,

    #[error("Discount has redemption history and cannot be deleted")]
    HasHistory,

    #[error("Discount usage limit has been exhausted")]
    UsageExhausted,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl DiscountError {
    /// Machine-readable reason code surfaced to clients
    pub fn code(&self) -> &'static str {
        match self {
            DiscountError::ValidationError(_) => "VALIDATION",
            DiscountError::NotFound => "NOT_FOUND",
            DiscountError::CourseNotFound(_) => "NOT_FOUND",
            DiscountError::CategoryNotFound(_) => "NOT_FOUND",
            DiscountError::Forbidden(_) => "FORBIDDEN",
            DiscountError::DuplicateCode(_) => "CONFLICT",
            DiscountError::FrozenAfterUse => "FROZEN_AFTER_USE",
            DiscountError::NotOwner(_) => "NOT_OWNER",
            DiscountError::NoCourses => "NO_COURSES",
            DiscountError::HasHistory => "HAS_HISTORY",
            DiscountError::UsageExhausted => "USAGE_EXHAUSTED",
            DiscountError::DatabaseError(_) => "DEPENDENCY_FAILURE",
        }
    }
}

impl From<sqlx::Error> for DiscountError {
    fn from(err: sqlx::Error) -> Self {
        DiscountError::DatabaseError(err.to_string())
    }
}

impl IntoResponse for DiscountError {
    fn into_response(self) -> Response {
        let status = match &self {
            DiscountError::ValidationError(_) => StatusCode::BAD_REQUEST,
            DiscountError::NotFound => StatusCode::NOT_FOUND,
            DiscountError::CourseNotFound(_) => StatusCode::BAD_REQUEST,
            DiscountError::CategoryNotFound(_) => StatusCode::BAD_REQUEST,
            DiscountError::Forbidden(_) => StatusCode::FORBIDDEN,
            DiscountError::DuplicateCode(_) => StatusCode::CONFLICT,
            DiscountError::FrozenAfterUse => StatusCode::CONFLICT,
            DiscountError::NotOwner(_) => StatusCode::FORBIDDEN,
            DiscountError::NoCourses => StatusCode::BAD_REQUEST,
            DiscountError::HasHistory => StatusCode::CONFLICT,
            DiscountError::UsageExhausted => StatusCode::CONFLICT,
            DiscountError::DatabaseError(msg) => {
                tracing::error!("Database error in discounts: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Storage details stay server-side
        let message = match &self {
            DiscountError::DatabaseError(_) => "A database error occurred".to_string(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "error_code": self.code(),
            "error": message,
        }));

        (status, body).into_response()
    }
}
