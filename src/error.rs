// Error handling for the catalog surface
// Course/category handlers return Result<T, ApiError>

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::Serialize;

/// Error type for the course/category CRUD surface
///
/// The discount engine carries its own richer error enum; this one covers
/// the generic catalog failure modes.
#[derive(Debug)]
pub enum ApiError {
    /// Request validation failed (field-level details attached)
    ValidationError(validator::ValidationErrors),

    /// Resource lookup by id came up empty
    NotFound { resource: String, id: String },

    /// Duplicate resource (unique title/name collision)
    Conflict { message: String },

    /// Storage operation failed; details stay server-side
    DatabaseError(sqlx::Error),

    /// Anything else that should read as a 500
    InternalError(String),

    /// Missing or unusable credentials
    Unauthorized(String),

    /// Authenticated but not allowed
    Forbidden(String),
}

/// Envelope every catalog error serializes into
///
/// `error_code` is machine-readable; `details` carries field-level
/// validation errors when present.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error_code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub timestamp: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::DatabaseError(_) | ApiError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::Conflict { .. } => "CONFLICT",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
        }
    }

    /// Client-facing message; storage and internal details are masked
    fn message(&self) -> String {
        match self {
            ApiError::ValidationError(_) => "Request validation failed".to_string(),
            ApiError::NotFound { resource, id } => {
                format!("{} with id {} not found", resource, id)
            }
            ApiError::Conflict { message } => message.clone(),
            ApiError::DatabaseError(_) => "A database error occurred".to_string(),
            ApiError::InternalError(_) => "An internal server error occurred".to_string(),
            ApiError::Unauthorized(message) | ApiError::Forbidden(message) => message.clone(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::ValidationError(errors) => {
                Some(serde_json::to_value(errors).unwrap_or(serde_json::json!({})))
            }
            _ => None,
        }
    }

    /// 500s log at error, conflicts and authz refusals at warn, expected
    /// client errors at debug
    fn log(&self) {
        match self {
            ApiError::DatabaseError(db_error) => tracing::error!("Database error: {:?}", db_error),
            ApiError::InternalError(msg) => tracing::error!("Internal error: {}", msg),
            ApiError::Conflict { message } => tracing::warn!("Conflict: {}", message),
            ApiError::Unauthorized(message) => {
                tracing::warn!("Unauthorized access attempt: {}", message)
            }
            ApiError::Forbidden(message) => {
                tracing::warn!("Forbidden access attempt: {}", message)
            }
            ApiError::ValidationError(errors) => tracing::debug!("Validation error: {:?}", errors),
            ApiError::NotFound { resource, id } => {
                tracing::debug!("Resource not found: {} with id {}", resource, id)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();

        let body = ErrorResponse {
            error_code: self.error_code().to_string(),
            message: self.message(),
            details: self.details(),
            timestamp: Utc::now().to_rfc3339(),
        };

        (self.status_code(), Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        ApiError::DatabaseError(error)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::NotFound {
                resource: "Course".to_string(),
                id: "9".to_string()
            }
            .status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Conflict {
                message: "duplicate".to_string()
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Forbidden("nope".to_string()).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_database_details_are_masked() {
        let err = ApiError::DatabaseError(sqlx::Error::PoolTimedOut);
        assert_eq!(err.error_code(), "DATABASE_ERROR");
        assert_eq!(err.message(), "A database error occurred");
        assert!(err.details().is_none());
    }

    #[test]
    fn test_validation_errors_carry_details() {
        let err = ApiError::ValidationError(validator::ValidationErrors::new());
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(err.details().is_some());
    }
}
