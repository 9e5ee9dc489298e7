// Authentication and authorization error types

use crate::auth::models::Role;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Failures of the auth surface
///
/// Credential and token problems all collapse to 401 so the response never
/// reveals which check failed; infrastructure faults log server-side and
/// surface generically.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Missing authentication token")]
    MissingToken,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Password hashing error")]
    PasswordHashError,

    #[error("Invalid password: {0}")]
    InvalidPasswordFormat(String),

    #[error("Token generation error: {0}")]
    TokenGenerationError(String),

    #[error("Insufficient permissions: required role '{required}', but user has role '{actual}'")]
    InsufficientPermissions { required: Role, actual: Role },

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AuthError {
    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::ValidationError(_) | AuthError::InvalidPasswordFormat(_) => {
                StatusCode::BAD_REQUEST
            }
            AuthError::InvalidRole(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::ExpiredToken
            | AuthError::MissingToken => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions { .. } => StatusCode::FORBIDDEN,
            AuthError::EmailAlreadyExists => StatusCode::CONFLICT,
            AuthError::DatabaseError(_)
            | AuthError::PasswordHashError
            | AuthError::TokenGenerationError(_)
            | AuthError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// What the client is told; internals stay in the logs
    fn client_message(&self) -> String {
        match self {
            AuthError::DatabaseError(_)
            | AuthError::PasswordHashError
            | AuthError::TokenGenerationError(_)
            | AuthError::ConfigError(_) => "Internal server error".to_string(),
            AuthError::InsufficientPermissions { required, .. } => {
                format!("Insufficient permissions: required role '{}'", required)
            }
            other => other.to_string(),
        }
    }

    fn log(&self) {
        match self {
            AuthError::DatabaseError(_)
            | AuthError::PasswordHashError
            | AuthError::TokenGenerationError(_)
            | AuthError::ConfigError(_) => tracing::error!("{}", self),
            AuthError::InvalidToken
            | AuthError::ExpiredToken
            | AuthError::MissingToken
            | AuthError::InsufficientPermissions { .. }
            | AuthError::InvalidRole(_) => tracing::warn!("{}", self),
            _ => tracing::debug!("{}", self),
        }
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::DatabaseError(err.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();

        let body = Json(json!({
            "error": self.client_message(),
        }));

        (self.status_code(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_failures_are_unauthorized() {
        for err in [
            AuthError::InvalidCredentials,
            AuthError::InvalidToken,
            AuthError::ExpiredToken,
            AuthError::MissingToken,
        ] {
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_internal_faults_are_masked() {
        let err = AuthError::DatabaseError("connection refused to db:5432".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.client_message().contains("db:5432"));
    }

    #[test]
    fn test_permission_message_omits_actual_role() {
        let err = AuthError::InsufficientPermissions {
            required: Role::Admin,
            actual: Role::Student,
        };
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert!(err.client_message().contains("admin"));
        assert!(!err.client_message().contains("student"));
    }
}
