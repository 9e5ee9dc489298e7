// Authentication data models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Platform role
///
/// Closed set: the compiler enforces exhaustiveness wherever role-specific
/// behavior branches. Authoring capabilities are expressed as methods so the
/// discount engine never compares role strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Lecturer,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Lecturer => "lecturer",
            Role::Student => "student",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "lecturer" => Ok(Role::Lecturer),
            "student" => Ok(Role::Student),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }

    /// Whether this role may author category-scoped discounts
    pub fn can_target_categories(&self) -> bool {
        match self {
            Role::Admin => true,
            Role::Lecturer | Role::Student => false,
        }
    }

    /// Whether this role may auto-target the weakest-performing courses
    pub fn can_auto_target_weak(&self) -> bool {
        match self {
            Role::Admin => true,
            Role::Lecturer | Role::Student => false,
        }
    }

    /// Whether explicit course targets must be owned by the acting user
    pub fn requires_course_ownership(&self) -> bool {
        match self {
            Role::Lecturer => true,
            Role::Admin | Role::Student => false,
        }
    }

    /// Whether this role may author discounts at all
    pub fn can_author_discounts(&self) -> bool {
        match self {
            Role::Admin | Role::Lecturer => true,
            Role::Student => false,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User database model
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// User response model (excludes password_hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Refresh token database model
#[derive(Debug, Clone, FromRow)]
pub struct RefreshToken {
    pub id: i32,
    pub user_id: i32,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Registration request DTO
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
}

/// Login request DTO
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

/// Token refresh request DTO
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Authentication response DTO
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Admin, Role::Lecturer, Role::Student] {
            assert_eq!(Role::from_str(role.as_str()).unwrap(), role);
        }
        assert!(Role::from_str("superuser").is_err());
    }

    #[test]
    fn test_role_capabilities() {
        assert!(Role::Admin.can_target_categories());
        assert!(Role::Admin.can_auto_target_weak());
        assert!(!Role::Admin.requires_course_ownership());

        assert!(!Role::Lecturer.can_target_categories());
        assert!(!Role::Lecturer.can_auto_target_weak());
        assert!(Role::Lecturer.requires_course_ownership());
        assert!(Role::Lecturer.can_author_discounts());

        assert!(!Role::Student.can_author_discounts());
    }
}
