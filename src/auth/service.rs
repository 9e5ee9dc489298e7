// Authentication service - business logic layer

use crate::auth::{
    error::AuthError,
    models::{AuthResponse, Role, UserResponse},
    password::PasswordService,
    repository::{TokenRepository, UserRepository},
    token::TokenService,
};
use chrono::{Duration, Utc};

/// Authentication service coordinating all auth operations
#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    token_repo: TokenRepository,
    token_service: std::sync::Arc<TokenService>,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        token_repo: TokenRepository,
        token_service: TokenService,
    ) -> Self {
        Self {
            user_repo,
            token_repo,
            token_service: std::sync::Arc::new(token_service),
        }
    }

    /// Register a new user
    ///
    /// New accounts always start as students; lecturer and admin roles are
    /// provisioned out of band.
    pub async fn register(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        PasswordService::validate_password_strength(password)?;

        let password_hash = PasswordService::hash_password(password)?;
        let user = self
            .user_repo
            .create(email, &password_hash, Role::Student)
            .await?;

        self.issue_tokens(user.into()).await
    }

    /// Login a user with email and password
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !PasswordService::verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_tokens(user.into()).await
    }

    /// Rotate a refresh token into a new token pair
    pub async fn refresh_tokens(&self, refresh_token: &str) -> Result<AuthResponse, AuthError> {
        // Both the signature and the stored hash must check out
        let claims = self.token_service.validate_refresh_token(refresh_token)?;

        let stored = self
            .token_repo
            .find_valid(refresh_token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if stored.user_id != claims.sub {
            return Err(AuthError::InvalidToken);
        }

        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        // Single-use rotation: the old token is gone once exchanged
        self.token_repo.delete(refresh_token).await?;

        self.issue_tokens(user.into()).await
    }

    /// Get current user information
    pub async fn get_current_user(&self, user_id: i32) -> Result<UserResponse, AuthError> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        Ok(user.into())
    }

    async fn issue_tokens(&self, user: UserResponse) -> Result<AuthResponse, AuthError> {
        let (access_token, refresh_token) =
            self.token_service
                .generate_token_pair(user.id, &user.email, user.role)?;

        self.token_repo
            .store(user.id, &refresh_token, Utc::now() + Duration::days(7))
            .await?;

        Ok(AuthResponse {
            access_token,
            refresh_token,
            user,
        })
    }
}
