// Authentication middleware for protected routes

use crate::auth::{
    error::AuthError,
    models::Role,
    token::{Claims, TokenService},
};
use axum::{
    async_trait,
    body::Body,
    extract::FromRequestParts,
    http::{header, HeaderMap, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

/// Pull and validate the bearer token out of a header map
///
/// Shared by the extractor and the role layer so the two agree on what a
/// well-formed credential is.
fn bearer_claims(headers: &HeaderMap) -> Result<Claims, AuthError> {
    let raw = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;

    let token = raw.strip_prefix("Bearer ").ok_or(AuthError::InvalidToken)?;

    let jwt_secret = std::env::var("JWT_SECRET")
        .map_err(|_| AuthError::ConfigError("JWT_SECRET not configured".to_string()))?;

    TokenService::new(jwt_secret).validate_access_token(token)
}

/// Authenticated user extractor for protected routes
///
/// Carries the acting user's id, email, and role into handlers; the
/// discount engine takes these as its "acting user" inputs.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub email: String,
    pub role: Role,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(&parts.headers)?;

        Ok(AuthenticatedUser {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
        })
    }
}

/// Authorization layer that requires a specific role
#[derive(Debug, Clone)]
pub struct RequireRole {
    required_role: Role,
}

impl RequireRole {
    pub fn new(required_role: Role) -> Self {
        Self { required_role }
    }

    pub fn admin() -> Self {
        Self::new(Role::Admin)
    }

    pub fn lecturer() -> Self {
        Self::new(Role::Lecturer)
    }

    /// Middleware function that gates the request on the required role
    pub async fn middleware(
        self,
        request: Request<Body>,
        next: Next,
    ) -> Result<Response, AuthError> {
        let endpoint = request.uri().path().to_string();

        let claims = bearer_claims(request.headers()).map_err(|e| {
            tracing::warn!("Rejected credential for {}: {}", endpoint, e);
            e
        })?;

        if claims.role != self.required_role {
            tracing::warn!(
                "Role gate refused user {} ({}) on {}; requires {}",
                claims.sub,
                claims.role,
                endpoint,
                self.required_role
            );
            return Err(AuthError::InsufficientPermissions {
                required: self.required_role,
                actual: claims.role,
            });
        }

        tracing::debug!(
            "Role gate passed: user {} ({}) on {}",
            claims.sub,
            claims.role,
            endpoint
        );
        Ok(next.run(request).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn create_parts_with_auth(auth_value: &str) -> Parts {
        let req = Request::builder()
            .uri("/")
            .header(header::AUTHORIZATION, auth_value)
            .body(())
            .unwrap();

        let (parts, _) = req.into_parts();
        parts
    }

    fn create_parts_without_auth() -> Parts {
        let req = Request::builder().uri("/").body(()).unwrap();
        let (parts, _) = req.into_parts();
        parts
    }

    fn test_token_service() -> TokenService {
        TokenService::new("test_secret_key_for_testing_purposes".to_string())
    }

    #[tokio::test]
    async fn test_valid_token_is_accepted() {
        std::env::set_var("JWT_SECRET", "test_secret_key_for_testing_purposes");

        let service = test_token_service();
        let token = service
            .generate_access_token(42, "test@example.com", Role::Lecturer)
            .unwrap();
        let auth_header = format!("Bearer {}", token);

        let mut parts = create_parts_with_auth(&auth_header);
        let result = AuthenticatedUser::from_request_parts(&mut parts, &()).await;

        assert!(result.is_ok());
        let user = result.unwrap();
        assert_eq!(user.user_id, 42);
        assert_eq!(user.email, "test@example.com");
        assert_eq!(user.role, Role::Lecturer);
    }

    #[tokio::test]
    async fn test_missing_authorization_header() {
        let mut parts = create_parts_without_auth();
        let result = AuthenticatedUser::from_request_parts(&mut parts, &()).await;

        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), AuthError::MissingToken));
    }

    #[tokio::test]
    async fn test_malformed_token_is_rejected() {
        std::env::set_var("JWT_SECRET", "test_secret_key_for_testing_purposes");

        for token in [
            "Bearer invalid_token",
            "Bearer not.a.valid.jwt",
            "Basic dXNlcjpwYXNz",
        ] {
            let mut parts = create_parts_with_auth(token);
            let result = AuthenticatedUser::from_request_parts(&mut parts, &()).await;
            assert!(result.is_err());
        }
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        std::env::set_var("JWT_SECRET", "test_secret_key_for_testing_purposes");

        use chrono::Utc;
        use jsonwebtoken::{encode, EncodingKey, Header};

        let claims = Claims {
            sub: 1,
            email: "test@example.com".to_string(),
            role: Role::Student,
            iat: Utc::now().timestamp() - 1000,
            exp: Utc::now().timestamp() - 500,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("test_secret_key_for_testing_purposes".as_bytes()),
        )
        .unwrap();

        let mut parts = create_parts_with_auth(&format!("Bearer {}", token));
        let result = AuthenticatedUser::from_request_parts(&mut parts, &()).await;

        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), AuthError::ExpiredToken));
    }
}
