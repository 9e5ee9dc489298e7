// JWT token generation and validation service

use crate::auth::error::AuthError;
use crate::auth::models::Role;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Access tokens live 15 minutes
const ACCESS_TOKEN_LIFETIME_SECS: i64 = 900;
/// Refresh tokens live 7 days
const REFRESH_TOKEN_LIFETIME_SECS: i64 = 604_800;

/// JWT claims carried by both token kinds
///
/// `sub` is the user id; `role` rides along so the authorization layers
/// never need a database round trip.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,
    pub email: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

/// Token service for JWT operations
///
/// Keys are derived from the secret once at construction.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(secret: String) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn generate_access_token(
        &self,
        user_id: i32,
        email: &str,
        role: Role,
    ) -> Result<String, AuthError> {
        self.sign(user_id, email, role, ACCESS_TOKEN_LIFETIME_SECS)
    }

    pub fn generate_refresh_token(
        &self,
        user_id: i32,
        email: &str,
        role: Role,
    ) -> Result<String, AuthError> {
        self.sign(user_id, email, role, REFRESH_TOKEN_LIFETIME_SECS)
    }

    /// Generate both access and refresh tokens
    pub fn generate_token_pair(
        &self,
        user_id: i32,
        email: &str,
        role: Role,
    ) -> Result<(String, String), AuthError> {
        Ok((
            self.generate_access_token(user_id, email, role)?,
            self.generate_refresh_token(user_id, email, role)?,
        ))
    }

    pub fn validate_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(token)
    }

    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(token)
    }

    fn sign(
        &self,
        user_id: i32,
        email: &str,
        role: Role,
        lifetime_secs: i64,
    ) -> Result<String, AuthError> {
        let issued_at = Utc::now().timestamp();

        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            role,
            iat: issued_at,
            exp: issued_at + lifetime_secs,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGenerationError(e.to_string()))
    }

    fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::InvalidToken,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_token_service() -> TokenService {
        TokenService::new("test_secret_key_for_testing_purposes".to_string())
    }

    #[test]
    fn test_access_token_expiration_is_15_minutes() {
        let service = test_token_service();
        let token = service
            .generate_access_token(1, "test@example.com", Role::Student)
            .unwrap();
        let claims = service.validate_access_token(&token).unwrap();

        assert_eq!(claims.exp - claims.iat, ACCESS_TOKEN_LIFETIME_SECS);
    }

    #[test]
    fn test_refresh_token_expiration_is_7_days() {
        let service = test_token_service();
        let token = service
            .generate_refresh_token(1, "test@example.com", Role::Student)
            .unwrap();
        let claims = service.validate_refresh_token(&token).unwrap();

        assert_eq!(claims.exp - claims.iat, REFRESH_TOKEN_LIFETIME_SECS);
    }

    #[test]
    fn test_token_claims_contain_identity_and_role() {
        let service = test_token_service();
        let token = service
            .generate_access_token(42, "lecturer@example.com", Role::Lecturer)
            .unwrap();
        let claims = service.validate_access_token(&token).unwrap();

        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "lecturer@example.com");
        assert_eq!(claims.role, Role::Lecturer);
    }

    #[test]
    fn test_generate_token_pair() {
        let service = test_token_service();
        let (access_token, refresh_token) = service
            .generate_token_pair(1, "test@example.com", Role::Admin)
            .unwrap();

        assert!(service.validate_access_token(&access_token).is_ok());
        assert!(service.validate_refresh_token(&refresh_token).is_ok());
        assert_ne!(access_token, refresh_token);
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        let service = test_token_service();

        assert!(service.validate_access_token("").is_err());
        assert!(service.validate_access_token("not.a.token").is_err());
        assert!(service
            .validate_access_token("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.invalid.signature")
            .is_err());
    }

    #[test]
    fn test_token_signature_verification() {
        let service1 = TokenService::new("secret1".to_string());
        let service2 = TokenService::new("secret2".to_string());

        let token = service1
            .generate_access_token(1, "test@example.com", Role::Student)
            .unwrap();

        assert!(service1.validate_access_token(&token).is_ok());
        assert!(service2.validate_access_token(&token).is_err());
    }

    proptest! {
        #[test]
        fn prop_valid_tokens_are_accepted(
            user_id in 1i32..1000000,
            email in "[a-z]{3,10}@[a-z]{3,10}\\.(com|org|net)"
        ) {
            let service = test_token_service();

            let token = service.generate_access_token(user_id, &email, Role::Student)?;
            let claims = service.validate_access_token(&token)?;
            prop_assert_eq!(claims.sub, user_id);
            prop_assert_eq!(claims.email, email);
        }

        #[test]
        fn prop_malformed_tokens_rejected(
            malformed in "[a-zA-Z0-9]{10,50}"
        ) {
            let service = test_token_service();
            prop_assert!(service.validate_access_token(&malformed).is_err());
        }
    }
}
