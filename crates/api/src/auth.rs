//! Bearer-token identity provider and password hashing.
//!
//! Tokens are HS256 JWTs carrying `{sub: email, id, role}`; passwords are
//! hashed with Argon2 default parameters.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use common::{Principal, Role, UserId};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;

/// JWT claims for an access token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    id: Uuid,
    role: String,
    exp: i64,
}

/// Token issuing/verification keys derived from the configured secret.
#[derive(Clone)]
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl AuthKeys {
    /// Builds keys from an HMAC secret and a token lifetime in minutes.
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Issues an access token for a principal.
    pub fn issue(&self, principal: &Principal) -> Result<String, ApiError> {
        let claims = Claims {
            sub: principal.email.clone(),
            id: principal.id.as_uuid(),
            role: principal.role.as_str().to_string(),
            exp: (Utc::now() + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("failed to sign token: {e}")))
    }

    /// Verifies a token and reconstructs the request principal.
    pub fn verify(&self, token: &str) -> Result<Principal, ApiError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| ApiError::Unauthorized("Could not validate credentials".to_string()))?;

        let role = Role::parse(&data.claims.role)
            .ok_or_else(|| ApiError::Unauthorized("Could not validate credentials".to_string()))?;

        Ok(Principal {
            id: UserId::from_uuid(data.claims.id),
            email: data.claims.sub,
            role,
        })
    }
}

/// Hashes a plain-text password with Argon2 and a random salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
}

/// Verifies a plain-text password against a stored Argon2 hash.
pub fn verify_password(stored_hash: &str, password: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| ApiError::Internal(format!("stored password hash is invalid: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn bearer_principal(parts: &Parts, state: &Arc<AppState>) -> Result<Principal, ApiError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Expected a bearer token".to_string()))?;

    state.auth.verify(token)
}

/// Extractor for the authenticated principal.
#[derive(Debug, Clone)]
pub struct AuthPrincipal(pub Principal);

impl FromRequestParts<Arc<AppState>> for AuthPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        bearer_principal(parts, state).map(AuthPrincipal)
    }
}

/// Extractor that additionally requires the admin role.
#[derive(Debug, Clone)]
pub struct AdminPrincipal(pub Principal);

impl FromRequestParts<Arc<AppState>> for AdminPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let principal = bearer_principal(parts, state)?;
        if !principal.is_admin() {
            return Err(ApiError::Forbidden("Not authorized".to_string()));
        }
        Ok(AdminPrincipal(principal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role) -> Principal {
        Principal {
            id: UserId::new(),
            email: "ada@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn token_roundtrip_preserves_principal() {
        let keys = AuthKeys::new("test-secret", 30);
        let original = principal(Role::Admin);

        let token = keys.issue(&original).unwrap();
        let restored = keys.verify(&token).unwrap();

        assert_eq!(restored, original);
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let keys = AuthKeys::new("secret-a", 30);
        let other = AuthKeys::new("secret-b", 30);

        let token = keys.issue(&principal(Role::Customer)).unwrap();
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = AuthKeys::new("test-secret", -5);
        let token = keys.issue(&principal(Role::Customer)).unwrap();
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn password_hash_verify_roundtrip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password(&hash, "correct horse battery staple").unwrap());
        assert!(!verify_password(&hash, "wrong password").unwrap());
    }
}
