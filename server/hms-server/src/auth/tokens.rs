//! Session token issuing and verification
//!
//! Tokens are HS256 JWTs. The role claim is informational: request identity is
//! always rebuilt from the stored account the `sub` claim points to.

use auth_rbac::Role;
use chrono::{DateTime, Duration, Utc};
use database_layer::User;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::AuthError;

// =============================================================================
// JWT TOKEN CLAIMS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,

    pub email: String,

    pub role: Role,

    pub name: String,

    /// Issued at timestamp (seconds since epoch)
    pub iat: i64,

    /// Expiration timestamp (seconds since epoch)
    pub exp: i64,

    /// Issuer
    pub iss: String,
}

impl TokenClaims {
    pub fn new(user: &User, issuer: &str, ttl_seconds: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            name: user.name.clone(),
            iat: now,
            exp: now + ttl_seconds,
            iss: issuer.to_string(),
        }
    }

    /// Numeric user id from `sub`
    pub fn user_id(&self) -> Result<i64, AuthError> {
        self.sub
            .parse()
            .map_err(|_| AuthError::InvalidToken("subject is not a user id".to_string()))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

// =============================================================================
// TOKEN SERVICE
// =============================================================================

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl_seconds: i64,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.issuer)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &str, issuer: impl Into<String>, ttl_seconds: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            ttl_seconds,
        }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Sign a session token for `user`
    pub fn issue(&self, user: &User) -> Result<IssuedToken, AuthError> {
        self.issue_with_ttl(user, self.ttl_seconds)
    }

    pub fn issue_with_ttl(&self, user: &User, ttl_seconds: i64) -> Result<IssuedToken, AuthError> {
        let claims = TokenClaims::new(user, &self.issuer, ttl_seconds);
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_at: Utc::now() + Duration::seconds(ttl_seconds),
        })
    }

    /// Check signature, issuer and expiry
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 12,
            name: "Dr. Sarah Johnson".to_string(),
            email: "doctor1@hospital.com".to_string(),
            password_hash: String::new(),
            role: Role::Doctor,
            created_at: Utc::now(),
        }
    }

    fn service() -> TokenService {
        TokenService::new("test-secret-that-is-long-enough-for-hs256", "hms-test", 3600)
    }

    #[test]
    fn issued_token_verifies() {
        let service = service();
        let issued = service.issue(&user()).unwrap();
        let claims = service.verify(&issued.token).unwrap();

        assert_eq!(claims.user_id().unwrap(), 12);
        assert_eq!(claims.role, Role::Doctor);
        assert_eq!(claims.iss, "hms-test");
    }

    #[test]
    fn expired_token_is_rejected() {
        let service = service();
        let issued = service.issue_with_ttl(&user(), -3600).unwrap();
        assert!(matches!(
            service.verify(&issued.token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let other = TokenService::new("another-secret-that-is-long-enough-xx", "hms-test", 3600);
        let issued = other.issue(&user()).unwrap();
        assert!(service().verify(&issued.token).is_err());
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let other = TokenService::new(
            "test-secret-that-is-long-enough-for-hs256",
            "someone-else",
            3600,
        );
        let issued = other.issue(&user()).unwrap();
        assert!(service().verify(&issued.token).is_err());
    }
}
