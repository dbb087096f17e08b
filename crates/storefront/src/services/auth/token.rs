//! Signed access tokens (HS256 JWT).

use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use gamevault_core::UserId;

use super::AuthError;
use crate::config::AuthConfig;
use crate::models::{CurrentUser, User};

/// JWT claims carried by every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a decimal string.
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub admin: bool,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies access tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("keys", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenService {
    /// Build the service from auth configuration.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: Duration::hours(config.token_ttl_hours),
        }
    }

    /// Sign a token for a user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenSigning` if encoding fails.
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.to_string(),
            admin: user.is_admin,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::TokenSigning(e.to_string()))
    }

    /// Verify a token's signature and expiry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for any malformed, expired or
    /// badly signed token.
    pub fn verify(&self, token: &str) -> Result<CurrentUser, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let id: UserId = data
            .claims
            .sub
            .parse()
            .map_err(|_| AuthError::InvalidToken("subject is not a user id".to_owned()))?;

        Ok(CurrentUser {
            id,
            email: data.claims.email,
            is_admin: data.claims.admin,
        })
    }
}
