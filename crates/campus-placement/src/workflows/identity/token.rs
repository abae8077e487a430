use std::fmt;

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use jwt::{SignWithKey, VerifyWithKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::workflows::ids::UserId;

use super::domain::{Principal, ProfileRef, Role, UserAccount};

/// JWT payload issued at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub profile: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn principal(&self) -> Principal {
        Principal {
            user_id: UserId::from(self.sub.as_str()),
            profile: ProfileRef::from_parts(self.role, &self.profile),
        }
    }
}

/// HS256 signer and verifier for bearer tokens.
pub struct TokenCodec {
    key: Hmac<Sha256>,
    ttl: Duration,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("key", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenCodec {
    pub fn new(secret: &str, ttl_hours: u32) -> Result<Self, TokenError> {
        let key = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .map_err(|_| TokenError::InvalidKey)?;
        Ok(Self {
            key,
            ttl: Duration::hours(i64::from(ttl_hours)),
        })
    }

    pub fn issue(&self, account: &UserAccount, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            sub: account.id.to_string(),
            role: account.role(),
            profile: account.profile.id().to_string(),
            iat: now.timestamp(),
            exp: now
                .checked_add_signed(self.ttl)
                .ok_or(TokenError::ExpiryOutOfRange)?
                .timestamp(),
        };
        claims
            .sign_with_key(&self.key)
            .map_err(|error| TokenError::Signing(error.to_string()))
    }

    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let claims: Claims = token
            .verify_with_key(&self.key)
            .map_err(|_| TokenError::Invalid)?;
        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token key rejected")]
    InvalidKey,
    #[error("failed to sign token: {0}")]
    Signing(String),
    #[error("invalid token")]
    Invalid,
    #[error("token expired")]
    Expired,
    #[error("token expiry is out of range")]
    ExpiryOutOfRange,
}
