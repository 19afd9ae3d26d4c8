// ============================
// crates/backend-lib/src/auth/token.rs
// ============================
//! Signed access and refresh tokens.
//!
//! Both kinds are HS256 JWTs, each signed with its own secret so that a leaked
//! access secret cannot forge refresh tokens and vice versa. Verification
//! checks signature and expiry only; whether a refresh token is still the
//! current one is decided by the session layer.
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use streamhub_common::UserId;
use thiserror::Error;
use uuid::Uuid;

use crate::config::AuthSettings;
use crate::error::{AppError, AppResult};
use crate::models::UserRecord;

/// Why a token failed verification. Only ever logged; clients see one error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token signature is invalid")]
    BadSignature,

    #[error("token is malformed: {0}")]
    Malformed(String),

    #[error("token subject does not exist")]
    UnknownSubject,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::BadSignature,
            _ => TokenError::Malformed(e.to_string()),
        }
    }
}

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessClaims {
    pub sub: UserId,
    pub email: String,
    pub username: String,
    pub fullname: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

/// Claims carried by a refresh token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshClaims {
    pub sub: UserId,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl KeyPair {
    fn new(secret: &str, ttl: std::time::Duration) -> AppResult<Self> {
        let ttl = Duration::from_std(ttl)
            .map_err(|e| AppError::Internal(format!("token TTL out of range: {e}")))?;
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }

    /// Expiry timestamp for a token issued at `now`
    fn expiry(&self, now: DateTime<Utc>) -> AppResult<i64> {
        now.checked_add_signed(self.ttl)
            .map(|exp| exp.timestamp())
            .ok_or_else(|| AppError::Internal("token expiry is out of range".to_string()))
    }
}

/// Mints and verifies both token kinds
pub struct TokenIssuer {
    access: KeyPair,
    refresh: KeyPair,
    validation: Validation,
}

impl TokenIssuer {
    /// Build an issuer from explicit settings
    pub fn new(settings: &AuthSettings) -> AppResult<Self> {
        if settings.access_token_secret.is_empty() || settings.refresh_token_secret.is_empty() {
            return Err(AppError::Internal("token secrets must be configured".to_string()));
        }
        if settings.access_token_secret == settings.refresh_token_secret {
            return Err(AppError::Internal(
                "access and refresh secrets must differ".to_string(),
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            access: KeyPair::new(&settings.access_token_secret, settings.access_ttl())?,
            refresh: KeyPair::new(&settings.refresh_token_secret, settings.refresh_ttl())?,
            validation,
        })
    }

    pub fn issue_access(&self, user: &UserRecord) -> AppResult<String> {
        self.issue_access_at(user, Utc::now())
    }

    /// Mint an access token as if issued at `now`
    pub fn issue_access_at(&self, user: &UserRecord, now: DateTime<Utc>) -> AppResult<String> {
        let claims = AccessClaims {
            sub: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            fullname: user.fullname.clone(),
            iat: now.timestamp(),
            exp: self.access.expiry(now)?,
            jti: Uuid::new_v4(),
        };
        sign(&claims, &self.access.encoding)
    }

    pub fn issue_refresh(&self, user_id: UserId) -> AppResult<String> {
        self.issue_refresh_at(user_id, Utc::now())
    }

    /// Mint a refresh token as if issued at `now`
    pub fn issue_refresh_at(&self, user_id: UserId, now: DateTime<Utc>) -> AppResult<String> {
        let claims = RefreshClaims {
            sub: user_id,
            iat: now.timestamp(),
            exp: self.refresh.expiry(now)?,
            jti: Uuid::new_v4(),
        };
        sign(&claims, &self.refresh.encoding)
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        decode::<AccessClaims>(token, &self.access.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let err = TokenError::from(e);
                tracing::debug!(reason = %err, "access token rejected");
                err
            })
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        decode::<RefreshClaims>(token, &self.refresh.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let err = TokenError::from(e);
                tracing::debug!(reason = %err, "refresh token rejected");
                err
            })
    }

    pub fn access_ttl(&self) -> Duration {
        self.access.ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh.ttl
    }
}

fn sign<T: Serialize>(claims: &T, key: &EncodingKey) -> AppResult<String> {
    encode(&Header::new(Algorithm::HS256), claims, key)
        .map_err(|e| AppError::Internal(format!("failed to sign token: {e}")))
}
