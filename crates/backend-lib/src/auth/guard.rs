// ============================
// crates/backend-lib/src/auth/guard.rs
// ============================
//! Per-request access-token verification.
//!
//! The token is taken from the `accessToken` cookie, falling back to an
//! `Authorization: Bearer` header. The user record is re-read on every request,
//! so a deleted or renamed user is reflected immediately rather than when the
//! access token expires.
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use metrics::counter;
use streamhub_common::{UserId, UserProfile};
use tracing::debug;

use super::cookies::{cookie_value, ACCESS_COOKIE};
use super::session::SessionService;
use crate::error::{AppError, AppResult};
use crate::metrics as keys;
use crate::storage::UserStore;

/// Identity attached to a request that passed the guard
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub profile: UserProfile,
}

impl AuthenticatedUser {
    pub fn id(&self) -> UserId {
        self.profile.id
    }
}

/// Find the presented access token, cookie first
pub fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, ACCESS_COOKIE).or_else(|| extract_bearer_token(headers))
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn reject(reason: &'static str) -> AppError {
    counter!(keys::GUARD_REJECTED).increment(1);
    debug!(reason, "request rejected by auth guard");
    AppError::Unauthorized(reason.to_string())
}

/// Resolve an access token to the current user.
///
/// Missing, invalid and orphaned tokens all yield `Unauthorized`. Store
/// failures are passed through unchanged.
pub async fn authenticate<S: UserStore>(
    sessions: &SessionService<S>,
    token: Option<&str>,
) -> AppResult<AuthenticatedUser> {
    let token = token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| reject("access token missing"))?;

    let claims = sessions
        .tokens()
        .verify_access(token)
        .map_err(|_| reject("invalid access token"))?;

    let user = sessions
        .find_user(claims.sub)
        .await?
        .ok_or_else(|| reject("token subject no longer exists"))?;

    Ok(AuthenticatedUser {
        profile: user.profile(),
    })
}

impl<St: Send + Sync> FromRequestParts<St> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("route is not behind the auth guard".to_string()))
    }
}
