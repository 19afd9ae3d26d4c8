// ============================
// crates/backend-lib/src/auth/session.rs
// ============================
//! Login, refresh-token rotation, logout and account maintenance.
//!
//! A user has at most one live refresh token, stored on the record. Refresh
//! succeeds only for that exact token and atomically replaces it, so every
//! refresh token is usable once. Logout empties the slot. Access tokens are
//! never revoked; they simply expire.
use std::future::Future;
use std::time::Duration;

use metrics::counter;
use streamhub_common::{
    ChangePasswordRequest, LoginRequest, RegisterRequest, TokenPair, UpdateAccountRequest,
    UserId, UserProfile,
};
use tracing::{debug, info, warn};

use super::password::PasswordHasher;
use super::token::{TokenError, TokenIssuer};
use crate::config::AuthSettings;
use crate::error::{AppError, AppResult};
use crate::metrics as keys;
use crate::models::{NewUser, RefreshMatch, UserPatch, UserRecord};
use crate::storage::UserStore;
use crate::validation::{
    validate_account_update, validate_media_url, validate_password, validate_registration,
    ValidationError,
};

/// Verified against when the login key is unknown, so both failure paths
/// pay for one hash verification.
const DUMMY_PASSWORD: &str = "streamhub-dummy-password";

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: UserProfile,
    pub tokens: TokenPair,
}

/// Which media URL an update targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaField {
    Avatar,
    CoverImage,
}

/// Session and account operations over a [`UserStore`]
pub struct SessionService<S> {
    store: S,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
    op_timeout: Duration,
    dummy_hash: String,
}

impl<S: UserStore> SessionService<S> {
    /// Create a new session service
    pub fn new(store: S, settings: &AuthSettings) -> AppResult<Self> {
        let hasher = PasswordHasher::from_settings(settings)?;
        let dummy_hash = hasher.hash(DUMMY_PASSWORD)?;
        Ok(Self {
            store,
            tokens: TokenIssuer::new(settings)?,
            hasher,
            op_timeout: settings.operation_timeout(),
            dummy_hash,
        })
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run an external call under the configured timeout
    async fn bounded<T>(&self, fut: impl Future<Output = AppResult<T>>) -> AppResult<T> {
        tokio::time::timeout(self.op_timeout, fut).await?
    }

    fn issue_pair(&self, user: &UserRecord) -> AppResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.tokens.issue_access(user)?,
            refresh_token: self.tokens.issue_refresh(user.id)?,
        })
    }

    /// Load a user by id under the operation timeout
    pub async fn find_user(&self, id: UserId) -> AppResult<Option<UserRecord>> {
        self.bounded(self.store.find_by_id(id)).await
    }

    /// Register a new user
    #[tracing::instrument(skip_all, fields(username = %req.username))]
    pub async fn register(&self, req: &RegisterRequest) -> AppResult<UserProfile> {
        let valid = validate_registration(req)?;

        // Fail fast before paying for the hash; the store re-checks atomically
        if self.bounded(self.store.find_by_key(&valid.username)).await?.is_some() {
            return Err(AppError::Conflict("Username is already taken".to_string()));
        }
        if self.bounded(self.store.find_by_key(&valid.email)).await?.is_some() {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }

        let password_hash = self.bounded(self.hasher.hash_async(&req.password)).await?;
        let record = self
            .bounded(self.store.create(NewUser {
                username: valid.username,
                email: valid.email,
                fullname: valid.fullname,
                avatar: valid.avatar,
                cover_image: valid.cover_image,
                password_hash,
            }))
            .await?;

        counter!(keys::USER_REGISTERED).increment(1);
        info!(user_id = %record.id, "user registered");
        Ok(record.profile())
    }

    /// Verify credentials and start a session.
    ///
    /// An unknown user and a wrong password are indistinguishable to the caller.
    #[tracing::instrument(skip_all)]
    pub async fn login(&self, req: &LoginRequest) -> AppResult<LoginOutcome> {
        let key = req
            .key()
            .ok_or(ValidationError::Missing("username or email"))?;
        validate_password(&req.password)?;

        let user = self.bounded(self.store.find_by_key(key)).await?;
        let hash = user.as_ref().map_or(self.dummy_hash.as_str(), |u| u.password_hash.as_str());
        let password_ok = self.bounded(self.hasher.verify_async(&req.password, hash)).await?;

        let user = match user {
            Some(user) if password_ok => user,
            Some(user) => {
                counter!(keys::LOGIN_FAILED).increment(1);
                debug!(user_id = %user.id, "login rejected: wrong password");
                return Err(AppError::InvalidCredentials);
            },
            None => {
                counter!(keys::LOGIN_FAILED).increment(1);
                debug!("login rejected: unknown user");
                return Err(AppError::InvalidCredentials);
            },
        };

        let tokens = self.issue_pair(&user)?;
        let user = self
            .bounded(self.store.update_fields(
                user.id,
                UserPatch::set_refresh_token(tokens.refresh_token.clone()),
                None,
            ))
            .await?
            .ok_or_else(|| AppError::NotFound("user".to_string()))?;

        counter!(keys::LOGIN_SUCCEEDED).increment(1);
        info!(user_id = %user.id, "user logged in");
        Ok(LoginOutcome {
            user: user.profile(),
            tokens,
        })
    }

    /// Exchange the current refresh token for a new pair.
    ///
    /// The presented token must equal the stored one, and the replacement is a
    /// compare-and-swap against it: of two concurrent calls with the same token
    /// at most one succeeds.
    #[tracing::instrument(skip_all)]
    pub async fn refresh(&self, presented: Option<&str>) -> AppResult<TokenPair> {
        let presented = presented
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("refresh token missing".to_string()))?;

        let claims = self.tokens.verify_refresh(presented)?;
        let user = self
            .find_user(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken(TokenError::UnknownSubject))?;

        if user.refresh_token.as_deref() != Some(presented) {
            counter!(keys::REFRESH_REUSED).increment(1);
            warn!(user_id = %user.id, "refresh rejected: token is not the current one");
            return Err(AppError::TokenReused);
        }

        let tokens = self.issue_pair(&user)?;
        let rotated = self
            .bounded(self.store.update_fields(
                user.id,
                UserPatch::set_refresh_token(tokens.refresh_token.clone()),
                Some(RefreshMatch::Exactly(presented.to_string())),
            ))
            .await?;
        if rotated.is_none() {
            counter!(keys::REFRESH_REUSED).increment(1);
            warn!(user_id = %user.id, "refresh rejected: lost rotation race");
            return Err(AppError::TokenReused);
        }

        counter!(keys::REFRESH_SUCCEEDED).increment(1);
        debug!(user_id = %user.id, "refresh token rotated");
        Ok(tokens)
    }

    /// End the session by clearing the refresh slot. Idempotent.
    #[tracing::instrument(skip(self))]
    pub async fn logout(&self, user_id: UserId) -> AppResult<()> {
        self.bounded(self.store.update_fields(user_id, UserPatch::clear_refresh_token(), None))
            .await?
            .ok_or_else(|| AppError::NotFound("user".to_string()))?;
        counter!(keys::LOGOUT).increment(1);
        info!(%user_id, "user logged out");
        Ok(())
    }

    /// Replace the password after re-verifying the old one.
    ///
    /// The refresh slot is left as is, so existing sessions stay valid.
    #[tracing::instrument(skip(self, req))]
    pub async fn change_password(
        &self,
        user_id: UserId,
        req: &ChangePasswordRequest,
    ) -> AppResult<()> {
        validate_password(&req.new_password)?;
        let user = self
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user".to_string()))?;

        let old_ok = self
            .bounded(self.hasher.verify_async(&req.old_password, &user.password_hash))
            .await?;
        if !old_ok {
            debug!(%user_id, "password change rejected: wrong old password");
            return Err(AppError::InvalidCredentials);
        }

        let password_hash = self.bounded(self.hasher.hash_async(&req.new_password)).await?;
        self.bounded(self.store.update_fields(
            user_id,
            UserPatch {
                password_hash: Some(password_hash),
                ..UserPatch::default()
            },
            None,
        ))
        .await?
        .ok_or_else(|| AppError::NotFound("user".to_string()))?;

        info!(%user_id, "password changed");
        Ok(())
    }

    pub async fn current_user(&self, user_id: UserId) -> AppResult<UserProfile> {
        self.find_user(user_id)
            .await?
            .map(|u| u.profile())
            .ok_or_else(|| AppError::NotFound("user".to_string()))
    }

    /// Update full name and/or email
    #[tracing::instrument(skip(self, req))]
    pub async fn update_account(
        &self,
        user_id: UserId,
        req: &UpdateAccountRequest,
    ) -> AppResult<UserProfile> {
        let (fullname, email) = validate_account_update(req)?;
        let patch = UserPatch {
            fullname,
            email,
            ..UserPatch::default()
        };
        self.apply_patch(user_id, patch).await
    }

    /// Store a media URL produced by the external media service
    #[tracing::instrument(skip(self, url))]
    pub async fn update_media(
        &self,
        user_id: UserId,
        field: MediaField,
        url: &str,
    ) -> AppResult<UserProfile> {
        let patch = match field {
            MediaField::Avatar => UserPatch {
                avatar: Some(validate_media_url("avatar", url)?),
                ..UserPatch::default()
            },
            MediaField::CoverImage => UserPatch {
                cover_image: Some(validate_media_url("coverImage", url)?),
                ..UserPatch::default()
            },
        };
        self.apply_patch(user_id, patch).await
    }

    async fn apply_patch(&self, user_id: UserId, patch: UserPatch) -> AppResult<UserProfile> {
        self.bounded(self.store.update_fields(user_id, patch, None))
            .await?
            .map(|u| u.profile())
            .ok_or_else(|| AppError::NotFound("user".to_string()))
    }
}
