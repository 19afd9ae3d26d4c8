// ============================
// crates/backend-lib/src/handlers/users.rs
// ============================
//! `/api/v1/users` endpoints.
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;
use streamhub_common::{
    ChangePasswordRequest, LoginRequest, LoginResponse, MediaUpdateRequest, RefreshRequest,
    RegisterRequest, TokenPair, UpdateAccountRequest,
};

use super::{envelope, JsonBody};
use crate::auth::cookies::{clear_cookie, cookie_value, session_cookie, ACCESS_COOKIE, REFRESH_COOKIE};
use crate::auth::{AuthenticatedUser, MediaField};
use crate::error::{AppError, AppResult};
use crate::storage::UserStore;
use crate::AppState;

/// `Set-Cookie` headers for a freshly issued pair
fn token_cookies<S: UserStore>(state: &AppState<S>, tokens: &TokenPair) -> AppResult<HeaderMap> {
    let secure = state.settings.auth.secure_cookies;
    let issuer = state.sessions.tokens();
    let mut headers = HeaderMap::new();
    headers.append(
        SET_COOKIE,
        to_header(session_cookie(
            ACCESS_COOKIE,
            &tokens.access_token,
            issuer.access_ttl().num_seconds(),
            secure,
        ))?,
    );
    headers.append(
        SET_COOKIE,
        to_header(session_cookie(
            REFRESH_COOKIE,
            &tokens.refresh_token,
            issuer.refresh_ttl().num_seconds(),
            secure,
        ))?,
    );
    Ok(headers)
}

fn to_header(
    value: Result<HeaderValue, axum::http::header::InvalidHeaderValue>,
) -> AppResult<HeaderValue> {
    value.map_err(|e| AppError::Internal(format!("failed to build cookie: {e}")))
}

/// `POST /register`
pub async fn register<S: UserStore + 'static>(
    State(state): State<AppState<S>>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> AppResult<Response> {
    let user = state.sessions.register(&req).await?;
    Ok(envelope(StatusCode::CREATED, user, "User registered successfully").into_response())
}

/// `POST /login`
pub async fn login<S: UserStore + 'static>(
    State(state): State<AppState<S>>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> AppResult<Response> {
    let outcome = state.sessions.login(&req).await?;
    let cookies = token_cookies(&state, &outcome.tokens)?;
    let body = LoginResponse {
        user: outcome.user,
        access_token: outcome.tokens.access_token,
        refresh_token: outcome.tokens.refresh_token,
    };
    Ok((cookies, envelope(StatusCode::OK, body, "User logged in successfully")).into_response())
}

/// `POST /refresh-token`
///
/// The refresh token comes from the `refreshToken` cookie, or from a JSON body
/// when the cookie is absent.
pub async fn refresh_token<S: UserStore + 'static>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<Response> {
    let body = body.map_err(|rejection| AppError::InvalidInput(rejection.body_text()))?;
    let presented = match cookie_value(&headers, REFRESH_COOKIE) {
        Some(token) => Some(token),
        None if body.is_empty() => None,
        None => {
            let req: RefreshRequest = serde_json::from_slice(&body)
                .map_err(|e| AppError::InvalidInput(format!("invalid request body: {e}")))?;
            req.refresh_token
        },
    };

    let tokens = state.sessions.refresh(presented.as_deref()).await?;
    let cookies = token_cookies(&state, &tokens)?;
    Ok((cookies, envelope(StatusCode::OK, tokens, "Access token refreshed")).into_response())
}

/// `POST /logout`
pub async fn logout<S: UserStore + 'static>(
    State(state): State<AppState<S>>,
    user: AuthenticatedUser,
) -> AppResult<Response> {
    state.sessions.logout(user.id()).await?;

    let secure = state.settings.auth.secure_cookies;
    let mut cookies = HeaderMap::new();
    cookies.append(SET_COOKIE, to_header(clear_cookie(ACCESS_COOKIE, secure))?);
    cookies.append(SET_COOKIE, to_header(clear_cookie(REFRESH_COOKIE, secure))?);
    Ok((cookies, envelope(StatusCode::OK, json!({}), "User logged out")).into_response())
}

/// `POST /change-password`
pub async fn change_password<S: UserStore + 'static>(
    State(state): State<AppState<S>>,
    user: AuthenticatedUser,
    JsonBody(req): JsonBody<ChangePasswordRequest>,
) -> AppResult<Response> {
    state.sessions.change_password(user.id(), &req).await?;
    Ok(envelope(StatusCode::OK, json!({}), "Password changed successfully").into_response())
}

/// `GET /current-user`
pub async fn current_user(user: AuthenticatedUser) -> Response {
    envelope(StatusCode::OK, user.profile, "Current user fetched successfully").into_response()
}

/// `PATCH /update-account`
pub async fn update_account<S: UserStore + 'static>(
    State(state): State<AppState<S>>,
    user: AuthenticatedUser,
    JsonBody(req): JsonBody<UpdateAccountRequest>,
) -> AppResult<Response> {
    let profile = state.sessions.update_account(user.id(), &req).await?;
    Ok(envelope(StatusCode::OK, profile, "Account details updated successfully").into_response())
}

/// `PATCH /avatar`
pub async fn update_avatar<S: UserStore + 'static>(
    State(state): State<AppState<S>>,
    user: AuthenticatedUser,
    JsonBody(req): JsonBody<MediaUpdateRequest>,
) -> AppResult<Response> {
    let profile = state
        .sessions
        .update_media(user.id(), MediaField::Avatar, &req.url)
        .await?;
    Ok(envelope(StatusCode::OK, profile, "Avatar updated successfully").into_response())
}

/// `PATCH /cover-image`
pub async fn update_cover_image<S: UserStore + 'static>(
    State(state): State<AppState<S>>,
    user: AuthenticatedUser,
    JsonBody(req): JsonBody<MediaUpdateRequest>,
) -> AppResult<Response> {
    let profile = state
        .sessions
        .update_media(user.id(), MediaField::CoverImage, &req.url)
        .await?;
    Ok(envelope(StatusCode::OK, profile, "Cover image updated successfully").into_response())
}
