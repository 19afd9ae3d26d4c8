// crates/backend-lib/src/middleware/auth.rs

//! Route layer that runs the auth guard.
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::{authenticate, extract_access_token};
use crate::error::AppError;
use crate::storage::UserStore;
use crate::AppState;

/// Reject the request unless it carries a valid access token for an existing
/// user; on success the [`crate::auth::AuthenticatedUser`] is added to the
/// request extensions.
pub async fn require_auth<S: UserStore + 'static>(
    State(state): State<AppState<S>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_access_token(request.headers());
    let user = authenticate(&state.sessions, token.as_deref()).await?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
