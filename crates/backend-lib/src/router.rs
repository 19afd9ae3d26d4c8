// ============================
// crates/backend-lib/src/router.rs
// ============================
//! HTTP router for the account API.
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::ServerSettings;
use crate::error::{AppError, AppResult};
use crate::handlers::{healthz, users};
use crate::middleware::require_auth;
use crate::storage::UserStore;
use crate::AppState;

pub const USERS_PREFIX: &str = "/api/v1/users";

/// Build the application router
pub fn create_router<S: UserStore + 'static>(state: AppState<S>) -> AppResult<Router> {
    let public = Router::new()
        .route("/register", post(users::register::<S>))
        .route("/login", post(users::login::<S>))
        .route("/refresh-token", post(users::refresh_token::<S>));

    let protected = Router::new()
        .route("/logout", post(users::logout::<S>))
        .route("/change-password", post(users::change_password::<S>))
        .route("/current-user", get(users::current_user))
        .route("/update-account", patch(users::update_account::<S>))
        .route("/avatar", patch(users::update_avatar::<S>))
        .route("/cover-image", patch(users::update_cover_image::<S>))
        .route_layer(from_fn_with_state(state.clone(), require_auth::<S>));

    let mut app = Router::new()
        .route("/healthz", get(healthz))
        .nest(USERS_PREFIX, public.merge(protected))
        .layer(DefaultBodyLimit::max(state.settings.server.body_limit_bytes))
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = cors_layer(&state.settings.server)? {
        app = app.layer(cors);
    }

    Ok(app.with_state(state))
}

/// Credentialed CORS for the configured front-end origin, if any
fn cors_layer(server: &ServerSettings) -> AppResult<Option<CorsLayer>> {
    let Some(origin) = server.cors_origin.as_deref() else {
        return Ok(None);
    };
    let origin = HeaderValue::from_str(origin)
        .map_err(|e| AppError::Internal(format!("invalid CORS origin: {e}")))?;
    Ok(Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::PATCH])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
    ))
}
