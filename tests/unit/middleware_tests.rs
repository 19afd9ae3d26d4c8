use axum::{
    http::{Method, StatusCode},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use backend_lib::auth::AuthenticatedUser;
use backend_lib::middleware::require_auth;
use backend_lib::storage::FlatFileUserStore;
use streamhub_common::RegisterRequest;

use crate::test_utils::{bearer, request, send, setup_test_env};

async fn whoami(user: AuthenticatedUser) -> String {
    user.profile.username
}

#[tokio::test]
async fn test_require_auth_layer() {
    let (state, _app, _temp_dir) = setup_test_env();
    let profile = state
        .sessions
        .register(&RegisterRequest {
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            fullname: "Alice".to_string(),
            password: "pw123".to_string(),
            avatar: "https://cdn.example/alice.png".to_string(),
            cover_image: None,
        })
        .await
        .unwrap();
    let record = state.sessions.find_user(profile.id).await.unwrap().unwrap();
    let token = state.sessions.tokens().issue_access(&record).unwrap();

    let app = Router::new()
        .route("/whoami", get(whoami))
        .route_layer(from_fn_with_state(state.clone(), require_auth::<FlatFileUserStore>))
        .with_state(state);

    let auth = bearer(&token);
    let ok = send(&app, request(Method::GET, "/whoami", None, &[("authorization", &auth)])).await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.body, serde_json::Value::String("alice".to_string()));

    let rejected = send(&app, request(Method::GET, "/whoami", None, &[])).await;
    assert_eq!(rejected.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_extractor_without_layer_rejects() {
    let app: Router = Router::new().route("/whoami", get(whoami));
    let resp = send(&app, request(Method::GET, "/whoami", None, &[])).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}
