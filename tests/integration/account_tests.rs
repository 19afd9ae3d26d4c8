use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::test_utils::{bearer, login, register, request, send, setup_test_env};

async fn alice_session(app: &axum::Router) -> String {
    register(app, "alice", "pw123").await;
    let session = login(app, "alice", "pw123").await;
    bearer(&session.cookie_value("accessToken").unwrap())
}

#[tokio::test]
async fn test_change_password() {
    let (_state, app, _temp_dir) = setup_test_env();
    let auth = alice_session(&app).await;

    let wrong = send(
        &app,
        request(
            Method::POST,
            "/api/v1/users/change-password",
            Some(json!({ "oldPassword": "nope", "newPassword": "pw456" })),
            &[("authorization", &auth)],
        ),
    )
    .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let ok = send(
        &app,
        request(
            Method::POST,
            "/api/v1/users/change-password",
            Some(json!({ "oldPassword": "pw123", "newPassword": "pw456" })),
            &[("authorization", &auth)],
        ),
    )
    .await;
    assert_eq!(ok.status, StatusCode::OK);

    assert_eq!(login(&app, "alice", "pw123").await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(login(&app, "alice", "pw456").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_update_account_and_media() {
    let (_state, app, _temp_dir) = setup_test_env();
    let auth = alice_session(&app).await;

    let updated = send(
        &app,
        request(
            Method::PATCH,
            "/api/v1/users/update-account",
            Some(json!({ "fullname": "Alice Liddell", "email": "Alice@Wonder.land" })),
            &[("authorization", &auth)],
        ),
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["data"]["fullname"], "Alice Liddell");
    assert_eq!(updated.body["data"]["email"], "alice@wonder.land");

    let empty = send(
        &app,
        request(
            Method::PATCH,
            "/api/v1/users/update-account",
            Some(json!({})),
            &[("authorization", &auth)],
        ),
    )
    .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    let avatar = send(
        &app,
        request(
            Method::PATCH,
            "/api/v1/users/avatar",
            Some(json!({ "url": "https://cdn.example/new.png" })),
            &[("authorization", &auth)],
        ),
    )
    .await;
    assert_eq!(avatar.status, StatusCode::OK);
    assert_eq!(avatar.body["data"]["avatar"], "https://cdn.example/new.png");

    let cover = send(
        &app,
        request(
            Method::PATCH,
            "/api/v1/users/cover-image",
            Some(json!({ "url": "https://cdn.example/cover.png" })),
            &[("authorization", &auth)],
        ),
    )
    .await;
    assert_eq!(cover.status, StatusCode::OK);
    assert_eq!(cover.body["data"]["coverImage"], "https://cdn.example/cover.png");

    // The guard reads the record on each request, so the change is visible
    let me = send(
        &app,
        request(Method::GET, "/api/v1/users/current-user", None, &[("authorization", &auth)]),
    )
    .await;
    assert_eq!(me.body["data"]["fullname"], "Alice Liddell");
    assert_eq!(me.body["data"]["avatar"], "https://cdn.example/new.png");
}

#[tokio::test]
async fn test_malformed_bodies_use_error_envelope() {
    let (_state, app, _temp_dir) = setup_test_env();

    let missing_fields = send(
        &app,
        request(
            Method::POST,
            "/api/v1/users/register",
            Some(json!({ "username": "alice" })),
            &[],
        ),
    )
    .await;
    assert_eq!(missing_fields.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing_fields.body["error"]["code"], "VAL_001");

    let bad_username = send(
        &app,
        request(
            Method::POST,
            "/api/v1/users/register",
            Some(json!({
                "username": "no spaces allowed",
                "email": "x@x.com",
                "fullname": "X",
                "password": "pw",
                "avatar": "https://cdn.example/x.png",
            })),
            &[],
        ),
    )
    .await;
    assert_eq!(bad_username.status, StatusCode::BAD_REQUEST);

    let oversized = send(
        &app,
        request(
            Method::POST,
            "/api/v1/users/login",
            Some(json!({ "username": "alice", "password": "x".repeat(32 * 1024) })),
            &[],
        ),
    )
    .await;
    assert!(oversized.status.is_client_error());
    assert_eq!(oversized.body["success"], false);

    // The refresh route reads the raw body and keeps the same envelope
    let oversized_refresh = send(
        &app,
        request(
            Method::POST,
            "/api/v1/users/refresh-token",
            Some(json!({ "refreshToken": "x".repeat(32 * 1024) })),
            &[],
        ),
    )
    .await;
    assert_eq!(oversized_refresh.status, StatusCode::BAD_REQUEST);
    assert_eq!(oversized_refresh.body["success"], false);
    assert_eq!(oversized_refresh.body["error"]["code"], "VAL_001");
}

#[tokio::test]
async fn test_users_survive_restart() {
    let (_state, app, temp_dir) = setup_test_env();
    register(&app, "alice", "pw123").await;
    drop(app);

    let settings = crate::test_utils::test_settings(&temp_dir);
    let store = backend_lib::storage::FlatFileUserStore::new(temp_dir.path()).unwrap();
    let state = backend_lib::AppState::new(store, settings).unwrap();
    let app = backend_lib::router::create_router(state).unwrap();

    assert_eq!(login(&app, "alice", "pw123").await.status, StatusCode::OK);
}
