use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::test_utils::{bearer, login, register, request, send, setup_test_env};

const ME: &str = "/api/v1/users/current-user";
const REFRESH: &str = "/api/v1/users/refresh-token";
const LOGOUT: &str = "/api/v1/users/logout";

#[tokio::test]
async fn test_register_returns_public_profile() {
    let (_state, app, _temp_dir) = setup_test_env();

    let resp = register(&app, "alice", "pw123").await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.body["statusCode"], 201);
    assert_eq!(resp.body["success"], true);

    let data = &resp.body["data"];
    assert_eq!(data["username"], "alice");
    assert_eq!(data["email"], "alice@x.com");
    assert!(data.get("passwordHash").is_none());
    assert!(data.get("refreshToken").is_none());

    let dup = register(&app, "alice", "other").await;
    assert_eq!(dup.status, StatusCode::CONFLICT);
    assert_eq!(dup.body["success"], false);
}

#[tokio::test]
async fn test_login_sets_secure_cookies() {
    let (_state, app, _temp_dir) = setup_test_env();
    register(&app, "alice", "pw123").await;

    let resp = login(&app, "alice", "pw123").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["data"]["user"]["username"], "alice");

    for name in ["accessToken", "refreshToken"] {
        let cookie = resp.set_cookie(name).unwrap_or_else(|| panic!("missing {name} cookie"));
        assert!(cookie.contains("HttpOnly"), "{cookie}");
        assert!(cookie.contains("Secure"), "{cookie}");
        assert!(cookie.contains("SameSite=Strict"), "{cookie}");
        assert!(cookie.contains("Path=/"), "{cookie}");
    }
    assert!(resp.set_cookie("accessToken").unwrap().contains("Max-Age=900"));
    assert_eq!(
        resp.cookie_value("refreshToken").as_deref(),
        resp.body["data"]["refreshToken"].as_str()
    );
}

#[tokio::test]
async fn test_wrong_password_is_rejected_without_side_effects() {
    let (state, app, _temp_dir) = setup_test_env();
    let alice = register(&app, "alice", "pw123").await;
    let id = alice.body["data"]["id"].as_str().unwrap().parse().unwrap();

    let wrong = login(&app, "alice", "wrongpw").await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.body["error"]["code"], "AUTH_001");
    assert!(wrong.set_cookies().is_empty());

    let unknown = login(&app, "mallory", "pw123").await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.body["error"]["code"], wrong.body["error"]["code"]);

    let record = state.sessions.find_user(id).await.unwrap().unwrap();
    assert!(record.refresh_token.is_none());
}

#[tokio::test]
async fn test_refresh_rotation_and_logout() {
    let (_state, app, _temp_dir) = setup_test_env();
    register(&app, "alice", "pw123").await;
    let session = login(&app, "alice", "pw123").await;
    let access = session.cookie_value("accessToken").unwrap();
    let v1 = session.cookie_value("refreshToken").unwrap();

    // Access token works from the cookie and from the bearer header
    let cookie = format!("accessToken={access}");
    let me = send(&app, request(Method::GET, ME, None, &[("cookie", &cookie)])).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["data"]["username"], "alice");
    let auth = bearer(&access);
    let me = send(&app, request(Method::GET, ME, None, &[("authorization", &auth)])).await;
    assert_eq!(me.status, StatusCode::OK);

    // Rotate using the cookie
    let refresh_cookie = format!("refreshToken={v1}");
    let rotated = send(
        &app,
        request(Method::POST, REFRESH, None, &[("cookie", &refresh_cookie)]),
    )
    .await;
    assert_eq!(rotated.status, StatusCode::OK);
    let v2 = rotated.cookie_value("refreshToken").unwrap();
    assert_ne!(v1, v2);
    assert_eq!(rotated.body["data"]["refreshToken"], v2.as_str());

    // The superseded token is dead
    let replay = send(
        &app,
        request(Method::POST, REFRESH, Some(json!({ "refreshToken": v1 })), &[]),
    )
    .await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);
    assert_eq!(replay.body["error"]["code"], "AUTH_004");

    // Rotate again using the body
    let rotated = send(
        &app,
        request(Method::POST, REFRESH, Some(json!({ "refreshToken": v2 })), &[]),
    )
    .await;
    assert_eq!(rotated.status, StatusCode::OK);
    let v3 = rotated.body["data"]["refreshToken"].as_str().unwrap().to_string();

    let logout = send(&app, request(Method::POST, LOGOUT, None, &[("authorization", &auth)])).await;
    assert_eq!(logout.status, StatusCode::OK);
    for name in ["accessToken", "refreshToken"] {
        assert!(logout.set_cookie(name).unwrap().contains("Max-Age=0"));
    }

    let after_logout = send(
        &app,
        request(Method::POST, REFRESH, Some(json!({ "refreshToken": v3 })), &[]),
    )
    .await;
    assert_eq!(after_logout.status, StatusCode::UNAUTHORIZED);

    // Access tokens are not revoked by logout; they run until expiry
    let me = send(&app, request(Method::GET, ME, None, &[("authorization", &auth)])).await;
    assert_eq!(me.status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_without_token() {
    let (_state, app, _temp_dir) = setup_test_env();

    let resp = send(&app, request(Method::POST, REFRESH, None, &[])).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body["error"]["code"], "AUTH_002");

    let resp = send(&app, request(Method::POST, REFRESH, Some(json!({})), &[])).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let resp = send(
        &app,
        request(Method::POST, REFRESH, Some(json!({ "refreshToken": "forged" })), &[]),
    )
    .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body["error"]["code"], "AUTH_003");
}

#[tokio::test]
async fn test_guard_rejects_bad_tokens() {
    let (_state, app, _temp_dir) = setup_test_env();
    register(&app, "alice", "pw123").await;
    let session = login(&app, "alice", "pw123").await;

    let missing = send(&app, request(Method::GET, ME, None, &[])).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.body["success"], false);

    let garbage = bearer("not-a-token");
    let resp = send(&app, request(Method::GET, ME, None, &[("authorization", &garbage)])).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    // A refresh token is not accepted where an access token is required
    let refresh = bearer(&session.cookie_value("refreshToken").unwrap());
    let resp = send(&app, request(Method::GET, ME, None, &[("authorization", &refresh)])).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let resp = send(&app, request(Method::POST, LOGOUT, None, &[])).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert!(resp.set_cookies().is_empty());
}

#[tokio::test]
async fn test_healthz() {
    let (_state, app, _temp_dir) = setup_test_env();
    let resp = send(&app, request(Method::GET, "/healthz", None, &[])).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["data"], "ok");
}
