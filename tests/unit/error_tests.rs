use axum::{http::StatusCode, response::IntoResponse};
use backend_lib::auth::TokenError;
use backend_lib::error::AppError;
use streamhub_common::ApiErrorBody;

async fn body_of(err: AppError) -> (StatusCode, ApiErrorBody) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_error_envelopes() {
    let cases = [
        (AppError::InvalidCredentials, StatusCode::UNAUTHORIZED, "AUTH_001"),
        (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED, "AUTH_002"),
        (AppError::InvalidToken(TokenError::Expired), StatusCode::UNAUTHORIZED, "AUTH_003"),
        (AppError::TokenReused, StatusCode::UNAUTHORIZED, "AUTH_004"),
        (AppError::NotFound("user".into()), StatusCode::NOT_FOUND, "NF_001"),
        (AppError::Conflict("taken".into()), StatusCode::CONFLICT, "CONFLICT_001"),
        (AppError::InvalidInput("bad".into()), StatusCode::BAD_REQUEST, "VAL_001"),
        (AppError::External("down".into()), StatusCode::SERVICE_UNAVAILABLE, "EXT_001"),
        (AppError::Internal("oops".into()), StatusCode::INTERNAL_SERVER_ERROR, "INT_001"),
    ];

    for (err, status, code) in cases {
        let (actual_status, body) = body_of(err).await;
        assert_eq!(actual_status, status);
        assert_eq!(body.status_code, status.as_u16());
        assert!(!body.success);
        assert_eq!(body.error.code, code);
        assert!(!body.error.message.is_empty());
    }
}

#[test]
fn test_sanitized_messages_hide_details() {
    let err = AppError::Internal("db password is hunter2".into());
    assert!(!err.sanitized_message().contains("hunter2"));

    let expired = AppError::InvalidToken(TokenError::Expired);
    let malformed = AppError::InvalidToken(TokenError::Malformed("bad base64".into()));
    assert_eq!(expired.sanitized_message(), malformed.sanitized_message());
}
