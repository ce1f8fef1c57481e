mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};
use tower::util::ServiceExt;
use uuid::Uuid;

use contractor_api::middleware::{require_auth, CurrentUser};
use contractor_api::AppState;

/// Minimal guarded route so the full identity round trip can be asserted
/// without touching the external store.
async fn whoami(CurrentUser(user_id): CurrentUser) -> Json<Value> {
    Json(json!({ "user_id": user_id }))
}

fn guarded_app(state: AppState) -> Router {
    Router::new()
        .route("/whoami", get(whoami))
        .route_layer(from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
}

#[tokio::test]
async fn missing_credential_is_rejected_with_bearer_hint() -> Result<()> {
    let app = common::test_app();

    let response = app
        .oneshot(Request::get("/api/auth/me").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );
    let body = common::body_json(response).await?;
    assert_eq!(body["detail"], "Missing authentication credentials");
    Ok(())
}

#[tokio::test]
async fn valid_token_reaches_handler_with_subject() -> Result<()> {
    let subject = Uuid::new_v4().to_string();
    let token = common::mint_token(common::JWT_SECRET, &common::valid_claims(&subject));
    let app = guarded_app(common::test_state());

    let response = app
        .oneshot(
            Request::get("/whoami")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await?;
    assert_eq!(body["user_id"], subject.as_str());
    Ok(())
}

#[tokio::test]
async fn expired_token_gets_expiration_message() -> Result<()> {
    let token = common::mint_token(common::JWT_SECRET, &common::expired_claims("user-1"));
    let app = guarded_app(common::test_state());

    let response = app
        .oneshot(
            Request::get("/whoami")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = common::body_json(response).await?;
    assert_eq!(body["detail"], "Token has expired. Please log in again.");
    Ok(())
}

#[tokio::test]
async fn token_signed_with_other_secret_gets_signature_message() -> Result<()> {
    let token = common::mint_token("some-other-secret", &common::valid_claims("user-1"));
    let app = guarded_app(common::test_state());

    let response = app
        .oneshot(
            Request::get("/whoami")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = common::body_json(response).await?;
    assert_eq!(body["detail"], "Invalid token signature. Please log in again.");
    Ok(())
}

#[tokio::test]
async fn optional_route_without_credential_executes() -> Result<()> {
    let app = common::test_app();

    let response = app
        .oneshot(Request::get("/api/auth/session").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await?;
    assert_eq!(body["authenticated"], false);
    assert_eq!(body["user_id"], Value::Null);
    Ok(())
}

#[tokio::test]
async fn optional_route_swallows_invalid_credential() -> Result<()> {
    let token = common::mint_token("some-other-secret", &common::valid_claims("user-1"));
    let app = common::test_app();

    let response = app
        .oneshot(
            Request::get("/api/auth/session")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await?;
    assert_eq!(body["authenticated"], false);
    Ok(())
}

#[tokio::test]
async fn optional_route_sees_valid_credential() -> Result<()> {
    let subject = Uuid::new_v4().to_string();
    let token = common::mint_token(common::JWT_SECRET, &common::valid_claims(&subject));
    let app = common::test_app();

    let response = app
        .oneshot(
            Request::get("/api/auth/session")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await?;
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["user_id"], subject.as_str());
    Ok(())
}
