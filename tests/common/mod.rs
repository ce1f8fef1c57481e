use axum::response::Response;
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};

use contractor_api::config::AppConfig;
use contractor_api::{app, AppState};

pub const JWT_SECRET: &str = "integration-test-secret";
pub const ORIGIN_A: &str = "http://a.com";
pub const ORIGIN_B: &str = "http://b.com";

/// Config pointing outbound clients at an unroutable address; tests only
/// exercise paths that never leave the process.
pub fn test_config() -> AppConfig {
    AppConfig {
        identity_base_url: "http://127.0.0.1:9".to_string(),
        identity_anon_key: "anon-key".to_string(),
        identity_service_key: "service-key".to_string(),
        jwt_secret: Some(JWT_SECRET.to_string()),
        jwt_algorithm: "HS256".to_string(),
        cors_origins: format!("{}, {}", ORIGIN_A, ORIGIN_B),
        request_timeout_secs: 2,
    }
}

pub fn test_state() -> AppState {
    AppState::new(test_config()).expect("failed to build test state")
}

pub fn test_app() -> Router {
    app(test_state())
}

pub fn mint_token(secret: &str, claims: &Value) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to mint token")
}

pub fn valid_claims(sub: &str) -> Value {
    json!({
        "sub": sub,
        "email": format!("{sub}@example.com"),
        "aud": "authenticated",
        "exp": (Utc::now() + Duration::hours(1)).timestamp(),
    })
}

pub fn expired_claims(sub: &str) -> Value {
    json!({
        "sub": sub,
        "aud": "authenticated",
        "exp": (Utc::now() - Duration::hours(1)).timestamp(),
    })
}

pub async fn body_json(response: Response) -> anyhow::Result<Value> {
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok(serde_json::from_slice(&bytes)?)
}
