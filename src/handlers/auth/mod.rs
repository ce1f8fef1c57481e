use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::database::Row;
use crate::error::ApiError;
use crate::identity::IdentityError;
use crate::middleware::{CurrentIdentity, CurrentUser, MaybeUser};
use crate::state::AppState;

const PROFILES_TABLE: &str = "user_profiles";

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

/// Register a new user with the identity service and create their profile row.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let existing = state
        .store
        .select(PROFILES_TABLE, &[("email", body.email.as_str())])
        .await?;
    if !existing.is_empty() {
        tracing::warn!(email = %body.email, "registration attempt for existing email");
        return Err(ApiError::bad_request("Email already registered"));
    }

    tracing::info!(email = %body.email, "creating new user in identity service");
    let user = state.identity.sign_up(&body.email, &body.password).await?;

    let full_name = body
        .full_name
        .unwrap_or_else(|| email_prefix(&body.email).to_string());
    let profile = new_profile(&user.id, &body.email, &full_name, body.phone.as_deref());

    let created = state.store.insert(PROFILES_TABLE, &profile).await?;
    tracing::info!(user_id = %user.id, "user profile created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "user": created, "token_type": "bearer" })),
    ))
}

/// Authenticate with the identity service and return its session tokens.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    tracing::info!(email = %body.email, "attempting login");

    let session = state
        .identity
        .sign_in_with_password(&body.email, &body.password)
        .await
        .map_err(|err| match err {
            IdentityError::Rejected { .. } => {
                tracing::warn!(email = %body.email, "login failed");
                ApiError::unauthorized("Invalid email or password")
            }
            other => ApiError::from(other),
        })?;

    // Stamp the last login on the profile; the session is already issued, so
    // a missing profile is surfaced but a failed stamp would be too late to
    // matter and is treated the same way.
    if let Some(user) = &session.user {
        let profiles = state
            .store
            .select(PROFILES_TABLE, &[("auth_user_id", user.id.as_str())])
            .await?;
        if profiles.is_empty() {
            tracing::error!(user_id = %user.id, "profile missing for authenticated user");
            return Err(ApiError::not_found(
                "User profile not found. Please contact support.",
            ));
        }

        let mut stamp = Map::new();
        stamp.insert(
            "last_login_date".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
        state
            .store
            .update(PROFILES_TABLE, &[("auth_user_id", user.id.as_str())], &stamp)
            .await?;
    }

    Ok(Json(TokenResponse {
        access_token: session.access_token,
        refresh_token: session.refresh_token,
        token_type: "bearer",
    }))
}

/// Fetch the caller's profile, creating it on first authenticated request.
///
/// The get-or-create is deliberate and idempotent: the profile is derived from
/// the verified identity, so two racing first requests converge on the same
/// row content.
pub async fn profile_get(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<Row>, ApiError> {
    let mut rows = state
        .store
        .select(PROFILES_TABLE, &[("auth_user_id", identity.subject.as_str())])
        .await?;

    if let Some(profile) = rows.pop() {
        return Ok(Json(profile));
    }

    let email = identity.email.as_deref().ok_or_else(|| {
        tracing::error!(user_id = %identity.subject, "cannot auto-create profile without email");
        ApiError::not_found("User not found and cannot be auto-created (missing email)")
    })?;

    tracing::info!(user_id = %identity.subject, "auto-creating profile");
    let profile = new_profile(&identity.subject, email, email_prefix(email), None);
    let created = state.store.insert(PROFILES_TABLE, &profile).await?;

    Ok(Json(created))
}

/// Forward an open-record patch to the caller's profile row.
pub async fn profile_update(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(mut patch): Json<Row>,
) -> Result<Json<Row>, ApiError> {
    // Identity-bearing columns are owned by the auth boundary.
    patch.remove("id");
    patch.remove("auth_user_id");

    if patch.is_empty() {
        return Err(ApiError::unprocessable_entity("No fields to update"));
    }

    let mut rows = state
        .store
        .update(PROFILES_TABLE, &[("auth_user_id", user_id.as_str())], &patch)
        .await?;

    rows.pop()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User profile not found"))
}

/// Session probe; works with or without a credential.
pub async fn session(MaybeUser(user_id): MaybeUser) -> Json<Value> {
    Json(json!({
        "authenticated": user_id.is_some(),
        "user_id": user_id,
    }))
}

fn email_prefix(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

fn new_profile(auth_user_id: &str, email: &str, full_name: &str, phone: Option<&str>) -> Row {
    let profile = json!({
        "auth_user_id": auth_user_id,
        "email": email,
        "full_name": full_name,
        "phone": phone.unwrap_or(""),
        "role": "user",
        "contract_template": "",
        "contractor_commitments": "",
        "client_commitments": "",
    });
    profile.as_object().cloned().unwrap_or_default()
}
