use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use thiserror::Error;

use crate::config::AppConfig;

/// Client for the hosted identity service (sign up, password sign-in, and
/// get-user-for-token). All calls share one bounded-timeout HTTP client; a
/// stalled call fails with a transport error once the timeout elapses.
#[derive(Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity service request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("identity service rejected the request ({status})")]
    Rejected { status: StatusCode, body: String },
    #[error("identity service returned no user")]
    NoUser,
}

/// User record as returned by the identity service.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityUser {
    pub id: String,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Map<String, Value>,
}

/// Token pair issued by a successful password sign-in.
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub user: Option<IdentityUser>,
}

impl IdentityClient {
    pub fn new(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.identity_base_url().to_string(),
            anon_key: config.identity_anon_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Resolve the user a bearer token belongs to.
    ///
    /// Used by the remote verification path; any failure here collapses to
    /// "invalid credential" at the authorization boundary.
    pub async fn get_user(&self, token: &str) -> Result<IdentityUser, IdentityError> {
        let response = self
            .http
            .get(self.endpoint("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await?;

        let user: IdentityUser = Self::parse_user(response).await?;
        if user.id.is_empty() {
            return Err(IdentityError::NoUser);
        }
        Ok(user)
    }

    /// Create a new user; returns the created user record.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<IdentityUser, IdentityError> {
        let response = self
            .http
            .post(self.endpoint("signup"))
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let body: Value = Self::check(response).await?.json().await?;

        // The service returns either the user object directly or an envelope
        // with a "user" field, depending on whether a session was created.
        let user_value = if body.get("id").is_some() {
            body
        } else {
            body.get("user").cloned().ok_or(IdentityError::NoUser)?
        };

        serde_json::from_value(user_value).map_err(|_| IdentityError::NoUser)
    }

    /// Exchange an email/password pair for a session token pair.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError> {
        let response = self
            .http
            .post(format!("{}?grant_type=password", self.endpoint("token")))
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, IdentityError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(IdentityError::Rejected { status, body })
        }
    }

    async fn parse_user(response: reqwest::Response) -> Result<IdentityUser, IdentityError> {
        let response = Self::check(response).await?;
        response.json().await.map_err(|_| IdentityError::NoUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> IdentityClient {
        let config = AppConfig {
            identity_base_url: "https://project.supabase.co/".to_string(),
            identity_anon_key: "anon".to_string(),
            identity_service_key: "service".to_string(),
            jwt_secret: None,
            jwt_algorithm: "HS256".to_string(),
            cors_origins: String::new(),
            request_timeout_secs: 10,
        };
        IdentityClient::new(&config).unwrap()
    }

    #[test]
    fn endpoints_are_rooted_under_auth_v1() {
        let client = client();
        assert_eq!(
            client.endpoint("user"),
            "https://project.supabase.co/auth/v1/user"
        );
    }
}
