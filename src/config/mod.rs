use serde::{Deserialize, Serialize};
use std::env;

/// Audience claim required on locally verified access tokens.
pub const EXPECTED_AUDIENCE: &str = "authenticated";

/// Fallback origin allow-list used when CORS_ORIGINS is missing or empty.
pub const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://localhost:3000",
    "https://calculatesmartil.netlify.app",
    "https://project-b88e.onrender.com",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the identity service; also used for issuer-prefix checks.
    pub identity_base_url: String,
    /// Publishable key sent as `apikey` on identity service calls.
    pub identity_anon_key: String,
    /// Service-role key used for table store operations.
    pub identity_service_key: String,
    /// Shared secret for local token verification. `Some` selects local
    /// verification at startup; `None` falls back to remote verification.
    pub jwt_secret: Option<String>,
    /// Signing algorithm expected on locally verified tokens.
    pub jwt_algorithm: String,
    /// Raw comma-delimited origin allow-list, parsed by `cors_origins()`.
    pub cors_origins: String,
    /// Timeout applied to every outbound call, in seconds.
    pub request_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            identity_base_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:54321".to_string()),
            identity_anon_key: env::var("SUPABASE_KEY").unwrap_or_default(),
            identity_service_key: env::var("SUPABASE_SERVICE_KEY").unwrap_or_default(),
            jwt_secret: env::var("SUPABASE_JWT_SECRET").ok().filter(|s| !s.is_empty()),
            jwt_algorithm: env::var("JWT_ALGORITHM").unwrap_or_else(|_| "HS256".to_string()),
            cors_origins: env::var("CORS_ORIGINS").unwrap_or_default(),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        }
    }

    /// Parse the delimited allow-list: comma-split, trimmed, empties dropped,
    /// order preserved. An empty result substitutes the hard-coded defaults.
    pub fn cors_origins(&self) -> Vec<String> {
        let origins: Vec<String> = self
            .cors_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        if origins.is_empty() {
            tracing::warn!("CORS_ORIGINS is empty, using default origins");
            DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect()
        } else {
            origins
        }
    }

    /// Identity base URL with any trailing slash removed, so issuer-prefix
    /// comparisons and endpoint formatting behave consistently.
    pub fn identity_base_url(&self) -> &str {
        let base = self.identity_base_url.trim_end_matches('/');
        if url::Url::parse(base).is_err() {
            tracing::warn!(base_url = %base, "identity base URL does not parse as a URL");
        }
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_origins(raw: &str) -> AppConfig {
        AppConfig {
            identity_base_url: "https://project.supabase.co".to_string(),
            identity_anon_key: String::new(),
            identity_service_key: String::new(),
            jwt_secret: None,
            jwt_algorithm: "HS256".to_string(),
            cors_origins: raw.to_string(),
            request_timeout_secs: 10,
        }
    }

    #[test]
    fn cors_origins_preserve_order_and_trim_whitespace() {
        let config = config_with_origins("http://a.com, http://b.com");
        assert_eq!(config.cors_origins(), vec!["http://a.com", "http://b.com"]);
    }

    #[test]
    fn cors_origins_drop_empty_entries() {
        let config = config_with_origins("http://a.com,,  ,http://b.com,");
        assert_eq!(config.cors_origins(), vec!["http://a.com", "http://b.com"]);
    }

    #[test]
    fn empty_cors_origins_fall_back_to_defaults() {
        let config = config_with_origins("");
        let origins = config.cors_origins();
        assert_eq!(origins.len(), 4);
        assert_eq!(origins[0], "http://localhost:5173");
    }

    #[test]
    fn identity_base_url_strips_trailing_slash() {
        let mut config = config_with_origins("");
        config.identity_base_url = "https://project.supabase.co/".to_string();
        assert_eq!(config.identity_base_url(), "https://project.supabase.co");
    }
}
