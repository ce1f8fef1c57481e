use axum::http::{HeaderValue, Method};
use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

use crate::config::AppConfig;

/// Build the CORS boundary from the configured origin allow-list.
///
/// Must be the outermost router layer: it answers preflight OPTIONS requests
/// before the authorization guard runs, and it annotates every response on the
/// way out, including 401/404/422/500 error bodies, so browsers can read them.
///
/// Origins are matched exactly and echoed back verbatim, never `*`, because
/// credentials are allowed. A request whose origin is not in the list is not
/// an error; its response simply carries no CORS headers and the browser
/// enforces the block client-side.
pub fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    tracing::info!(count = origins.len(), "configuring CORS origin allow-list");

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        // Wildcard headers are illegal alongside credentials, so mirror the
        // requested headers instead; the effect is the same for browsers.
        .allow_headers(AllowHeaders::mirror_request())
        .max_age(Duration::from_secs(600))
}
