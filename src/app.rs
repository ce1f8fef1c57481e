use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::error::handle_panic;
use crate::handlers::{auth, system};
use crate::middleware::{cors_layer, optional_auth, require_auth};
use crate::state::AppState;

/// Assemble the router.
///
/// Layer order matters: the CORS boundary is added last so it runs first,
/// answering preflight OPTIONS requests before the authorization guard and
/// annotating every response on the way out, error responses included.
pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/api/auth/me",
            get(auth::profile_get)
                .patch(auth::profile_update)
                .put(auth::profile_update),
        )
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let optional = Router::new()
        .route("/api/auth/session", get(auth::session))
        .route_layer(from_fn_with_state(state.clone(), optional_auth));

    Router::new()
        // Public
        .route("/", get(system::root))
        .route("/health", get(system::health))
        // Public auth routes (token acquisition)
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        // Guarded route groups
        .merge(protected)
        .merge(optional)
        .fallback(system::not_found)
        // Global middleware; panics become a plain 500 envelope, and the CORS
        // boundary stays outermost so it annotates those too
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors_layer(&state.config))
        .with_state(state)
}
