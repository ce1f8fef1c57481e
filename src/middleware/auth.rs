use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{AuthError, VerifiedIdentity};
use crate::error::ApiError;
use crate::state::AppState;

/// Identity attached by `optional_auth`; `None` means the caller presented no
/// usable credential and the route chose to proceed anyway.
#[derive(Clone)]
pub struct MaybeIdentity(pub Option<VerifiedIdentity>);

/// Guard for protected routes: verifies the bearer credential and injects the
/// caller's identity, or short-circuits with 401 before the handler runs.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = request.uri().path().to_string();

    let token = bearer_token(request.headers()).ok_or_else(|| {
        tracing::warn!(%path, "no authentication credentials provided");
        AuthError::MissingCredential
    })?;

    let identity = state.verifier.verify(&token).await.map_err(|err| {
        tracing::warn!(%path, error = %err, "token verification failed");
        err
    })?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Guard for optional-auth routes: a missing or invalid credential is not an
/// error, the handler just sees no identity.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = match bearer_token(request.headers()) {
        None => None,
        Some(token) => match state.verifier.verify(&token).await {
            Ok(identity) => Some(identity),
            Err(err) => {
                tracing::debug!(error = %err, "ignoring invalid credential on optional route");
                None
            }
        },
    };

    request.extensions_mut().insert(MaybeIdentity(identity));
    next.run(request).await
}

/// Extract the bearer token from the Authorization header. The scheme is
/// matched case-insensitively; anything that is not a non-empty
/// `Bearer <token>` value counts as no credential.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("authorization")?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Current caller's subject id; fails closed if the route skipped `require_auth`.
pub struct CurrentUser(pub String);

/// Current caller's full verified identity; fails closed like `CurrentUser`.
pub struct CurrentIdentity(pub VerifiedIdentity);

/// Subject id if an identity was attached by `optional_auth`, otherwise `None`.
pub struct MaybeUser(pub Option<String>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts
            .extensions
            .get::<VerifiedIdentity>()
            .ok_or_else(|| ApiError::unauthorized("Invalid authentication credentials"))?;
        Ok(CurrentUser(identity.subject.clone()))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts
            .extensions
            .get::<VerifiedIdentity>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Invalid authentication credentials"))?;
        Ok(CurrentIdentity(identity))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let subject = parts
            .extensions
            .get::<MaybeIdentity>()
            .and_then(|maybe| maybe.0.as_ref())
            .map(|identity| identity.subject.clone());
        Ok(MaybeUser(subject))
    }
}
