use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub mod verifier;

pub use verifier::TokenVerifier;

/// Claims carried in an access token issued by the identity service.
///
/// Optional fields are validated explicitly in the verifier so that each
/// missing claim maps to its own failure class instead of a decode error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Option<String>,
    pub email: Option<String>,
    pub iss: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub user_metadata: Map<String, Value>,
}

/// Authenticated caller context, built fresh from a validated token.
///
/// Lives for exactly one request; never cached across requests.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    pub subject: String,
    pub email: Option<String>,
    pub claims: Map<String, Value>,
}

/// Verification failure taxonomy. Every variant surfaces as HTTP 401; the
/// variant picks the user-facing hint, the log line keeps the specifics.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no bearer credential supplied")]
    MissingCredential,
    #[error("token signature did not verify")]
    InvalidSignature,
    #[error("token expiration claim is in the past")]
    Expired,
    #[error("token audience claim does not match expected audience")]
    InvalidAudience,
    #[error("token issuer does not match identity service base URL")]
    IssuerMismatch,
    #[error("token has no subject claim")]
    MissingSubject,
    #[error("credential could not be verified")]
    InvalidCredential,
}

impl AuthError {
    /// Fixed user-facing message for this failure class.
    pub fn detail(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "Missing authentication credentials",
            AuthError::Expired => "Token has expired. Please log in again.",
            AuthError::InvalidSignature => "Invalid token signature. Please log in again.",
            AuthError::InvalidAudience => "Invalid token audience. Please log in again.",
            AuthError::IssuerMismatch => "Invalid token: issuer mismatch",
            AuthError::MissingSubject => "Invalid token: missing user ID",
            AuthError::InvalidCredential => "Invalid authentication token. Please log in again.",
        }
    }
}
