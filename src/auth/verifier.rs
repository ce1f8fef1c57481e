use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::str::FromStr;

use crate::auth::{AuthError, Claims, VerifiedIdentity};
use crate::config::{AppConfig, EXPECTED_AUDIENCE};
use crate::identity::IdentityClient;

/// Token verification strategy, selected once at process start.
///
/// Local verification checks the signature against a shared secret and
/// validates claims without any network I/O. It is preferred whenever the
/// secret is configured: it skips a round trip per request and sidesteps
/// intermediate proxies rejecting forwarded tokens with large metadata for
/// excessive header size. Remote verification delegates to the identity
/// service's get-user-for-token endpoint.
pub enum TokenVerifier {
    Local {
        key: DecodingKey,
        algorithm: Algorithm,
        issuer_base: String,
    },
    Remote {
        identity: IdentityClient,
    },
}

impl TokenVerifier {
    pub fn from_config(config: &AppConfig, identity: IdentityClient) -> Self {
        match &config.jwt_secret {
            Some(secret) => {
                let algorithm = Algorithm::from_str(&config.jwt_algorithm).unwrap_or_else(|_| {
                    tracing::warn!(
                        algorithm = %config.jwt_algorithm,
                        "unknown JWT algorithm, defaulting to HS256"
                    );
                    Algorithm::HS256
                });
                tracing::info!("using local token verification");
                TokenVerifier::Local {
                    key: DecodingKey::from_secret(secret.as_bytes()),
                    algorithm,
                    issuer_base: config.identity_base_url().to_string(),
                }
            }
            None => {
                tracing::warn!(
                    "SUPABASE_JWT_SECRET not configured, falling back to remote verification"
                );
                TokenVerifier::Remote { identity }
            }
        }
    }

    /// Verify a bearer credential and produce the caller's identity.
    pub async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AuthError> {
        match self {
            TokenVerifier::Local {
                key,
                algorithm,
                issuer_base,
            } => verify_local(token, key, *algorithm, issuer_base),
            TokenVerifier::Remote { identity } => verify_remote(token, identity).await,
        }
    }
}

fn verify_local(
    token: &str,
    key: &DecodingKey,
    algorithm: Algorithm,
    issuer_base: &str,
) -> Result<VerifiedIdentity, AuthError> {
    let mut validation = Validation::new(algorithm);
    validation.set_audience(&[EXPECTED_AUDIENCE]);

    let data = decode::<Claims>(token, key, &validation).map_err(|err| {
        use jsonwebtoken::errors::ErrorKind;
        let mapped = match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::InvalidAudience => AuthError::InvalidAudience,
            _ => AuthError::InvalidCredential,
        };
        tracing::warn!(error = %err, "local token verification failed");
        mapped
    })?;

    let claims = data.claims;

    let subject = claims
        .sub
        .filter(|sub| !sub.is_empty())
        .ok_or_else(|| {
            tracing::warn!("token missing 'sub' claim");
            AuthError::MissingSubject
        })?;

    // Issuer check is optional: tokens without an iss claim pass, but a
    // present issuer must be rooted at the identity service base URL.
    if let Some(issuer) = &claims.iss {
        if !issuer.starts_with(issuer_base) {
            tracing::warn!(expected = %issuer_base, got = %issuer, "token issuer mismatch");
            return Err(AuthError::IssuerMismatch);
        }
    }

    tracing::debug!(user_id = %subject, "verified token locally");

    Ok(VerifiedIdentity {
        subject,
        email: claims.email,
        claims: claims.user_metadata,
    })
}

async fn verify_remote(
    token: &str,
    identity: &IdentityClient,
) -> Result<VerifiedIdentity, AuthError> {
    let user = identity.get_user(token).await.map_err(|err| {
        tracing::warn!(error = %err, "remote token verification failed");
        AuthError::InvalidCredential
    })?;

    tracing::debug!(user_id = %user.id, "verified token remotely");

    Ok(VerifiedIdentity {
        subject: user.id,
        email: user.email,
        claims: user.user_metadata,
    })
}
