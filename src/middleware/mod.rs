pub mod auth;
pub mod cors;

pub use auth::{optional_auth, require_auth, CurrentIdentity, CurrentUser, MaybeIdentity, MaybeUser};
pub use cors::cors_layer;
