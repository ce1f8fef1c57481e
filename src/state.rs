use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::config::AppConfig;
use crate::database::TableStore;
use crate::identity::IdentityClient;

/// Shared application state, constructed once in `main` and cloned per
/// request. Everything here is read-only after startup; no request mutates it.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub verifier: Arc<TokenVerifier>,
    pub store: TableStore,
    pub identity: IdentityClient,
}

impl AppState {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let identity = IdentityClient::new(&config)?;
        let store = TableStore::new(&config)?;
        let verifier = Arc::new(TokenVerifier::from_config(&config, identity.clone()));

        Ok(Self {
            config: Arc::new(config),
            verifier,
            store,
            identity,
        })
    }
}
