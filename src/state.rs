use std::sync::Arc;

use crate::config::ServerConfig;
use crate::core::realtime::{ConfigCredentialProvider, CredentialProvider, RelayConfig};

/// Shared application state for the HTTP handlers.
pub struct AppState {
    pub config: ServerConfig,
    /// Source of per-session credentials
    pub credentials: Arc<dyn CredentialProvider>,
    /// Relay settings derived from `config`
    pub relay_config: RelayConfig,
}

impl AppState {
    /// Build state backed by the configured API key.
    pub async fn new(config: ServerConfig) -> Arc<Self> {
        let credentials = Arc::new(ConfigCredentialProvider::new(config.openai_api_key.clone()));
        Self::with_credentials(config, credentials)
    }

    /// Build state with a custom credential provider.
    pub fn with_credentials(
        config: ServerConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Arc<Self> {
        let relay_config = RelayConfig::from_server_config(&config);
        Arc::new(Self {
            config,
            credentials,
            relay_config,
        })
    }
}
