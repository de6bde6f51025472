use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::database::DocumentStore;
use crate::services::client_config::ClientConfigResolver;
use crate::services::identity::IdentityVerifier;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub client_config: Arc<ClientConfigResolver>,
    pub config: Arc<AppConfig>,
    /// How often change streams re-read their collection.
    pub poll_interval: Duration,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        verifier: Arc<dyn IdentityVerifier>,
        client_config: ClientConfigResolver,
        config: AppConfig,
    ) -> Self {
        AppState {
            store,
            verifier,
            client_config: Arc::new(client_config),
            config: Arc::new(config),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}
