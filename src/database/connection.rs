use std::sync::Arc;

use crate::config::{AppConfig, ConfigError, StoreBackend};
use crate::services::google_auth::SharedTokenProvider;

use super::{DocumentStore, FirestoreStore, MemoryStore};

/// Builds the document store selected by the config. For Firestore the
/// `matches` collection is read once so a misconfigured project shows up in
/// the startup logs.
pub async fn get_store(
    config: &AppConfig,
    tokens: SharedTokenProvider,
) -> Result<Arc<dyn DocumentStore>, ConfigError> {
    let store: Arc<dyn DocumentStore> = match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("using in-memory document store; data is lost on restart");
            return Ok(Arc::new(MemoryStore::new()));
        }
        StoreBackend::Firestore => {
            let project_id = config.project_id()?;
            match &config.firestore_emulator_host {
                Some(host) => {
                    tracing::info!(%host, project_id, "connecting to Firestore emulator");
                    Arc::new(FirestoreStore::emulator(host, project_id, tokens))
                }
                None => {
                    tracing::info!(project_id, "connecting to Firestore");
                    Arc::new(FirestoreStore::new(project_id, tokens))
                }
            }
        }
    };

    match store.list("matches").await {
        Ok(matches) => {
            tracing::info!(count = matches.len(), "connected to database");
        }
        Err(e) => {
            tracing::error!(error = %e, "database may be unreachable");
        }
    }

    Ok(store)
}
