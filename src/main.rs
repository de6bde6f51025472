use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use cricket_predictor::build_router;
use cricket_predictor::config::{AppConfig, StoreBackend};
use cricket_predictor::database::connection::get_store;
use cricket_predictor::services::client_config::ClientConfigResolver;
use cricket_predictor::services::google_auth::{
    NoopTokenProvider, ServiceAccountTokenProvider, SharedTokenProvider,
};
use cricket_predictor::services::identity::{
    FirebaseTokenVerifier, IdentityVerifier, SharedSecretVerifier,
};
use cricket_predictor::services::secret_vault::{SecretManagerVault, SecretVault};
use cricket_predictor::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!(config = %config.get_config_info(), "configuration loaded");

    let app_state = initialize_app_state(config).await?;
    let addr = SocketAddr::new(
        app_state.config.host.parse().context("HOST is not an IP address")?,
        app_state.config.port,
    );
    let app = build_router(app_state);
    start_server(app, addr).await
}

async fn token_provider(config: &AppConfig) -> anyhow::Result<SharedTokenProvider> {
    if config.store_backend == StoreBackend::Memory || config.firestore_emulator_host.is_some() {
        return Ok(Arc::new(NoopTokenProvider));
    }
    match &config.credentials_path {
        Some(path) => {
            let provider = ServiceAccountTokenProvider::from_key_file(path)
                .await
                .with_context(|| format!("could not load service account from {}", path))?;
            Ok(Arc::new(provider))
        }
        None => {
            tracing::warn!("GOOGLE_APPLICATION_CREDENTIALS not set; Google API calls are unauthenticated");
            Ok(Arc::new(NoopTokenProvider))
        }
    }
}

async fn initialize_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let tokens = token_provider(&config).await?;
    let store = get_store(&config, tokens.clone()).await?;

    let vault: Option<Arc<dyn SecretVault>> =
        match (&config.firebase_project_id, &config.credentials_path) {
            (Some(project_id), Some(_)) => {
                Some(Arc::new(SecretManagerVault::new(project_id.clone(), tokens.clone())))
            }
            _ => {
                tracing::info!("secret vault disabled; needs FIREBASE_PROJECT_ID and credentials");
                None
            }
        };
    let resolver = ClientConfigResolver::new(
        vault,
        config.firebase_config_secret.clone(),
        config.allow_fallback_config,
    );

    let verifier: Arc<dyn IdentityVerifier> = match (&config.jwt_secret, &config.firebase_project_id) {
        (Some(secret), _) => {
            if config.is_production() {
                tracing::warn!("JWT_SECRET is set in production; ID tokens are checked against it");
            }
            Arc::new(SharedSecretVerifier::new(secret.clone()))
        }
        (None, Some(project_id)) => Arc::new(FirebaseTokenVerifier::new(project_id.clone())),
        (None, None) => anyhow::bail!("set FIREBASE_PROJECT_ID or JWT_SECRET to verify sign-ins"),
    };

    Ok(AppState::new(store, verifier, resolver, config))
}

async fn start_server(app: axum::Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("server starting on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
