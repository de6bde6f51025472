// src/services/google_auth.rs

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::{read_service_account_key, ServiceAccountAuthenticator};

/// Covers both Firestore and Secret Manager.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("failed to read service account key: {0}")]
    ServiceAccount(String),

    #[error("failed to build authenticator: {0}")]
    Authenticator(String),

    #[error("failed to get token: {0}")]
    Token(String),

    #[error("access token was empty")]
    Empty,
}

/// Supplies OAuth bearer tokens for Google APIs. `None` means requests go out
/// unauthenticated (emulators).
#[async_trait]
pub trait TokenProvider: Send + Sync + 'static {
    async fn access_token(&self) -> Result<Option<String>, TokenError>;
}

#[derive(Default, Clone)]
pub struct NoopTokenProvider;

#[async_trait]
impl TokenProvider for NoopTokenProvider {
    async fn access_token(&self) -> Result<Option<String>, TokenError> {
        Ok(None)
    }
}

pub struct ServiceAccountTokenProvider {
    authenticator: DefaultAuthenticator,
    scopes: Vec<String>,
}

impl ServiceAccountTokenProvider {
    pub async fn from_key_file(path: impl AsRef<Path>) -> Result<Self, TokenError> {
        let key = read_service_account_key(path.as_ref())
            .await
            .map_err(|e| TokenError::ServiceAccount(e.to_string()))?;

        let authenticator = ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .map_err(|e| TokenError::Authenticator(e.to_string()))?;

        tracing::info!(path = %path.as_ref().display(), "service account credentials loaded");

        Ok(Self {
            authenticator,
            scopes: vec![CLOUD_PLATFORM_SCOPE.to_string()],
        })
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountTokenProvider {
    async fn access_token(&self) -> Result<Option<String>, TokenError> {
        let token = self
            .authenticator
            .token(&self.scopes)
            .await
            .map_err(|e| TokenError::Token(e.to_string()))?;

        token
            .token()
            .map(|t| Some(t.to_string()))
            .ok_or(TokenError::Empty)
    }
}

pub type SharedTokenProvider = Arc<dyn TokenProvider>;
