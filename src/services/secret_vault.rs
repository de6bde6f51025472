use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use super::google_auth::SharedTokenProvider;

const SECRET_MANAGER_URL: &str = "https://secretmanager.googleapis.com/v1";

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("secret {0} not found")]
    NotFound(String),

    #[error("vault request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("vault returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("secret payload is not valid: {0}")]
    Payload(String),

    #[error("access token unavailable: {0}")]
    Auth(String),
}

/// Read access to a secret vault.
#[async_trait]
pub trait SecretVault: Send + Sync + 'static {
    /// Latest version of the named secret, as text.
    async fn access_secret(&self, name: &str) -> Result<String, VaultError>;
}

#[derive(Debug, Deserialize)]
struct AccessSecretResponse {
    payload: SecretPayload,
}

#[derive(Debug, Deserialize)]
struct SecretPayload {
    data: String,
}

/// Google Secret Manager over REST.
pub struct SecretManagerVault {
    client: Client,
    tokens: SharedTokenProvider,
    project_id: String,
}

impl SecretManagerVault {
    pub fn new(project_id: impl Into<String>, tokens: SharedTokenProvider) -> Self {
        Self {
            client: Client::new(),
            tokens,
            project_id: project_id.into(),
        }
    }

    fn secret_url(&self, name: &str) -> String {
        format!(
            "{}/projects/{}/secrets/{}/versions/latest:access",
            SECRET_MANAGER_URL, self.project_id, name
        )
    }
}

#[async_trait]
impl SecretVault for SecretManagerVault {
    async fn access_secret(&self, name: &str) -> Result<String, VaultError> {
        let mut request = self.client.get(self.secret_url(name));
        if let Some(token) = self
            .tokens
            .access_token()
            .await
            .map_err(|e| VaultError::Auth(e.to_string()))?
        {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(VaultError::NotFound(name.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VaultError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: AccessSecretResponse = response.json().await?;
        let bytes = STANDARD
            .decode(body.payload.data.as_bytes())
            .map_err(|e| VaultError::Payload(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| VaultError::Payload(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::google_auth::NoopTokenProvider;
    use std::sync::Arc;

    #[test]
    fn secret_url_targets_latest_version() {
        let vault = SecretManagerVault::new("cricket-prod", Arc::new(NoopTokenProvider));
        assert_eq!(
            vault.secret_url("firebase-client-config"),
            "https://secretmanager.googleapis.com/v1/projects/cricket-prod/secrets/firebase-client-config/versions/latest:access"
        );
    }
}
