//! Resolves the Firebase web client configuration.
//!
//! Sources are tried in order and the first complete one wins: process
//! environment, then a single vault secret (raw or base64-encoded JSON), then
//! the development constant when the fallback is allowed. Nothing is retried.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::client_config::FirebaseClientConfig;

use super::secret_vault::{SecretVault, VaultError};

const ENV_FIELDS: [(&str, &str); 6] = [
    ("apiKey", "FIREBASE_API_KEY"),
    ("authDomain", "FIREBASE_AUTH_DOMAIN"),
    ("projectId", "FIREBASE_PROJECT_ID"),
    ("storageBucket", "FIREBASE_STORAGE_BUCKET"),
    ("messagingSenderId", "FIREBASE_MESSAGING_SENDER_ID"),
    ("appId", "FIREBASE_APP_ID"),
];
const ENV_MEASUREMENT_ID: &str = "FIREBASE_MEASUREMENT_ID";

pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

#[derive(Error, Debug)]
pub enum ClientConfigError {
    #[error("missing required fields in {origin}: {}", .fields.join(", "))]
    MissingFields {
        origin: &'static str,
        fields: Vec<String>,
    },

    #[error("secret is not a valid client configuration: {0}")]
    MalformedSecret(String),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error("no client configuration available ({})", .attempts.join("; "))]
    Exhausted { attempts: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Environment,
    Vault,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedClientConfig {
    pub config: FirebaseClientConfig,
    pub source: ConfigSource,
}

pub struct ClientConfigResolver {
    vault: Option<Arc<dyn SecretVault>>,
    secret_name: String,
    allow_fallback: bool,
    env: EnvLookup,
}

impl ClientConfigResolver {
    pub fn new(
        vault: Option<Arc<dyn SecretVault>>,
        secret_name: impl Into<String>,
        allow_fallback: bool,
    ) -> Self {
        Self {
            vault,
            secret_name: secret_name.into(),
            allow_fallback,
            env: Arc::new(|name| std::env::var(name).ok()),
        }
    }

    /// Replaces the process environment as the first source.
    pub fn with_env(mut self, env: EnvLookup) -> Self {
        self.env = env;
        self
    }

    pub async fn resolve(&self) -> Result<ResolvedClientConfig, ClientConfigError> {
        let mut attempts = Vec::new();

        match self.read_environment() {
            Ok(config) => {
                tracing::info!(source = "environment", "resolved firebase client config");
                return Ok(ResolvedClientConfig {
                    config,
                    source: ConfigSource::Environment,
                });
            }
            Err(e) => {
                tracing::debug!(error = %e, "environment config incomplete");
                attempts.push(format!("environment: {}", e));
            }
        }

        match &self.vault {
            Some(vault) => match self.read_vault(vault.as_ref()).await {
                Ok(config) => {
                    tracing::info!(
                        source = "vault",
                        secret = %self.secret_name,
                        "resolved firebase client config"
                    );
                    return Ok(ResolvedClientConfig {
                        config,
                        source: ConfigSource::Vault,
                    });
                }
                Err(e) => {
                    tracing::warn!(secret = %self.secret_name, error = %e, "vault config unavailable");
                    attempts.push(format!("vault: {}", e));
                }
            },
            None => attempts.push("vault: not configured".to_string()),
        }

        if self.allow_fallback {
            tracing::warn!(
                source = "fallback",
                "serving development firebase client config"
            );
            return Ok(ResolvedClientConfig {
                config: FirebaseClientConfig::development(),
                source: ConfigSource::Fallback,
            });
        }

        tracing::error!(?attempts, "no firebase client config source succeeded");
        Err(ClientConfigError::Exhausted { attempts })
    }

    fn read_environment(&self) -> Result<FirebaseClientConfig, ClientConfigError> {
        let read = |name: &str| (self.env)(name).filter(|v| !v.trim().is_empty());

        let mut object = serde_json::Map::new();
        let mut missing = Vec::new();
        for (field, var) in ENV_FIELDS {
            match read(var) {
                Some(value) => {
                    object.insert(field.to_string(), Value::String(value));
                }
                None => missing.push(var.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(ClientConfigError::MissingFields {
                origin: "environment",
                fields: missing,
            });
        }
        if let Some(measurement_id) = read(ENV_MEASUREMENT_ID) {
            object.insert("measurementId".to_string(), Value::String(measurement_id));
        }

        serde_json::from_value(Value::Object(object))
            .map_err(|e| ClientConfigError::MalformedSecret(e.to_string()))
    }

    async fn read_vault(
        &self,
        vault: &dyn SecretVault,
    ) -> Result<FirebaseClientConfig, ClientConfigError> {
        let raw = vault.access_secret(&self.secret_name).await?;
        parse_secret(&raw)
    }
}

/// Parses a secret holding the client config as JSON, or as base64 of that
/// JSON.
pub fn parse_secret(raw: &str) -> Result<FirebaseClientConfig, ClientConfigError> {
    let trimmed = raw.trim();
    let json_text = if !trimmed.starts_with('{') && looks_like_base64(trimmed) {
        let compact: String = trimmed.split_whitespace().collect();
        let bytes = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| ClientConfigError::MalformedSecret(format!("base64: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| ClientConfigError::MalformedSecret(format!("utf-8: {}", e)))?
    } else {
        trimmed.to_string()
    };

    let value: Value = serde_json::from_str(&json_text)
        .map_err(|e| ClientConfigError::MalformedSecret(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| ClientConfigError::MalformedSecret("expected a JSON object".into()))?;

    let missing: Vec<String> = FirebaseClientConfig::REQUIRED_FIELDS
        .iter()
        .filter(|field| {
            !object
                .get(**field)
                .and_then(Value::as_str)
                .map(|v| !v.trim().is_empty())
                .unwrap_or(false)
        })
        .map(|field| field.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ClientConfigError::MissingFields {
            origin: "vault secret",
            fields: missing,
        });
    }

    serde_json::from_value(value).map_err(|e| ClientConfigError::MalformedSecret(e.to_string()))
}

fn looks_like_base64(text: &str) -> bool {
    let compact: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    !compact.is_empty()
        && compact.len() % 4 == 0
        && compact
            .iter()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
}
