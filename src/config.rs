// config.rs
use std::env;

use thiserror::Error;

pub const DEFAULT_CONFIG_SECRET: &str = "firebase-client-config";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{name} has an invalid value: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("{0} must be set")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_env: String,
    pub host: String,
    pub port: u16,
    pub firebase_project_id: Option<String>,
    pub firestore_emulator_host: Option<String>,
    pub credentials_path: Option<String>,
    pub firebase_config_secret: String,
    pub allow_fallback_config: bool,
    pub jwt_secret: Option<String>,
    pub store_backend: StoreBackend,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let app_env = var("APP_ENV").unwrap_or_else(|| "development".to_string());
        let is_production = app_env == "production";

        let port = match var("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                name: "PORT",
                value: raw,
            })?,
            None => 10000,
        };

        let allow_fallback_config = match var("ALLOW_FALLBACK_CONFIG") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::InvalidValue {
                name: "ALLOW_FALLBACK_CONFIG",
                value: raw,
            })?,
            None => !is_production,
        };

        let store_backend = match var("STORE_BACKEND").as_deref() {
            None | Some("firestore") => StoreBackend::Firestore,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "STORE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        Ok(AppConfig {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            firebase_project_id: var("FIREBASE_PROJECT_ID"),
            firestore_emulator_host: var("FIRESTORE_EMULATOR_HOST"),
            credentials_path: var("GOOGLE_APPLICATION_CREDENTIALS"),
            firebase_config_secret: var("FIREBASE_CONFIG_SECRET")
                .unwrap_or_else(|| DEFAULT_CONFIG_SECRET.to_string()),
            allow_fallback_config,
            jwt_secret: var("JWT_SECRET"),
            store_backend,
            app_env,
        })
    }

    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    pub fn project_id(&self) -> Result<&str, ConfigError> {
        self.firebase_project_id
            .as_deref()
            .ok_or(ConfigError::Missing("FIREBASE_PROJECT_ID"))
    }

    pub fn get_config_info(&self) -> serde_json::Value {
        serde_json::json!({
            "environment": self.app_env,
            "is_production": self.is_production(),
            "project_id": self.firebase_project_id,
            "store_backend": format!("{:?}", self.store_backend).to_lowercase(),
            "emulator": self.firestore_emulator_host,
            "credentials_set": self.credentials_path.is_some(),
            "config_secret": self.firebase_config_secret,
            "allow_fallback_config": self.allow_fallback_config,
            "shared_secret_auth": self.jwt_secret.is_some(),
            "port": self.port,
            "host": self.host,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.app_env, "development");
        assert_eq!(config.port, 10000);
        assert!(config.allow_fallback_config);
        assert_eq!(config.store_backend, StoreBackend::Firestore);
        assert_eq!(config.firebase_config_secret, DEFAULT_CONFIG_SECRET);
        assert!(config.project_id().is_err());
    }

    #[test]
    fn production_disables_fallback_unless_asked() {
        assert!(!config(&[("APP_ENV", "production")]).unwrap().allow_fallback_config);
        assert!(
            config(&[("APP_ENV", "production"), ("ALLOW_FALLBACK_CONFIG", "true")])
                .unwrap()
                .allow_fallback_config
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            config(&[("PORT", "eighty")]).unwrap_err(),
            ConfigError::InvalidValue {
                name: "PORT",
                value: "eighty".into()
            }
        );
        assert!(config(&[("STORE_BACKEND", "mongo")]).is_err());
        assert!(config(&[("ALLOW_FALLBACK_CONFIG", "maybe")]).is_err());
    }

    #[test]
    fn blank_values_are_unset() {
        let config = config(&[("JWT_SECRET", "  "), ("STORE_BACKEND", "memory")]).unwrap();
        assert!(config.jwt_secret.is_none());
        assert_eq!(config.store_backend, StoreBackend::Memory);
    }
}
