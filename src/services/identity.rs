//! Verification of identity-provider ID tokens.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const KEY_TTL: Duration = Duration::from_secs(60 * 60);
/// Unknown key ids trigger at most one refetch per interval.
const MIN_REFRESH: Duration = Duration::from_secs(60);

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("signing keys unavailable: {0}")]
    KeysUnavailable(String),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

/// The signed-in caller, as asserted by the identity provider.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl TryFrom<Claims> for AuthUser {
    type Error = AuthError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        if claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidToken("empty subject".into()));
        }
        Ok(AuthUser {
            uid: claims.sub,
            email: claims.email,
            display_name: claims.name,
            photo_url: claims.picture,
        })
    }
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync + 'static {
    async fn verify(&self, token: &str) -> Result<AuthUser, AuthError>;
}

struct CachedKeys {
    set: JwkSet,
    fetched_at: Instant,
}

/// Verifies Firebase Auth ID tokens against Google's published signing keys.
pub struct FirebaseTokenVerifier {
    client: Client,
    project_id: String,
    jwks_url: String,
    keys: RwLock<Option<CachedKeys>>,
}

impl FirebaseTokenVerifier {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            project_id: project_id.into(),
            jwks_url: FIREBASE_JWKS_URL.to_string(),
            keys: RwLock::new(None),
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.set_issuer(&[format!("https://securetoken.google.com/{}", self.project_id)]);
        validation
    }

    async fn fetch_keys(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::KeysUnavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(AuthError::KeysUnavailable(format!(
                "key endpoint returned {}",
                response.status()
            )));
        }
        let set = response
            .json::<JwkSet>()
            .await
            .map_err(|e| AuthError::KeysUnavailable(e.to_string()))?;
        tracing::debug!(keys = set.keys.len(), "refreshed identity signing keys");
        Ok(set)
    }

    async fn key_for(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        {
            let cached = self.keys.read().await;
            if let Some(cached) = cached.as_ref() {
                let age = cached.fetched_at.elapsed();
                if age < KEY_TTL {
                    if let Some(jwk) = cached.set.find(kid) {
                        return DecodingKey::from_jwk(jwk)
                            .map_err(|e| AuthError::InvalidToken(e.to_string()));
                    }
                }
                if age < MIN_REFRESH {
                    return Err(AuthError::InvalidToken(format!("unknown key id {}", kid)));
                }
            }
        }

        // Unknown kid or stale cache: Google rotates keys every few hours.
        let set = self.fetch_keys().await?;
        let key = set
            .find(kid)
            .ok_or_else(|| AuthError::InvalidToken(format!("unknown key id {}", kid)))
            .and_then(|jwk| {
                DecodingKey::from_jwk(jwk).map_err(|e| AuthError::InvalidToken(e.to_string()))
            });
        *self.keys.write().await = Some(CachedKeys {
            set,
            fetched_at: Instant::now(),
        });
        key
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseTokenVerifier {
    async fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(AuthError::InvalidToken(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidToken("missing key id".into()))?;

        let key = self.key_for(&kid).await?;
        let data = decode::<Claims>(token, &key, &self.validation())
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        AuthUser::try_from(data.claims)
    }
}

/// HS256 tokens signed with `JWT_SECRET`. For local development and tests
/// only; production deployments verify real ID tokens.
pub struct SharedSecretVerifier {
    secret: String,
}

impl SharedSecretVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn issue(
        &self,
        uid: &str,
        email: Option<&str>,
        name: Option<&str>,
        ttl: chrono::Duration,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: uid.to_string(),
            exp: (now + ttl).timestamp().max(0) as usize,
            iat: Some(now.timestamp().max(0) as usize),
            email: email.map(str::to_string),
            name: name.map(str::to_string),
            picture: None,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

#[async_trait]
impl IdentityVerifier for SharedSecretVerifier {
    async fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        AuthUser::try_from(data.claims)
    }
}
