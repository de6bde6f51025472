use axum::{
    extract::State,
    http::HeaderValue,
    response::{IntoResponse, Json, Response},
};

use crate::errors::Result;
use crate::services::client_config::ConfigSource;
use crate::state::AppState;

/// Firebase web config for the browser app. The chain is re-run on every
/// request so rotated secrets are picked up without a restart.
pub async fn get_firebase_config(State(state): State<AppState>) -> Result<Response> {
    let resolved = state.client_config.resolve().await?;

    let mut response = Json(resolved.config).into_response();
    let source = match resolved.source {
        ConfigSource::Environment => "environment",
        ConfigSource::Vault => "vault",
        ConfigSource::Fallback => "fallback",
    };
    response
        .headers_mut()
        .insert("x-config-source", HeaderValue::from_static(source));
    Ok(response)
}
