// src/errors.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::database::StoreError;
use crate::dtos::FieldError;
use crate::services::client_config::ClientConfigError;
use crate::services::identity::AuthError;
use crate::services::leaderboard::{RebuildError, ResetError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Store(#[from] StoreError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Predictions are closed for match {0}")]
    PredictionsClosed(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid fields: {}", .0.iter().map(|e| e.field.as_str()).collect::<Vec<_>>().join(", "))]
    InvalidFields(Vec<FieldError>),

    #[error("Client configuration unavailable: {0}")]
    ClientConfig(#[from] ClientConfigError),

    #[error("Leaderboard reset failed: {0}")]
    Reset(#[from] ResetError),

    #[error("Leaderboard rebuild failed: {0}")]
    Rebuild(#[from] RebuildError),
}

impl AppError {
    fn status_and_label(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Store(StoreError::NotFound(_)) => (StatusCode::NOT_FOUND, "Document not found"),
            AppError::Store(StoreError::InvalidPath(_)) => (StatusCode::BAD_REQUEST, "Invalid ID format"),
            AppError::Store(_) => (StatusCode::BAD_GATEWAY, "Database error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "Not found"),
            AppError::Auth(AuthError::KeysUnavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "Authentication unavailable")
            }
            AppError::Auth(_) => (StatusCode::UNAUTHORIZED, "Authentication failed"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "Forbidden"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "Conflict"),
            AppError::PredictionsClosed(_) => (StatusCode::FORBIDDEN, "Predictions closed"),
            AppError::ValidationError(_) | AppError::InvalidFields(_) => {
                (StatusCode::BAD_REQUEST, "Validation failed")
            }
            AppError::ClientConfig(_) => (StatusCode::SERVICE_UNAVAILABLE, "Configuration unavailable"),
            AppError::Reset(_) | AppError::Rebuild(_) => (StatusCode::BAD_GATEWAY, "Leaderboard update failed"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = self.status_and_label();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        }

        let mut body = json!({
            "error": error_message,
            "message": self.to_string(),
            "success": false,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        match &self {
            AppError::InvalidFields(fields) => {
                body["fields"] = json!(fields);
            }
            AppError::Reset(e) => {
                body["deleted"] = json!(e.deleted_before_failure());
            }
            AppError::Rebuild(RebuildError::Reset(e)) => {
                body["deleted"] = json!(e.deleted_before_failure());
            }
            AppError::Rebuild(RebuildError::Write {
                written_before_failure,
                ..
            }) => {
                body["written"] = json!(written_before_failure);
            }
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ValidationError(format!("JSON parsing error: {}", err))
    }
}

// Helper conversion functions
impl AppError {
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(error: AppError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn failure_body_shape() {
        let (status, body) = body_of(AppError::PredictionsClosed("m1".into())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Predictions closed");
        assert!(body["message"].as_str().unwrap().contains("m1"));
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn field_errors_are_listed() {
        let (status, body) = body_of(AppError::InvalidFields(vec![FieldError::new(
            Some(3),
            "venue",
            "venue must be 1-200 characters",
        )]))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["fields"][0]["index"], 3);
        assert_eq!(body["fields"][0]["field"], "venue");
    }

    #[tokio::test]
    async fn partial_reset_reports_deleted_count() {
        let error = ResetError::Commit {
            deleted_before_failure: 500,
            source: StoreError::Status {
                status: 503,
                body: "unavailable".into(),
            },
        };
        let (status, body) = body_of(error.into()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["deleted"], 500);
    }

    #[tokio::test]
    async fn store_not_found_maps_to_404() {
        let (status, _) = body_of(StoreError::NotFound("matches/m1".into()).into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
