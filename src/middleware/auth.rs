use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::database::document_path;
use crate::errors::{AppError, Result};
use crate::models::user::{self, UserProfile};
use crate::services::identity::{AuthError, AuthUser};
use crate::state::AppState;

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Verifies the bearer ID token and stores the caller as an [`AuthUser`]
/// extension.
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = bearer_token(&headers).ok_or(AuthError::MissingToken)?;
    let user = state.verifier.verify(token).await.map_err(|e| {
        tracing::debug!(error = %e, "rejected bearer token");
        e
    })?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Runs after [`auth_middleware`]. The admin role lives in the caller's
/// profile document, never in the token.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or(AuthError::MissingToken)?;

    let profile: UserProfile = state
        .store
        .get(&document_path(user::COLLECTION, &user.uid))
        .await?
        .ok_or_else(|| AppError::forbidden("no profile for this account"))?
        .decode()?;

    if !profile.is_admin() {
        tracing::warn!(uid = %user.uid, "non-admin tried an admin route");
        return Err(AppError::forbidden("admin role required"));
    }

    request.extensions_mut().insert(profile);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_bearer_tokens() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }
}
