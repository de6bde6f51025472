use axum::{extract::State, response::Json, Extension};
use chrono::Utc;
use serde_json::{Map, Value};

use crate::database::{document_path, to_fields};
use crate::dtos::auth_dtos::SessionResponse;
use crate::errors::Result;
use crate::handlers::load;
use crate::models::user::{self, Role, UserProfile};
use crate::services::identity::AuthUser;
use crate::state::AppState;

/// Called by the client after every sign-in. Creates the profile on first
/// sign-in; afterwards only the identity fields and `lastLoginAt` change, so a
/// role granted by an admin is never overwritten.
pub async fn create_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SessionResponse>> {
    let path = document_path(user::COLLECTION, &user.uid);
    let now = Utc::now();

    let created = match state.store.get(&path).await? {
        Some(_) => {
            let mut fields = Map::new();
            if let Some(email) = &user.email {
                fields.insert("email".into(), Value::String(email.clone()));
            }
            if let Some(name) = &user.display_name {
                fields.insert("displayName".into(), Value::String(name.clone()));
            }
            if let Some(photo) = &user.photo_url {
                fields.insert("photoUrl".into(), Value::String(photo.clone()));
            }
            fields.insert("lastLoginAt".into(), Value::String(now.to_rfc3339()));
            state.store.merge(&path, fields).await?;
            false
        }
        None => {
            let profile = UserProfile {
                id: user.uid.clone(),
                email: user.email.clone(),
                display_name: user.display_name.clone(),
                photo_url: user.photo_url.clone(),
                role: Role::User,
                created_at: now,
                last_login_at: now,
            };
            state.store.set(&path, to_fields(&profile)?).await?;
            true
        }
    };

    let profile: UserProfile = load(&state, user::COLLECTION, &user.uid).await?;
    tracing::info!(uid = %profile.id, created, role = ?profile.role, "session started");

    Ok(Json(SessionResponse {
        success: true,
        user: profile,
        created,
    }))
}

pub async fn get_me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserProfile>> {
    let profile = load(&state, user::COLLECTION, &user.uid).await?;
    Ok(Json(profile))
}
