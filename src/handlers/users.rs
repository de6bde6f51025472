use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use serde_json::{json, Map};

use crate::database::document_path;
use crate::dtos::admin_dtos::SetRoleRequest;
use crate::errors::{AppError, Result};
use crate::handlers::{load, load_all};
use crate::models::user::{self, Role, UserProfile};
use crate::state::AppState;

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserProfile>>> {
    let mut users: Vec<UserProfile> = load_all(&state, user::COLLECTION).await?;
    users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    Ok(Json(users))
}

pub async fn set_user_role(
    State(state): State<AppState>,
    Extension(admin): Extension<UserProfile>,
    Path(uid): Path<String>,
    Json(payload): Json<SetRoleRequest>,
) -> Result<Json<UserProfile>> {
    if uid == admin.id && payload.role != Role::Admin {
        return Err(AppError::Conflict("admins cannot remove their own admin role".into()));
    }

    let mut fields = Map::new();
    fields.insert("role".into(), json!(payload.role));
    let target: UserProfile = load(&state, user::COLLECTION, &uid).await?;
    state
        .store
        .merge(&document_path(user::COLLECTION, &target.id), fields)
        .await?;

    tracing::info!(admin = %admin.id, uid = %uid, role = ?payload.role, "user role changed");
    let updated = load(&state, user::COLLECTION, &uid).await?;
    Ok(Json(updated))
}
