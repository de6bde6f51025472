use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use serde_json::{json, Value};

use crate::dtos::admin_dtos::ResetLeaderboardRequest;
use crate::dtos::check_document_id;
use crate::errors::{AppError, Result};
use crate::models::leaderboard::{Leaderboard, LeaderboardEntry};
use crate::models::user::UserProfile;
use crate::services::leaderboard::{list_entries, list_leaderboards, rebuild_leaderboard, reset_and_mark};
use crate::state::AppState;

pub async fn get_leaderboards(State(state): State<AppState>) -> Result<Json<Vec<Leaderboard>>> {
    Ok(Json(list_leaderboards(state.store.as_ref()).await?))
}

pub async fn get_leaderboard_entries(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<LeaderboardEntry>>> {
    check_document_id(&id, "id")?;
    Ok(Json(list_entries(state.store.as_ref(), &id).await?))
}

pub async fn rebuild(
    State(state): State<AppState>,
    Extension(admin): Extension<UserProfile>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    check_document_id(&id, "id")?;
    tracing::info!(admin = %admin.id, leaderboard_id = %id, "leaderboard rebuild requested");

    let summary = rebuild_leaderboard(state.store.as_ref(), &id).await?;
    Ok(Json(json!({
        "success": true,
        "leaderboardId": id,
        "removed": summary.removed,
        "written": summary.written,
    })))
}

/// Deletes every entry of the leaderboard and marks it empty. The body must repeat the
/// leaderboard id as `confirm`.
pub async fn reset(
    State(state): State<AppState>,
    Extension(admin): Extension<UserProfile>,
    Path(id): Path<String>,
    Json(payload): Json<ResetLeaderboardRequest>,
) -> Result<Json<Value>> {
    check_document_id(&id, "id")?;
    if payload.confirm.as_deref() != Some(id.as_str()) {
        return Err(AppError::invalid_data(format!(
            "confirm must equal the leaderboard id ({})",
            id
        )));
    }

    tracing::warn!(admin = %admin.id, leaderboard_id = %id, "leaderboard reset requested");
    let deleted = reset_and_mark(state.store.as_ref(), &id).await?;

    Ok(Json(json!({
        "success": true,
        "leaderboardId": id,
        "deleted": deleted,
    })))
}
