use std::collections::HashSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde_json::{json, Map, Value};

use crate::database::{document_path, to_fields, WriteOperation, MAX_BATCH_WRITES};
use crate::dtos::match_dtos::{CreateMatchRequest, MatchQuery, OverrideRequest, UpdateMatchRequest};
use crate::dtos::{document_id_or_new, parse_batch, validate, FieldError};
use crate::errors::{AppError, Result};
use crate::handlers::{load, load_all};
use crate::models::cricket_match::{self, Match, MatchView};
use crate::models::team;
use crate::state::AppState;

pub async fn get_matches(
    State(state): State<AppState>,
    Query(query): Query<MatchQuery>,
) -> Result<Json<Vec<MatchView>>> {
    let documents = match query.status {
        Some(status) => {
            state
                .store
                .query_eq(cricket_match::COLLECTION, "status", &json!(status.as_str()))
                .await?
        }
        None => state.store.list(cricket_match::COLLECTION).await?,
    };

    let mut games = documents
        .iter()
        .map(|doc| doc.decode::<Match>())
        .collect::<std::result::Result<Vec<_>, _>>()?;
    games.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));

    let now = Utc::now();
    tracing::debug!(count = games.len(), status = ?query.status, "listed matches");
    Ok(Json(games.into_iter().map(|game| MatchView::at(game, now)).collect()))
}

pub async fn get_match_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MatchView>> {
    let game: Match = load(&state, cricket_match::COLLECTION, &id).await?;
    Ok(Json(MatchView::at(game, Utc::now())))
}

async fn known_team_ids(state: &AppState) -> Result<HashSet<String>> {
    let documents = state.store.list(team::COLLECTION).await?;
    Ok(documents.into_iter().map(|doc| doc.id).collect())
}

fn unknown_teams(index: Option<usize>, game: &Match, teams: &HashSet<String>) -> Vec<FieldError> {
    [("team1Id", &game.team1_id), ("team2Id", &game.team2_id)]
        .into_iter()
        .filter(|(_, id)| !teams.contains(id.as_str()))
        .map(|(field, id)| FieldError::new(index, field, format!("unknown team {}", id)))
        .collect()
}

fn new_match(id: String, request: CreateMatchRequest) -> Match {
    let now = Utc::now();
    Match {
        id,
        team1_id: request.team1_id,
        team2_id: request.team2_id,
        venue: request.venue.trim().to_string(),
        start_time: request.start_time,
        status: request.status,
        predictions_enabled_by_admin: request.predictions_enabled_by_admin,
        winner_team_id: None,
        created_at: Some(now),
        updated_at: Some(now),
    }
}

pub async fn create_match(
    State(state): State<AppState>,
    Json(payload): Json<CreateMatchRequest>,
) -> Result<(StatusCode, Json<MatchView>)> {
    validate(&payload)?;
    let id = document_id_or_new(payload.id.as_deref())?;
    let path = document_path(cricket_match::COLLECTION, &id);
    if state.store.get(&path).await?.is_some() {
        return Err(AppError::Conflict(format!("match {} already exists", id)));
    }

    let game = new_match(id, payload);
    let problems = unknown_teams(None, &game, &known_team_ids(&state).await?);
    if !problems.is_empty() {
        return Err(AppError::InvalidFields(problems));
    }

    state.store.set(&path, to_fields(&game)?).await?;
    tracing::info!(match_id = %game.id, start = %game.start_time, "match created");
    Ok((StatusCode::CREATED, Json(MatchView::at(game, Utc::now()))))
}

pub async fn update_match(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateMatchRequest>,
) -> Result<Json<MatchView>> {
    validate(&payload)?;
    let mut game: Match = load(&state, cricket_match::COLLECTION, &id).await?;

    let teams_changed = payload.team1_id.is_some() || payload.team2_id.is_some();
    if let Some(team1_id) = payload.team1_id {
        game.team1_id = team1_id;
    }
    if let Some(team2_id) = payload.team2_id {
        game.team2_id = team2_id;
    }
    if let Some(venue) = payload.venue {
        game.venue = venue.trim().to_string();
    }
    if let Some(start_time) = payload.start_time {
        game.start_time = start_time;
    }
    if let Some(status) = payload.status {
        game.status = status;
    }

    if teams_changed {
        if game.team1_id == game.team2_id {
            return Err(AppError::InvalidFields(vec![FieldError::new(
                None,
                "team2Id",
                "a team cannot play itself",
            )]));
        }
        let problems = unknown_teams(None, &game, &known_team_ids(&state).await?);
        if !problems.is_empty() {
            return Err(AppError::InvalidFields(problems));
        }
    }

    game.updated_at = Some(Utc::now());
    state
        .store
        .set(&document_path(cricket_match::COLLECTION, &game.id), to_fields(&game)?)
        .await?;
    tracing::info!(match_id = %game.id, status = game.status.as_str(), "match updated");
    Ok(Json(MatchView::at(game, Utc::now())))
}

/// Opens predictions ahead of the default window, or withdraws that. The
/// override never reopens a match that has started.
pub async fn set_prediction_override(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<OverrideRequest>,
) -> Result<Json<MatchView>> {
    let game: Match = load(&state, cricket_match::COLLECTION, &id).await?;

    let mut fields = Map::new();
    fields.insert("predictionsEnabledByAdmin".into(), Value::Bool(payload.enabled));
    fields.insert("updatedAt".into(), Value::String(Utc::now().to_rfc3339()));
    state
        .store
        .merge(&document_path(cricket_match::COLLECTION, &game.id), fields)
        .await?;

    tracing::info!(match_id = %id, enabled = payload.enabled, "prediction override changed");
    let game: Match = load(&state, cricket_match::COLLECTION, &id).await?;
    Ok(Json(MatchView::at(game, Utc::now())))
}

/// Bulk upload of a JSON array of matches. Every item is validated first and
/// nothing is written unless all of them pass.
pub async fn upload_matches(
    State(state): State<AppState>,
    Json(items): Json<Vec<Value>>,
) -> Result<(StatusCode, Json<Value>)> {
    let requests = parse_batch::<CreateMatchRequest>(items).map_err(AppError::InvalidFields)?;
    let teams = known_team_ids(&state).await?;
    let existing: HashSet<String> = load_all::<Match>(&state, cricket_match::COLLECTION)
        .await?
        .into_iter()
        .map(|game| game.id)
        .collect();

    let mut games = Vec::with_capacity(requests.len());
    let mut problems = Vec::new();
    let mut seen = HashSet::new();
    for (index, request) in requests.into_iter().enumerate() {
        let id = match document_id_or_new(request.id.as_deref()) {
            Ok(id) => id,
            Err(_) => {
                problems.push(FieldError::new(Some(index), "id", "must use only letters, digits and '-'"));
                continue;
            }
        };
        if existing.contains(&id) || !seen.insert(id.clone()) {
            problems.push(FieldError::new(Some(index), "id", format!("duplicate match id {}", id)));
            continue;
        }
        let game = new_match(id, request);
        problems.extend(unknown_teams(Some(index), &game, &teams));
        games.push(game);
    }
    if !problems.is_empty() {
        return Err(AppError::InvalidFields(problems));
    }

    let mut written = 0;
    for chunk in games.chunks(MAX_BATCH_WRITES) {
        let writes = chunk
            .iter()
            .map(|game| -> Result<WriteOperation> {
                Ok(WriteOperation::Set {
                    path: document_path(cricket_match::COLLECTION, &game.id),
                    fields: to_fields(game)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        state.store.commit(writes).await?;
        written += chunk.len();
    }

    tracing::info!(written, "matches uploaded");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "created": written,
            "ids": games.iter().map(|game| game.id.as_str()).collect::<Vec<_>>(),
        })),
    ))
}
