use std::collections::HashSet;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::database::{document_path, to_fields, WriteOperation, MAX_BATCH_WRITES};
use crate::dtos::team_dtos::{CreateTeamRequest, UpdateTeamRequest};
use crate::dtos::{document_id_or_new, parse_batch, validate, FieldError};
use crate::errors::{AppError, Result};
use crate::handlers::{load, load_all};
use crate::models::cricket_match;
use crate::models::team::{Team, COLLECTION as TEAMS};
use crate::state::AppState;

pub async fn get_teams(State(state): State<AppState>) -> Result<Json<Vec<Team>>> {
    let mut teams: Vec<Team> = load_all(&state, TEAMS).await?;
    teams.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(teams))
}

pub async fn get_team_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Team>> {
    Ok(Json(load(&state, TEAMS, &id).await?))
}

fn new_team(id: String, request: CreateTeamRequest) -> Team {
    Team {
        id,
        name: request.name.trim().to_string(),
        short_name: request.short_name.trim().to_uppercase(),
        logo_url: request.logo_url.filter(|url| !url.trim().is_empty()),
        created_at: Some(Utc::now()),
    }
}

pub async fn create_team(
    State(state): State<AppState>,
    Json(payload): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<Team>)> {
    validate(&payload)?;
    let id = document_id_or_new(payload.id.as_deref())?;
    let path = document_path(TEAMS, &id);
    if state.store.get(&path).await?.is_some() {
        return Err(AppError::Conflict(format!("team {} already exists", id)));
    }

    let team = new_team(id, payload);
    state.store.set(&path, to_fields(&team)?).await?;
    tracing::info!(team_id = %team.id, name = %team.name, "team created");
    Ok((StatusCode::CREATED, Json(team)))
}

pub async fn update_team(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTeamRequest>,
) -> Result<Json<Team>> {
    validate(&payload)?;
    let mut team: Team = load(&state, TEAMS, &id).await?;

    if let Some(name) = payload.name {
        team.name = name.trim().to_string();
    }
    if let Some(short_name) = payload.short_name {
        team.short_name = short_name.trim().to_uppercase();
    }
    if let Some(logo_url) = payload.logo_url {
        team.logo_url = Some(logo_url).filter(|url| !url.trim().is_empty());
    }

    state
        .store
        .set(&document_path(TEAMS, &team.id), to_fields(&team)?)
        .await?;
    tracing::info!(team_id = %team.id, "team updated");
    Ok(Json(team))
}

/// Teams still referenced by a match cannot be deleted.
pub async fn delete_team(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let team: Team = load(&state, TEAMS, &id).await?;

    for field in ["team1Id", "team2Id"] {
        let fixtures = state
            .store
            .query_eq(cricket_match::COLLECTION, field, &json!(team.id))
            .await?;
        if let Some(fixture) = fixtures.first() {
            return Err(AppError::Conflict(format!(
                "team {} is used by match {}",
                team.id, fixture.id
            )));
        }
    }

    state
        .store
        .delete(&document_path(TEAMS, &team.id))
        .await?;
    tracing::info!(team_id = %team.id, "team deleted");
    Ok(Json(json!({ "success": true, "deleted": team.id })))
}

pub async fn upload_teams(
    State(state): State<AppState>,
    Json(items): Json<Vec<Value>>,
) -> Result<(StatusCode, Json<Value>)> {
    let requests = parse_batch::<CreateTeamRequest>(items).map_err(AppError::InvalidFields)?;
    let existing: HashSet<String> = state
        .store
        .list(TEAMS)
        .await?
        .into_iter()
        .map(|doc| doc.id)
        .collect();

    let mut teams = Vec::with_capacity(requests.len());
    let mut problems = Vec::new();
    let mut seen = HashSet::new();
    for (index, request) in requests.into_iter().enumerate() {
        match document_id_or_new(request.id.as_deref()) {
            Ok(id) if existing.contains(&id) || !seen.insert(id.clone()) => {
                problems.push(FieldError::new(Some(index), "id", format!("duplicate team id {}", id)));
            }
            Ok(id) => teams.push(new_team(id, request)),
            Err(_) => {
                problems.push(FieldError::new(Some(index), "id", "must use only letters, digits and '-'"));
            }
        }
    }
    if !problems.is_empty() {
        return Err(AppError::InvalidFields(problems));
    }

    for chunk in teams.chunks(MAX_BATCH_WRITES) {
        let writes = chunk
            .iter()
            .map(|team| -> Result<WriteOperation> {
                Ok(WriteOperation::Set {
                    path: document_path(TEAMS, &team.id),
                    fields: to_fields(team)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        state.store.commit(writes).await?;
    }

    tracing::info!(created = teams.len(), "teams uploaded");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "created": teams.len(),
            "ids": teams.iter().map(|team| team.id.as_str()).collect::<Vec<_>>(),
        })),
    ))
}
