use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::database::{document_path, to_fields};
use crate::dtos::question_dtos::{check_options, CreateQuestionRequest, QuestionQuery, UpdateQuestionRequest};
use crate::dtos::{document_id_or_new, validate, FieldError};
use crate::errors::{AppError, Result};
use crate::handlers::load;
use crate::models::cricket_match::{self, Match};
use crate::models::prediction::WINNER_TARGET;
use crate::models::question::{self, Question};
use crate::state::AppState;

async fn questions_for(state: &AppState, match_id: Option<&str>) -> Result<Vec<Question>> {
    let documents = match match_id {
        Some(match_id) => {
            state
                .store
                .query_eq(question::COLLECTION, "matchId", &json!(match_id))
                .await?
        }
        None => state.store.list(question::COLLECTION).await?,
    };
    let mut questions = documents
        .iter()
        .map(|doc| doc.decode::<Question>())
        .collect::<std::result::Result<Vec<_>, _>>()?;
    questions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    Ok(questions)
}

/// Player view: the correct option is never included.
pub async fn get_questions(
    State(state): State<AppState>,
    Query(query): Query<QuestionQuery>,
) -> Result<Json<Vec<Question>>> {
    let questions = questions_for(&state, query.match_id.as_deref()).await?;
    Ok(Json(questions.into_iter().map(Question::public).collect()))
}

pub async fn get_question_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Question>> {
    let question: Question = load(&state, question::COLLECTION, &id).await?;
    Ok(Json(question.public()))
}

pub async fn admin_get_questions(
    State(state): State<AppState>,
    Query(query): Query<QuestionQuery>,
) -> Result<Json<Vec<Question>>> {
    Ok(Json(questions_for(&state, query.match_id.as_deref()).await?))
}

fn invalid_options(error: validator::ValidationError) -> AppError {
    let message = error
        .message
        .map(|m| m.to_string())
        .unwrap_or_else(|| error.code.to_string());
    AppError::InvalidFields(vec![FieldError::new(None, error.code.to_string(), message)])
}

pub async fn create_question(
    State(state): State<AppState>,
    Json(mut payload): Json<CreateQuestionRequest>,
) -> Result<(StatusCode, Json<Question>)> {
    payload.normalize();
    validate(&payload)?;
    let game: Match = load(&state, cricket_match::COLLECTION, &payload.match_id).await?;

    let id = document_id_or_new(payload.id.as_deref())?;
    if id == WINNER_TARGET {
        return Err(AppError::InvalidFields(vec![FieldError::new(
            None,
            "id",
            format!("{} is reserved for match-winner predictions", WINNER_TARGET),
        )]));
    }
    let path = document_path(question::COLLECTION, &id);
    if state.store.get(&path).await?.is_some() {
        return Err(AppError::Conflict(format!("question {} already exists", id)));
    }

    let question = Question {
        id,
        match_id: game.id,
        text: payload.text.trim().to_string(),
        options: payload.options,
        points: payload.points.unwrap_or(1),
        correct_option: payload.correct_option,
        created_at: Some(Utc::now()),
    };
    state.store.set(&path, to_fields(&question)?).await?;
    tracing::info!(question_id = %question.id, match_id = %question.match_id, "question created");
    Ok((StatusCode::CREATED, Json(question)))
}

pub async fn update_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut payload): Json<UpdateQuestionRequest>,
) -> Result<Json<Question>> {
    payload.normalize();
    validate(&payload)?;
    let mut question: Question = load(&state, question::COLLECTION, &id).await?;

    if let Some(text) = payload.text {
        question.text = text.trim().to_string();
    }
    if let Some(options) = payload.options {
        question.options = options;
    }
    if let Some(points) = payload.points {
        question.points = points;
    }
    if let Some(correct_option) = payload.correct_option {
        question.correct_option = Some(correct_option);
    }
    check_options(&question.options, question.correct_option.as_deref()).map_err(invalid_options)?;

    state
        .store
        .set(&document_path(question::COLLECTION, &question.id), to_fields(&question)?)
        .await?;
    tracing::info!(question_id = %question.id, "question updated");
    Ok(Json(question))
}

/// Answers already given to the question stay in `predictionAnswers`.
pub async fn delete_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let question: Question = load(&state, question::COLLECTION, &id).await?;
    state
        .store
        .delete(&document_path(question::COLLECTION, &question.id))
        .await?;
    tracing::info!(question_id = %question.id, "question deleted");
    Ok(Json(json!({ "success": true, "deleted": question.id })))
}
