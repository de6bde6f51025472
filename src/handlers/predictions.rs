use axum::{
    extract::{Query, State},
    response::Json,
    Extension,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::{document_path, to_fields};
use crate::dtos::prediction_dtos::SubmitPredictionRequest;
use crate::dtos::{validate, FieldError};
use crate::errors::{AppError, Result};
use crate::handlers::load;
use crate::models::cricket_match::{self, Match};
use crate::models::prediction::{self, PredictionAnswer};
use crate::models::question::{self, Question};
use crate::services::identity::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionQuery {
    pub match_id: Option<String>,
}

/// Records the caller's answer for a match target. The window is evaluated on
/// every submission; resubmitting replaces the earlier answer.
pub async fn submit_prediction(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<SubmitPredictionRequest>,
) -> Result<Json<Value>> {
    validate(&payload)?;
    let game: Match = load(&state, cricket_match::COLLECTION, &payload.match_id).await?;

    let now = Utc::now();
    let window = game.prediction_window(now);
    if !window.is_open() {
        tracing::debug!(match_id = %game.id, uid = %user.uid, ?window, "prediction rejected");
        return Err(AppError::PredictionsClosed(game.id));
    }

    let answer = payload.answer.trim().to_string();
    match payload.question_id.as_deref() {
        Some(question_id) => {
            let question: Question = load(&state, question::COLLECTION, question_id).await?;
            if question.match_id != game.id {
                return Err(AppError::InvalidFields(vec![FieldError::new(
                    None,
                    "questionId",
                    format!("question {} belongs to another match", question.id),
                )]));
            }
            if !question.has_option(&answer) {
                return Err(AppError::InvalidFields(vec![FieldError::new(
                    None,
                    "answer",
                    "answer must be one of the question's options",
                )]));
            }
        }
        None => {
            if !game.involves(&answer) {
                return Err(AppError::InvalidFields(vec![FieldError::new(
                    None,
                    "answer",
                    "winner must be one of the match's teams",
                )]));
            }
        }
    }

    let record = PredictionAnswer {
        id: PredictionAnswer::document_id(&user.uid, &game.id, payload.question_id.as_deref()),
        user_id: user.uid.clone(),
        match_id: game.id.clone(),
        question_id: payload.question_id,
        answer,
        submitted_at: now,
        is_correct: None,
        points_awarded: None,
    };
    state
        .store
        .set(&document_path(prediction::COLLECTION, &record.id), to_fields(&record)?)
        .await?;

    tracing::info!(uid = %user.uid, match_id = %game.id, prediction_id = %record.id, "prediction saved");
    Ok(Json(json!({ "success": true, "prediction": record })))
}

pub async fn get_my_predictions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<PredictionQuery>,
) -> Result<Json<Vec<PredictionAnswer>>> {
    let documents = state
        .store
        .query_eq(prediction::COLLECTION, "userId", &json!(user.uid))
        .await?;

    let mut answers = documents
        .iter()
        .map(|doc| doc.decode::<PredictionAnswer>())
        .collect::<std::result::Result<Vec<_>, _>>()?;
    if let Some(match_id) = &query.match_id {
        answers.retain(|answer| &answer.match_id == match_id);
    }
    answers.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at).then_with(|| a.id.cmp(&b.id)));
    Ok(Json(answers))
}
