use axum::{routing::get, Router};

use crate::handlers::questions;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(questions::get_questions))
        .route("/:id", get(questions::get_question_by_id))
}
