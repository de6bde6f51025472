use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::predictions;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(predictions::submit_prediction))
        .route("/me", get(predictions::get_my_predictions))
}
