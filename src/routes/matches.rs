use axum::{routing::get, Router};

use crate::handlers::matches;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(matches::get_matches))
        .route("/:id", get(matches::get_match_by_id))
}
