use axum::{routing::get, Router};

use crate::handlers::teams;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(teams::get_teams))
        .route("/:id", get(teams::get_team_by_id))
}
