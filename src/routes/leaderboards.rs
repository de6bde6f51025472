use axum::{routing::get, Router};

use crate::handlers::leaderboards;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(leaderboards::get_leaderboards))
        .route("/:id/entries", get(leaderboards::get_leaderboard_entries))
}
