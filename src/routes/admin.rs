use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::{leaderboards, matches, questions, teams, users};
use crate::state::AppState;

/// Everything here sits behind the admin role check.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/matches", post(matches::create_match))
        .route("/matches/upload", post(matches::upload_matches))
        .route("/matches/:id", put(matches::update_match))
        .route("/matches/:id/override", put(matches::set_prediction_override))
        .route("/teams", post(teams::create_team))
        .route("/teams/upload", post(teams::upload_teams))
        .route("/teams/:id", put(teams::update_team).delete(teams::delete_team))
        .route("/users", get(users::list_users))
        .route("/users/:uid/role", put(users::set_user_role))
        .route(
            "/questions",
            get(questions::admin_get_questions).post(questions::create_question),
        )
        .route(
            "/questions/:id",
            put(questions::update_question).delete(questions::delete_question),
        )
        .route("/leaderboards/:id/rebuild", post(leaderboards::rebuild))
        .route("/leaderboards/:id/reset", post(leaderboards::reset))
}
