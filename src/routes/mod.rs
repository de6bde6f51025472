use axum::{http::Method, middleware::from_fn_with_state, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{config, health};
use crate::middleware::auth::{auth_middleware, require_admin};
use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod leaderboards;
pub mod matches;
pub mod predictions;
pub mod questions;
pub mod teams;

pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .allow_credentials(false);

    // Layers added last run first: authenticate, then check the role.
    let admin = admin::routes()
        .route_layer(from_fn_with_state(app_state.clone(), require_admin))
        .route_layer(from_fn_with_state(app_state.clone(), auth_middleware));

    let signed_in = Router::new()
        .nest("/api/auth", auth::routes())
        .nest("/api/predictions", predictions::routes())
        .route_layer(from_fn_with_state(app_state.clone(), auth_middleware));

    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_check))
        .route("/api/health", get(health::health_check))
        .route("/api/config/firebase", get(config::get_firebase_config))
        .route(
            "/api/stream/:collection",
            get(crate::handlers::stream::stream_collection),
        )
        .nest("/api/matches", matches::routes())
        .nest("/api/teams", teams::routes())
        .nest("/api/questions", questions::routes())
        .nest("/api/leaderboards", leaderboards::routes())
        .nest("/api/admin", admin)
        .merge(signed_in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}
