use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn root_handler() -> &'static str {
    "Cricket Predictor API"
}

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "env": state.config.app_env,
        "port": state.config.port,
        "time": chrono::Utc::now().to_rfc3339(),
    }))
}
