use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    system_info: SystemInfo,
}

#[derive(Serialize)]
struct SystemInfo {
    environment: String,
    version: &'static str,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "available",
        system_info: SystemInfo {
            environment: state.config.environment.clone(),
            version: env!("CARGO_PKG_VERSION"),
        },
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/healthcheck", get(health_check))
}
